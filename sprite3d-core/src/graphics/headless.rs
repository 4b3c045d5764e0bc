//! A [`GraphicsContext`] that draws nothing and records every call.
//!
//! Used by tests and benchmarks, and handy to inspect what a frame would
//! send to the GPU without opening a window.

use glam::{Affine2, Mat4};

use crate::error::RenderError;
use crate::utils::*;

use super::context::{
    BlendMode, BufferHandle, BufferTarget, BufferUsage, GraphicsContext, IndexFormat,
    ProgramHandle, TextureHandle, VertexAttribute,
};
use super::shader::{ShaderId, ShaderSource};
use super::texture::{TextureId, TextureManager};


#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer {
        buffer: BufferHandle,
        target: BufferTarget,
        len: usize,
        usage: BufferUsage,
    },
    BindBuffer(BufferTarget, BufferHandle),
    UploadBuffer {
        target: BufferTarget,
        offset: u64,
        len: usize,
    },
    DeleteBuffer(BufferHandle),
    VertexAttribute(VertexAttribute),
    DepthTest(bool),
    ActiveTexture(u32),
    SetBlendMode(BlendMode),
    CreateProgram {
        program: ProgramHandle,
        shader: ShaderId,
    },
    UseProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    UploadMatrix4 {
        program: ProgramHandle,
        name: String,
        matrix: Mat4,
    },
    CreateTexture {
        texture: TextureHandle,
        id: TextureId,
    },
    BindTexture(TextureHandle),
    DrawElements {
        count: u32,
        format: IndexFormat,
        byte_offset: u64,
    },
}


#[derive(Debug)]
pub struct HeadlessContext {
    commands: Vec<Command>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    bound_buffers: HashMap<BufferTarget, BufferHandle>,
    blend_mode: Option<BlendMode>,
    depth_test: bool,
    projection: Affine2,
    generation: u32,
    next_handle: u32,
    fail_programs: bool,
}
impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}
impl HeadlessContext {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            buffers: HashMap::default(),
            bound_buffers: HashMap::default(),
            blend_mode: None,
            depth_test: false,
            projection: Affine2::IDENTITY,
            generation: 0,
            next_handle: 1,
            fail_programs: false,
        }
    }

    pub fn with_projection(mut self, projection: Affine2) -> Self {
        self.projection = projection;
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    /// `(index count, byte offset)` of every draw, in order.
    pub fn draw_calls(&self) -> Vec<(u32, u64)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawElements { count, byte_offset, .. } => Some((*count, *byte_offset)),
                _ => None,
            })
            .collect()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        self.bound_buffers.get(&target).copied()
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    pub fn set_projection(&mut self, projection: Affine2) {
        self.projection = projection;
    }

    /// Makes every following `create_program` fail.
    pub fn fail_program_compiles(&mut self, fail: bool) {
        self.fail_programs = fail;
    }

    /// Drops every resource and starts a new generation, as a lost GPU context would.
    pub fn lose_context(&mut self) {
        self.buffers.clear();
        self.bound_buffers.clear();
        self.blend_mode = None;
        self.depth_test = false;
        self.generation += 1;
        debug!("Headless context lost, now at generation {}", self.generation);
    }

    /// Creates and binds a texture for `id`.
    pub fn create_texture(&mut self, id: TextureId) -> TextureHandle {
        let texture = TextureHandle(self.next_handle());
        self.commands.push(Command::CreateTexture { texture, id });
        self.bind_texture(texture);
        texture
    }

    fn next_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl GraphicsContext for HeadlessContext {
    fn generation(&self) -> u32 {
        self.generation
    }

    fn create_buffer(&mut self, target: BufferTarget, contents: &[u8], usage: BufferUsage) -> Result<BufferHandle, RenderError> {
        let buffer = BufferHandle(self.next_handle());
        self.buffers.insert(buffer, contents.to_vec());
        self.bound_buffers.insert(target, buffer);
        self.commands.push(Command::CreateBuffer {
            buffer,
            target,
            len: contents.len(),
            usage,
        });
        Ok(buffer)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferHandle) {
        self.bound_buffers.insert(target, buffer);
        self.commands.push(Command::BindBuffer(target, buffer));
    }

    fn upload_buffer(&mut self, target: BufferTarget, offset: u64, data: &[u8]) {
        self.commands.push(Command::UploadBuffer {
            target,
            offset,
            len: data.len(),
        });

        let Some(contents) = self
            .bound_buffers
            .get(&target)
            .and_then(|buffer| self.buffers.get_mut(buffer))
        else {
            warn!("Upload to {target:?} without a bound buffer");
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            warn!("Upload of {} bytes at {start} overflows a {} byte buffer", data.len(), contents.len());
            return;
        }
        contents[start..end].copy_from_slice(data);
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        self.bound_buffers.retain(|_, bound| *bound != buffer);
        self.commands.push(Command::DeleteBuffer(buffer));
    }

    fn vertex_attribute(&mut self, attribute: VertexAttribute) {
        self.commands.push(Command::VertexAttribute(attribute));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        self.commands.push(Command::DepthTest(enabled));
    }

    fn active_texture(&mut self, unit: u32) {
        self.commands.push(Command::ActiveTexture(unit));
    }

    fn blend_mode(&self) -> Option<BlendMode> {
        self.blend_mode
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = Some(mode);
        self.commands.push(Command::SetBlendMode(mode));
    }

    fn create_program(&mut self, source: &ShaderSource) -> Result<ProgramHandle, RenderError> {
        if self.fail_programs {
            return Err(RenderError::ProgramCreation {
                label: source.label().to_owned(),
                reason: "compilation disabled".to_owned(),
            });
        }
        let program = ProgramHandle(self.next_handle());
        self.commands.push(Command::CreateProgram {
            program,
            shader: source.id(),
        });
        Ok(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.commands.push(Command::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.commands.push(Command::DeleteProgram(program));
    }

    fn upload_matrix4(&mut self, program: ProgramHandle, name: &str, matrix: &Mat4) {
        self.commands.push(Command::UploadMatrix4 {
            program,
            name: name.to_owned(),
            matrix: *matrix,
        });
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.commands.push(Command::BindTexture(texture));
    }

    fn draw_elements(&mut self, count: u32, format: IndexFormat, byte_offset: u64) {
        self.commands.push(Command::DrawElements {
            count,
            format,
            byte_offset,
        });
    }

    fn projection(&self) -> Affine2 {
        self.projection
    }
}


/// Texture manager for [`HeadlessContext`]. Every id is uploadable unless
/// marked with [`fail_on`](HeadlessTextures::fail_on).
#[derive(Debug, Default)]
pub struct HeadlessTextures {
    uploaded: HashMap<TextureId, (u32, TextureHandle)>,
    failing: Vec<TextureId>,
}
impl HeadlessTextures {
    pub fn fail_on(&mut self, texture: TextureId) {
        self.failing.push(texture);
    }

    /// Number of textures uploaded in any generation.
    pub fn uploaded(&self) -> usize {
        self.uploaded.len()
    }
}
impl TextureManager<HeadlessContext> for HeadlessTextures {
    fn gpu_texture(&self, texture: TextureId, generation: u32) -> Option<TextureHandle> {
        self.uploaded
            .get(&texture)
            .filter(|(created_in, _)| *created_in == generation)
            .map(|(_, handle)| *handle)
    }

    fn update_texture(&mut self, context: &mut HeadlessContext, texture: TextureId) -> Result<TextureHandle, RenderError> {
        if self.failing.contains(&texture) {
            return Err(RenderError::TextureUpload(texture.0, "marked as failing".to_owned()));
        }
        let handle = context.create_texture(texture);
        self.uploaded.insert(texture, (context.generation(), handle));
        Ok(handle)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_land_in_the_bound_buffer() {
        let mut ctx = HeadlessContext::new();
        let buffer = ctx.create_buffer(BufferTarget::Vertex, &[0; 8], BufferUsage::Dynamic).unwrap();
        ctx.upload_buffer(BufferTarget::Vertex, 2, &[1, 2, 3]);
        assert_eq!(ctx.buffer_contents(buffer), Some(&[0, 0, 1, 2, 3, 0, 0, 0][..]));

        // overflowing writes are dropped
        ctx.upload_buffer(BufferTarget::Vertex, 6, &[9, 9, 9]);
        assert_eq!(ctx.buffer_contents(buffer).unwrap()[6..], [0, 0]);
    }

    #[test]
    fn textures_are_reuploaded_after_context_loss() {
        let mut ctx = HeadlessContext::new();
        let mut textures = HeadlessTextures::default();
        let handle = textures.update_texture(&mut ctx, TextureId(5)).unwrap();
        assert_eq!(textures.gpu_texture(TextureId(5), 0), Some(handle));

        ctx.lose_context();
        assert_eq!(textures.gpu_texture(TextureId(5), ctx.generation()), None);
        assert_eq!(ctx.blend_mode(), None);
    }
}
