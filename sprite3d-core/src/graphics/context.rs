use glam::{Affine2, Mat4};

use crate::error::RenderError;
use super::shader::ShaderSource;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// How often the contents of a buffer are expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
}
impl IndexFormat {
    pub const fn byte_width(self) -> u64 {
        match self {
            IndexFormat::U16 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
    /// Four unsigned bytes, normalized to `0.0..=1.0`.
    Unorm8x4,
}
impl AttributeFormat {
    pub const fn size(self) -> u64 {
        match self {
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Unorm8x4 => 4,
        }
    }
}

/// Describes where one shader input lives inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub name: &'static str,
    pub format: AttributeFormat,
    pub offset: u64,
    pub stride: u64,
}

/// Blend equations understood by the graphics context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
}


/// The slice of a graphics API the sprite renderer needs.
///
/// Implementations behave like a state machine: buffers, programs and
/// textures are bound and later calls act on whatever is bound. Handles are
/// only valid for the [`generation`](GraphicsContext::generation) that
/// created them; a context loss starts a new generation.
pub trait GraphicsContext {
    /// Identifies the current logical context. Changes whenever every GPU
    /// resource has been invalidated.
    fn generation(&self) -> u32;

    /// Creates a buffer, binds it to `target` and fills it with `contents`.
    fn create_buffer(
        &mut self,
        target: BufferTarget,
        contents: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferHandle, RenderError>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferHandle);
    /// Overwrites `data.len()` bytes of the buffer bound to `target`, starting at `offset`.
    fn upload_buffer(&mut self, target: BufferTarget, offset: u64, data: &[u8]);
    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn vertex_attribute(&mut self, attribute: VertexAttribute);
    fn set_depth_test(&mut self, enabled: bool);
    fn active_texture(&mut self, unit: u32);

    /// The blend mode currently set, `None` when unknown (e.g. after a context loss).
    fn blend_mode(&self) -> Option<BlendMode>;
    fn set_blend_mode(&mut self, mode: BlendMode);

    fn create_program(&mut self, source: &ShaderSource) -> Result<ProgramHandle, RenderError>;
    fn use_program(&mut self, program: ProgramHandle);
    fn delete_program(&mut self, program: ProgramHandle);
    fn upload_matrix4(&mut self, program: ProgramHandle, name: &str, matrix: &Mat4);

    fn bind_texture(&mut self, texture: TextureHandle);
    /// Draws `count` indices from the bound index buffer as a triangle list,
    /// starting `byte_offset` bytes into it.
    fn draw_elements(&mut self, count: u32, format: IndexFormat, byte_offset: u64);

    /// The 2D orthographic projection of the active render target.
    fn projection(&self) -> Affine2;
}
