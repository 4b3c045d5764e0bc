use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::utils::*;

use super::buffer_pool::VertexBufferPool;
use super::context::{
    BufferHandle, BufferTarget, BufferUsage, GraphicsContext, IndexFormat, ProgramHandle,
};
use super::object_renderer::ObjectRenderer;
use super::partition::{self, BatchState};
use super::projection::ProjectionComposer;
use super::quad_packer::QuadPacker;
use super::request::RenderRequest;
use super::shader::{ShaderCache, ShaderSource, PROJECTION_UNIFORM};
use super::stats::{count_draw_call, FrameStats};
use super::texture::{TextureId, TextureManager};
use super::vertex::{Vertex, INDICES_PER_QUAD};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// CPU buffers exist, GPU resources do not.
    Uninitialized,
    /// GPU resources exist and nothing is buffered.
    Ready,
    Accumulating,
    Flushing,
    Destroyed,
}

/// Handles owned by the renderer inside the current graphics context.
#[derive(Debug, Clone, Copy)]
struct GpuResources {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    default_program: ProgramHandle,
    generation: u32,
}


/// Batches 3D-transformed sprites into as few draw calls as their render
/// state allows.
///
/// Every submitted sprite is baked into four world-space vertices right away.
/// On [`flush`](ObjectRenderer::flush) the vertex data is uploaded once and
/// consecutive sprites sharing texture, blend mode and shader are drawn with a
/// single indexed draw, in submission order.
pub struct Sprite3dRenderer<G: GraphicsContext, T: TextureManager<G>> {
    context: G,
    textures: T,
    config: RendererConfig,

    pool: VertexBufferPool,
    packer: QuadPacker,
    composer: ProjectionComposer,
    // one entry per packed quad; capacity is reserved up front
    states: Vec<BatchState>,

    default_shader: ShaderSource,
    shader_cache: ShaderCache,
    gpu: Option<GpuResources>,

    state: RendererState,
    stats: FrameStats,
}
impl<G: GraphicsContext, T: TextureManager<G>> Sprite3dRenderer<G, T> {
    /// Allocates the CPU-side buffers. GPU resources are created by
    /// [`on_context_change`](ObjectRenderer::on_context_change).
    pub fn new(context: G, textures: T, config: RendererConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let pool = VertexBufferPool::reserve(config.capacity)?;

        Ok(Self {
            context,
            textures,
            packer: QuadPacker::new(config.round_pixels),
            composer: ProjectionComposer::default(),
            states: Vec::with_capacity(config.capacity),
            config,
            pool,
            default_shader: ShaderSource::sprite3d(),
            shader_cache: ShaderCache::default(),
            gpu: None,
            state: RendererState::Uninitialized,
            stats: FrameStats::default(),
        })
    }

    /// Same as [`new`](Self::new) followed by `on_context_change`.
    pub fn initialized(context: G, textures: T, config: RendererConfig) -> Result<Self, RenderError> {
        let mut renderer = Self::new(context, textures, config)?;
        renderer.on_context_change()?;
        Ok(renderer)
    }

    /// Replaces the shader used by sprites without an override.
    /// Takes effect on the next context change.
    pub fn with_default_shader(mut self, shader: ShaderSource) -> Self {
        self.default_shader = shader;
        self
    }

    pub fn with_projection_composer(mut self, composer: ProjectionComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn context(&self) -> &G {
        &self.context
    }
    pub fn context_mut(&mut self) -> &mut G {
        &mut self.context
    }

    pub fn textures(&self) -> &T {
        &self.textures
    }
    pub fn textures_mut(&mut self) -> &mut T {
        &mut self.textures
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Number of quads waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.states.len()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn pool(&self) -> &VertexBufferPool {
        &self.pool
    }

    pub fn set_round_pixels(&mut self, round_pixels: bool) {
        self.config.round_pixels = round_pixels;
        self.packer.round_pixels = round_pixels;
    }

    pub fn default_program(&self) -> Option<ProgramHandle> {
        self.gpu.map(|gpu| gpu.default_program)
    }

    /// Finds the program a sprite draws with, compiling an override on first use.
    fn resolve_program(&mut self, request: &RenderRequest, default_program: ProgramHandle) -> Result<ProgramHandle, RenderError> {
        match request.shader {
            None => Ok(default_program),
            Some(source) if source.id() == self.default_shader.id() => Ok(default_program),
            Some(source) => self.shader_cache.resolve(&mut self.context, source),
        }
    }

    /// Uploads the packed vertices. Past half the capacity the whole buffer
    /// goes up in one transfer, otherwise only the used prefix.
    fn upload_vertices(&mut self, count: usize) {
        let data = if count * 2 > self.pool.capacity() {
            self.pool.vertex_bytes()
        } else {
            self.pool.vertex_bytes_for(count)
        };
        self.context.upload_buffer(BufferTarget::Vertex, 0, data);
    }

    /// Issues one draw for `size` quads starting at slot `start`.
    fn draw_run(&mut self, texture: TextureId, size: usize, start: usize) {
        if size == 0 {
            return;
        }

        match self.textures.gpu_texture(texture, self.context.generation()) {
            Some(handle) => self.context.bind_texture(handle),
            None => {
                if let Err(e) = self.textures.update_texture(&mut self.context, texture) {
                    error!("Dropping {size} quads at slot {start}: {e}");
                    return;
                }
            }
        }

        let format = IndexFormat::U16;
        let first_index = (start * INDICES_PER_QUAD) as u64;
        self.context.draw_elements(
            (size * INDICES_PER_QUAD) as u32,
            format,
            first_index * format.byte_width(),
        );

        self.stats.draw_calls += 1;
        count_draw_call();
    }
}

impl<G: GraphicsContext, T: TextureManager<G>> ObjectRenderer for Sprite3dRenderer<G, T> {
    fn start(&mut self) {
        let Some(gpu) = self.gpu else {
            warn!("Sprite3dRenderer::start called in state {:?}", self.state);
            return;
        };
        self.stats = FrameStats::default();

        let context = &mut self.context;
        context.set_depth_test(true);
        context.active_texture(0);
        context.bind_buffer(BufferTarget::Vertex, gpu.vertex_buffer);
        context.bind_buffer(BufferTarget::Index, gpu.index_buffer);
        for attribute in Vertex::ATTRIBUTES {
            context.vertex_attribute(attribute);
        }
    }

    fn render(&mut self, request: &RenderRequest<'_>) {
        let Some(gpu) = self.gpu else {
            warn!("Ignoring sprite submitted in state {:?}", self.state);
            return;
        };

        if self.states.len() >= self.pool.capacity() {
            trace!("Batch of {} quads is full, flushing", self.states.len());
            self.flush();
        }

        // not loaded yet, try again next frame
        if request.texture.uvs().is_none() {
            trace!("Skipping sprite with unresolved texture {:?}", request.texture.base());
            self.stats.skipped += 1;
            return;
        }

        let program = match self.resolve_program(request, gpu.default_program) {
            Ok(program) => program,
            Err(e) => {
                error!("Skipping sprite: {e}");
                self.stats.skipped += 1;
                return;
            }
        };

        let slot = self.states.len();
        if !self.packer.pack(&mut self.pool, slot, request) {
            self.stats.skipped += 1;
            return;
        }
        self.states.push(BatchState {
            texture: request.texture.base(),
            blend_mode: request.blend_mode,
            program,
        });
        self.stats.quads += 1;
        self.state = RendererState::Accumulating;
    }

    fn flush(&mut self) {
        #[cfg(feature = "trace")]
        let _span = info_span!("Sprite3dRenderer::flush").entered();

        if self.states.is_empty() {
            return;
        }
        self.state = RendererState::Flushing;

        let count = self.states.len();
        self.upload_vertices(count);

        let states = std::mem::take(&mut self.states);
        let mut blend_mode = self.context.blend_mode();
        let mut program = None;

        for run in partition::runs(&states) {
            if blend_mode != Some(run.state.blend_mode) {
                blend_mode = Some(run.state.blend_mode);
                self.context.set_blend_mode(run.state.blend_mode);
            }

            if program != Some(run.state.program) {
                program = Some(run.state.program);
                self.context.use_program(run.state.program);
                let projection = self.composer.compose(&self.context.projection());
                self.context.upload_matrix4(run.state.program, PROJECTION_UNIFORM, &projection);
            }

            self.draw_run(run.state.texture, run.size, run.start);
        }

        // hand the reserved storage back, emptied
        self.states = states;
        self.states.clear();

        self.stats.flushes += 1;
        self.state = RendererState::Accumulating;
        trace!("Flushed {count} quads");
    }

    fn stop(&mut self) {
        self.flush();
        if self.gpu.is_some() {
            self.context.set_depth_test(false);
            self.state = RendererState::Ready;
        }
    }

    fn destroy(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            self.context.delete_buffer(gpu.vertex_buffer);
            self.context.delete_buffer(gpu.index_buffer);
            self.context.delete_program(gpu.default_program);
        }
        self.shader_cache.release(&mut self.context);

        self.pool = VertexBufferPool::default();
        self.states = Vec::new();
        self.state = RendererState::Destroyed;
        debug!("Sprite3dRenderer destroyed");
    }

    fn on_context_change(&mut self) -> Result<(), RenderError> {
        if self.state == RendererState::Destroyed {
            return Err(RenderError::NotReady("the renderer was destroyed"));
        }

        match self.gpu.take() {
            // same context, so the old handles are still live
            Some(gpu) if gpu.generation == self.context.generation() => {
                self.context.delete_buffer(gpu.vertex_buffer);
                self.context.delete_buffer(gpu.index_buffer);
                self.context.delete_program(gpu.default_program);
                self.shader_cache.release(&mut self.context);
            }
            _ => self.shader_cache.invalidate(),
        }
        self.states.clear();
        self.state = RendererState::Uninitialized;

        let default_program = self.context.create_program(&self.default_shader)?;
        let index_buffer = self.context.create_buffer(
            BufferTarget::Index,
            self.pool.index_bytes(),
            BufferUsage::Static,
        )?;
        let vertex_buffer = self.context.create_buffer(
            BufferTarget::Vertex,
            self.pool.vertex_bytes(),
            BufferUsage::Dynamic,
        )?;

        self.gpu = Some(GpuResources {
            vertex_buffer,
            index_buffer,
            default_program,
            generation: self.context.generation(),
        });
        self.state = RendererState::Ready;
        info!(
            "Sprite3dRenderer ready for context {} ({} quads per batch)",
            self.context.generation(),
            self.pool.capacity()
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::graphics::context::BlendMode;
    use crate::graphics::headless::{Command, HeadlessContext, HeadlessTextures};
    use crate::graphics::texture::Texture;

    type Renderer = Sprite3dRenderer<HeadlessContext, HeadlessTextures>;

    fn renderer(capacity: usize) -> Renderer {
        Sprite3dRenderer::initialized(
            HeadlessContext::new(),
            HeadlessTextures::default(),
            RendererConfig::default().with_capacity(capacity),
        )
        .unwrap()
    }

    #[test]
    fn walks_through_the_lifecycle() {
        let mut renderer = Sprite3dRenderer::new(
            HeadlessContext::new(),
            HeadlessTextures::default(),
            RendererConfig::default().with_capacity(4),
        )
        .unwrap();
        assert_eq!(renderer.state(), RendererState::Uninitialized);

        renderer.on_context_change().unwrap();
        assert_eq!(renderer.state(), RendererState::Ready);

        let texture = Texture::whole(TextureId(1), 4.0, 4.0);
        let transform = Mat4::IDENTITY;
        renderer.start();
        renderer.render(&RenderRequest::new(&transform, &texture));
        assert_eq!(renderer.state(), RendererState::Accumulating);
        renderer.stop();
        assert_eq!(renderer.state(), RendererState::Ready);

        renderer.destroy();
        assert_eq!(renderer.state(), RendererState::Destroyed);
        assert!(renderer.on_context_change().is_err());
    }

    #[test]
    fn render_before_context_is_ignored() {
        let mut renderer = Sprite3dRenderer::new(
            HeadlessContext::new(),
            HeadlessTextures::default(),
            RendererConfig::default(),
        )
        .unwrap();
        let texture = Texture::whole(TextureId(1), 4.0, 4.0);
        let transform = Mat4::IDENTITY;
        renderer.render(&RenderRequest::new(&transform, &texture));
        assert_eq!(renderer.pending(), 0);
        assert!(renderer.context().commands().is_empty());
    }

    #[test]
    fn start_declares_the_vertex_layout() {
        let mut renderer = renderer(4);
        renderer.context_mut().clear_commands();
        renderer.start();

        let commands = renderer.context().commands();
        assert_eq!(commands[0], Command::DepthTest(true));
        assert_eq!(commands[1], Command::ActiveTexture(0));
        let attributes: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                Command::VertexAttribute(a) => Some((a.location, a.offset, a.stride)),
                _ => None,
            })
            .collect();
        assert_eq!(attributes, vec![(0, 0, 24), (1, 12, 24), (2, 20, 24)]);
        assert!(renderer.context().depth_test());
    }

    #[test]
    fn unchanged_blend_mode_is_not_set_again() {
        let mut renderer = renderer(8);
        renderer.context_mut().set_blend_mode(BlendMode::Normal);
        renderer.context_mut().clear_commands();

        let texture = Texture::whole(TextureId(1), 4.0, 4.0);
        let transform = Mat4::IDENTITY;
        renderer.start();
        renderer.render(&RenderRequest::new(&transform, &texture));
        renderer.render(&RenderRequest::new(&transform, &texture).with_blend_mode(BlendMode::Add));
        renderer.stop();

        let blends: Vec<_> = renderer
            .context()
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::SetBlendMode(_)))
            .cloned()
            .collect();
        assert_eq!(blends, vec![Command::SetBlendMode(BlendMode::Add)]);
    }

    #[test]
    fn shader_change_uploads_the_projection() {
        let mut renderer = renderer(8);
        let custom = ShaderSource::new("custom", "// wgsl");
        let texture = Texture::whole(TextureId(1), 4.0, 4.0);
        let transform = Mat4::IDENTITY;

        renderer.start();
        renderer.render(&RenderRequest::new(&transform, &texture));
        renderer.render(&RenderRequest::new(&transform, &texture).with_shader(&custom));
        renderer.render(&RenderRequest::new(&transform, &texture).with_shader(&custom));
        renderer.render(&RenderRequest::new(&transform, &texture));
        renderer.stop();

        let ctx = renderer.context();
        assert_eq!(ctx.count(|c| matches!(c, Command::UseProgram(_))), 3);
        assert_eq!(ctx.count(|c| matches!(c, Command::UploadMatrix4 { .. })), 3);
        assert_eq!(ctx.draw_calls().len(), 3);
        // the override compiled once
        assert_eq!(ctx.count(|c| matches!(c, Command::CreateProgram { .. })), 2);
    }

    #[test]
    fn destroy_releases_gpu_resources() {
        let mut renderer = renderer(4);
        let custom = ShaderSource::new("custom", "");
        let texture = Texture::whole(TextureId(1), 4.0, 4.0);
        let transform = Mat4::IDENTITY;
        renderer.start();
        renderer.render(&RenderRequest::new(&transform, &texture).with_shader(&custom));
        renderer.stop();

        renderer.destroy();
        let ctx = renderer.context();
        assert_eq!(ctx.count(|c| matches!(c, Command::DeleteBuffer(_))), 2);
        assert_eq!(ctx.count(|c| matches!(c, Command::DeleteProgram(_))), 2);
        assert_eq!(renderer.capacity(), 0);

        // later calls are ignored
        renderer.render(&RenderRequest::new(&transform, &texture));
        renderer.flush();
        assert_eq!(renderer.pending(), 0);
    }

    #[test]
    fn context_change_rebuilds_everything() {
        let mut renderer = renderer(4);
        let texture = Texture::whole(TextureId(1), 4.0, 4.0);
        let transform = Mat4::IDENTITY;
        renderer.render(&RenderRequest::new(&transform, &texture));
        let old_program = renderer.default_program().unwrap();

        renderer.context_mut().lose_context();
        renderer.on_context_change().unwrap();

        assert_eq!(renderer.pending(), 0);
        assert_ne!(renderer.default_program(), Some(old_program));
        let ctx = renderer.context();
        assert_eq!(ctx.generation(), 1);
        assert_eq!(ctx.count(|c| matches!(c, Command::CreateBuffer { .. })), 4);
    }

    #[test]
    fn repeated_context_change_frees_the_old_handles() {
        let mut renderer = renderer(4);
        let custom = ShaderSource::new("custom", "");
        let texture = Texture::whole(TextureId(1), 4.0, 4.0);
        let transform = Mat4::IDENTITY;
        renderer.start();
        renderer.render(&RenderRequest::new(&transform, &texture).with_shader(&custom));
        renderer.stop();

        renderer.on_context_change().unwrap();

        let ctx = renderer.context();
        assert_eq!(ctx.count(|c| matches!(c, Command::CreateBuffer { .. })), 4);
        assert_eq!(ctx.count(|c| matches!(c, Command::DeleteBuffer(_))), 2);
        assert_eq!(ctx.count(|c| matches!(c, Command::CreateProgram { .. })), 3);
        assert_eq!(ctx.count(|c| matches!(c, Command::DeleteProgram(_))), 2);
    }

    #[test]
    fn failed_texture_upload_skips_the_run() {
        let mut renderer = renderer(4);
        renderer.textures_mut().fail_on(TextureId(2));
        let good = Texture::whole(TextureId(1), 4.0, 4.0);
        let bad = Texture::whole(TextureId(2), 4.0, 4.0);
        let transform = Mat4::IDENTITY;

        renderer.start();
        renderer.render(&RenderRequest::new(&transform, &bad));
        renderer.render(&RenderRequest::new(&transform, &good));
        renderer.stop();

        assert_eq!(renderer.context().draw_calls(), vec![(6, 12)]);
        assert_eq!(renderer.stats().draw_calls, 1);
    }
}
