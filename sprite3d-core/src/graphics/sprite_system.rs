use wgpu::TextureView;

use crate::config_system::ConfigSystem;
use crate::events;
use crate::utils::*;

use super::{
    FrameStats, GraphicsSystem, ObjectRenderer, RenderRequest, Sprite3dRenderer, WgpuContext,
    WgpuTextures,
};

pub type WgpuSpriteRenderer = Sprite3dRenderer<WgpuContext, WgpuTextures>;


/// Drives a [`Sprite3dRenderer`] on the window surface, one start/stop cycle
/// per frame.
pub struct SpriteSystem {
    ctx: GeeseContextHandle<Self>,
    renderer: WgpuSpriteRenderer,
    depth_view: TextureView,
    clear_color: wgpu::Color,
    frame_started: bool,
}
impl SpriteSystem {
    /// Acquires the swapchain texture and prepares the renderer.
    /// Returns false if the frame has to be skipped.
    pub fn begin_frame(&mut self) -> bool {
        #[cfg(feature = "trace")]
        let _span = info_span!("SpriteSystem::begin_frame").entered();

        let mut graphics_sys = self.ctx.get_mut::<GraphicsSystem>();
        if let Err(e) = graphics_sys.begin_frame() {
            debug!("Skipping frame: {e}");
            return false;
        }
        self.renderer.start();
        self.frame_started = true;
        true
    }

    /// Buffers one sprite for the current frame.
    pub fn draw(&mut self, request: &RenderRequest<'_>) {
        if !self.frame_started {
            return;
        }
        self.renderer.render(request);
    }

    /// Flushes what is left, records the frame and presents it.
    pub fn end_frame(&mut self) {
        #[cfg(feature = "trace")]
        let _span = info_span!("SpriteSystem::end_frame").entered();

        if !self.frame_started {
            return;
        }
        self.frame_started = false;
        self.renderer.stop();

        let mut graphics_sys = self.ctx.get_mut::<GraphicsSystem>();
        if let Some((_, view, encoder)) = graphics_sys.frame_data_mut() {
            self.renderer
                .context_mut()
                .encode(encoder, view, &self.depth_view, Some(self.clear_color));
        }
        graphics_sys.present_frame();

        let stats = self.renderer.stats();
        trace!(
            "Frame: {} quads in {} draw calls ({} flushes, {} skipped)",
            stats.quads, stats.draw_calls, stats.flushes, stats.skipped
        );
    }

    pub fn renderer(&self) -> &WgpuSpriteRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut WgpuSpriteRenderer {
        &mut self.renderer
    }

    pub fn textures_mut(&mut self) -> &mut WgpuTextures {
        self.renderer.textures_mut()
    }

    pub fn stats(&self) -> FrameStats {
        self.renderer.stats()
    }

    fn on_resize(&mut self, event: &events::Resized) {
        #[cfg(feature = "trace")]
        let _span = info_span!("SpriteSystem::on_resize").entered();

        let mut graphics_sys = self.ctx.get_mut::<GraphicsSystem>();
        graphics_sys.resize_surface(winit::dpi::PhysicalSize::new(event.width, event.height));
        self.depth_view = WgpuContext::create_depth_view(graphics_sys.device(), event.width, event.height);
        self.renderer.context_mut().set_viewport(event.width, event.height);
    }
}
impl GeeseSystem for SpriteSystem {
    const DEPENDENCIES: Dependencies = dependencies()
        .with::<Mut<GraphicsSystem>>()
        .with::<ConfigSystem>();

    const EVENT_HANDLERS: EventHandlers<Self> = event_handlers()
        .with(Self::on_resize);

    fn new(ctx: GeeseContextHandle<Self>) -> Self {
        let config = ctx.get::<ConfigSystem>().renderer().clone();
        let graphics_sys = ctx.get::<GraphicsSystem>();
        let surface = graphics_sys.surface_config();
        let (width, height) = (surface.width, surface.height);

        let context = WgpuContext::new(
            graphics_sys.shared_device(),
            graphics_sys.shared_queue(),
            surface.format,
            width,
            height,
        );
        let depth_view = WgpuContext::create_depth_view(graphics_sys.device(), width, height);
        drop(graphics_sys);

        let [r, g, b, a] = config.clear_color;
        let renderer = Sprite3dRenderer::initialized(context, WgpuTextures::default(), config)
            .expect("Failed to create the sprite renderer");

        Self {
            ctx,
            renderer,
            depth_view,
            clear_color: wgpu::Color { r, g, b, a },
            frame_started: false,
        }
    }
}
impl Drop for SpriteSystem {
    fn drop(&mut self) {
        self.renderer.destroy();
    }
}
