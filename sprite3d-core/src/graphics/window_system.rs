use std::sync::Arc;

use winit::window::Window;

use crate::utils::*;
use crate::EventLoopSystem;

pub const DEFAULT_WINDOW_SIZE: winit::dpi::PhysicalSize<u32> = winit::dpi::PhysicalSize::new(800, 600);


pub struct WindowSystem {
    window_handle: Arc<Window>,
}
impl WindowSystem {
    pub fn window_handle(&self) -> Arc<Window> {
        self.window_handle.clone()
    }
}
impl GeeseSystem for WindowSystem {
    const DEPENDENCIES: Dependencies = dependencies()
        .with::<EventLoopSystem>();

    fn new(ctx: GeeseContextHandle<Self>) -> Self {
        let event_loop = ctx.get::<EventLoopSystem>();
        let event_loop = event_loop
            .get()
            .expect("The window must be created before the event loop runs");
        let window_handle = winit::window::WindowBuilder::new()
            .with_title("Sprite3d")
            .with_inner_size(DEFAULT_WINDOW_SIZE)
            .with_visible(false)
            .with_resizable(true)
            .build(event_loop)
            .expect("Failed to create the window");

        Self {
            window_handle: Arc::new(window_handle),
        }
    }
}
