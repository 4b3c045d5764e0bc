use winit::event_loop::EventLoop;

use crate::utils::*;


/// Owns the winit event loop until the engine takes it to run.
pub struct EventLoopSystem {
    event_loop: Option<EventLoop<()>>,
}
impl EventLoopSystem {
    /// `None` once the loop is running.
    pub fn get(&self) -> Option<&EventLoop<()>> {
        self.event_loop.as_ref()
    }

    pub fn take(&mut self) -> Option<EventLoop<()>> {
        self.event_loop.take()
    }
}
impl GeeseSystem for EventLoopSystem {
    fn new(_ctx: GeeseContextHandle<Self>) -> Self {
        Self {
            event_loop: Some(EventLoop::new().expect("Failed to create the event loop")),
        }
    }
}
