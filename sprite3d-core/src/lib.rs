use std::marker::PhantomData;
use std::time::Instant;

use winit::error::EventLoopError;
use winit::event::{Event, WindowEvent};

mod utils;
use utils::*;

pub mod config;
pub use config::{RendererConfig, DEFAULT_CAPACITY};

pub mod error;
pub use error::{ConfigError, RenderError};

pub mod graphics;
use graphics::{SpriteSystem, WindowSystem};

mod config_system;
pub use config_system::{ConfigSystem, CONFIG_FILE};

mod eventloop_system;
pub use eventloop_system::EventLoopSystem;


/// Routes spans and events to Tracy and to stdout through one subscriber.
/// `log` records from other crates are forwarded into it as well.
#[cfg(feature = "trace")]
pub fn install_tracing(filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| !meta.is_span()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(fmt_layer)
        .with(tracing_tracy::TracyLayer::default())
        .try_init()
}


pub mod events {
    /// Raised once, after every system was created.
    pub struct Initialized;

    pub struct NewFrame {
        /// Seconds since the previous frame.
        pub delta: f32,
    }

    /// Raised while a frame is open. Sprites are submitted from its handlers.
    pub struct Draw;

    pub struct Resized {
        pub width: u32,
        pub height: u32,
    }
}


/// Runs the window, the sprite renderer and the game system `T`.
pub struct Sprite3dEngine<T: GeeseSystem> {
    ctx: GeeseContext,
    marker: PhantomData<T>,
}
impl<T: GeeseSystem> Default for Sprite3dEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: GeeseSystem> Sprite3dEngine<T> {
    pub fn new() -> Self {
        let mut ctx = GeeseContext::default();
        ctx.flush()
            .with(geese::notify::add_system::<EventLoopSystem>())
            .with(geese::notify::add_system::<SpriteSystem>())
            .with(geese::notify::add_system::<T>());
        ctx.flush().with(events::Initialized);

        Self {
            ctx,
            marker: PhantomData,
        }
    }

    pub fn get_ctx(&mut self) -> &mut GeeseContext {
        &mut self.ctx
    }

    /// Blocks until the window is closed.
    pub fn run(mut self) -> Result<(), EventLoopError> {
        let event_loop = self
            .ctx
            .get_mut::<EventLoopSystem>()
            .take()
            .ok_or(EventLoopError::AlreadyRunning)?;

        let mut last_frame = Instant::now();
        info!("Starting the event loop");
        event_loop.run(move |event, target| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::Resized(size) => {
                    self.ctx.flush().with(events::Resized {
                        width: size.width,
                        height: size.height,
                    });
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let delta = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;
                    self.frame(delta);
                }
                _ => (),
            },
            Event::AboutToWait => self.ctx.get::<WindowSystem>().window_handle().request_redraw(),
            _ => (),
        })
    }

    fn frame(&mut self, delta: f32) {
        #[cfg(feature = "trace")]
        let _span = info_span!("Sprite3dEngine::frame").entered();

        self.ctx.flush().with(events::NewFrame { delta });
        if !self.ctx.get_mut::<SpriteSystem>().begin_frame() {
            return;
        }
        self.ctx.flush().with(events::Draw);
        self.ctx.get_mut::<SpriteSystem>().end_frame();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn systems_are_added_through_the_event_queue() {
        let mut ctx = GeeseContext::default();
        ctx.flush()
            .with(geese::notify::add_system::<ConfigSystem>());
        ctx.flush().with(events::Initialized);

        assert_eq!(ctx.get::<ConfigSystem>().renderer(), &RendererConfig::default());
    }
}
