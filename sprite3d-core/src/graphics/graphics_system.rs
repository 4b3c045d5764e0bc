use std::sync::Arc;

use wgpu::{
    CommandEncoder, CommandEncoderDescriptor, Device, Queue, Surface, SurfaceConfiguration,
    SurfaceError, SurfaceTexture, TextureView, TextureViewDescriptor,
};
use winit::dpi::PhysicalSize;

use crate::utils::*;
use super::WindowSystem;

pub type FrameData = Option<(SurfaceTexture, TextureView, CommandEncoder)>;
pub type FrameDataMut<'a> = Option<&'a mut (SurfaceTexture, TextureView, CommandEncoder)>;


/// Device, queue and the window surface.
pub struct GraphicsSystem {
    ctx: GeeseContextHandle<Self>,
    surface_config: SurfaceConfiguration,
    frame_data: FrameData,
    surface: Surface<'static>,
    device: Arc<Device>,
    queue: Arc<Queue>,
}
impl GraphicsSystem {
    pub fn request_redraw(&self) {
        self.ctx.get::<WindowSystem>().window_handle().request_redraw();
    }

    pub fn resize_surface(&mut self, new_size: PhysicalSize<u32>) {
        self.surface_config.width = new_size.width.max(1);
        self.surface_config.height = new_size.height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Acquires the next swapchain texture. A lost or outdated surface is
    /// reconfigured and the frame skipped.
    pub fn begin_frame(&mut self) -> Result<(), SurfaceError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(e @ (SurfaceError::Lost | SurfaceError::Outdated)) => {
                warn!("Surface {e}, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Frame encoder"),
        });
        self.frame_data = Some((frame, view, encoder));
        Ok(())
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn shared_device(&self) -> Arc<Device> {
        self.device.clone()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn shared_queue(&self) -> Arc<Queue> {
        self.queue.clone()
    }

    pub fn surface_config(&self) -> &SurfaceConfiguration {
        &self.surface_config
    }

    pub fn present_frame(&mut self) {
        let Some((frame, _, encoder)) = self.frame_data.take() else {
            warn!("No frame data present, begin a frame by calling begin_frame()");
            return;
        };
        self.queue.submit(Some(encoder.finish()));
        frame.present();
    }

    pub fn frame_data_mut(&mut self) -> FrameDataMut {
        self.frame_data.as_mut()
    }
}
impl GeeseSystem for GraphicsSystem {
    const DEPENDENCIES: Dependencies = dependencies()
        .with::<WindowSystem>();

    fn new(ctx: GeeseContextHandle<Self>) -> Self {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::PRIMARY),
            ..Default::default()
        });

        let window = ctx.get::<WindowSystem>().window_handle();
        let window_size = window.inner_size();
        let surface = instance
            .create_surface(window)
            .expect("Failed to create the window surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .expect("No graphics adapter can draw to the window");
        info!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // Make sure we use the texture resolution limits from the adapter, so we can support images the size of the swapchain.
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        ))
        .expect("Failed to create device");

        let swapchain_capabilities = surface.get_capabilities(&adapter);
        let swapchain_format = swapchain_capabilities.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: swapchain_format,
            width: window_size.width.max(1),
            height: window_size.height.max(1),
            // Fifo caused swapchain acquire timeouts, see https://github.com/bevyengine/bevy/issues/3606
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: swapchain_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Self {
            ctx,
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface,
            surface_config: config,
            frame_data: None,
        }
    }
}
