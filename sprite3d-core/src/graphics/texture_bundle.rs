use wgpu::{
    Device, Extent3d, ImageDataLayout, Queue, Sampler, SamplerDescriptor, Texture,
    TextureView, TextureViewDescriptor,
};

/// A sampled GPU texture together with its view and sampler.
#[derive(Debug)]
pub struct TextureBundle {
    texture: Texture,
    view: TextureView,
    sampler: Sampler,
}
impl TextureBundle {
    /// Uploads tightly packed 8-bit RGBA pixels with straight alpha.
    /// They are premultiplied on the way, which the blend states expect.
    pub fn from_rgba(device: &Device, queue: &Queue, label: &str, width: u32, height: u32, data: &[u8]) -> Self {
        let extent = Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut pixels = data.to_vec();
        premultiply_alpha(&mut pixels);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * extent.width),
                rows_per_image: Some(extent.height),
            },
            extent,
        );

        Self {
            texture,
            view,
            sampler,
        }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }
    pub fn height(&self) -> u32 {
        self.texture.height()
    }
}


/// Scales the color channels of RGBA8 pixels by their alpha, rounding to nearest.
pub fn premultiply_alpha(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        let alpha = pixel[3] as u16;
        for channel in &mut pixel[..3] {
            *channel = ((*channel as u16 * alpha + 127) / 255) as u8;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_texels_lose_their_color() {
        let mut pixels = [255, 255, 255, 0, 200, 100, 50, 255, 255, 128, 0, 128];
        premultiply_alpha(&mut pixels);
        assert_eq!(pixels, [0, 0, 0, 0, 200, 100, 50, 255, 128, 64, 0, 128]);
    }
}
