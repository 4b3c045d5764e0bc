use glam::{Mat4, Vec2};
use palette::Srgb;

use super::context::BlendMode;
use super::shader::ShaderSource;
use super::texture::Texture;


/// Everything the renderer reads from a sprite when it is submitted.
///
/// Only the state triple (texture, blend mode, shader) outlives the call to
/// [`render`](super::ObjectRenderer::render); the rest is baked into vertices.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// World transform. Only the x axis, y axis and translation columns are read.
    pub transform: &'a Mat4,
    pub texture: &'a Texture,
    /// Anchor point in `[0, 1]²`, relative to the texture frame.
    pub anchor: Vec2,
    pub tint: Srgb<u8>,
    /// Opacity in `0..=1`.
    pub alpha: f32,
    pub blend_mode: BlendMode,
    /// Replaces the renderer's default shader for this sprite.
    pub shader: Option<&'a ShaderSource>,
}
impl<'a> RenderRequest<'a> {
    /// An opaque, untinted, top-left anchored sprite using the default shader.
    pub fn new(transform: &'a Mat4, texture: &'a Texture) -> Self {
        Self {
            transform,
            texture,
            anchor: Vec2::ZERO,
            tint: Srgb::new(255, 255, 255),
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
            shader: None,
        }
    }

    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_tint(mut self, tint: Srgb<u8>, alpha: f32) -> Self {
        self.tint = tint;
        self.alpha = alpha;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_shader(mut self, shader: &'a ShaderSource) -> Self {
        self.shader = Some(shader);
        self
    }
}
