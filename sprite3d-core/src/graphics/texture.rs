use glam::Vec2;

use crate::error::RenderError;
use super::context::{GraphicsContext, TextureHandle};


/// Identity of a base texture (the image a GPU texture is created from).
/// Sprites cut from the same atlas share one id and therefore batch together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}
impl Rectangle {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Texture coordinates of the four quad corners, in packing order
/// (top-left, top-right, bottom-right, bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureUvs(pub [Vec2; 4]);
impl TextureUvs {
    /// Coordinates of `frame` inside a base image of `base_width` x `base_height` pixels
    pub fn from_frame(frame: Rectangle, base_width: f32, base_height: f32) -> Self {
        let left = frame.x / base_width;
        let right = (frame.x + frame.width) / base_width;
        let top = frame.y / base_height;
        let bottom = (frame.y + frame.height) / base_height;
        Self([
            Vec2::new(left, top),
            Vec2::new(right, top),
            Vec2::new(right, bottom),
            Vec2::new(left, bottom),
        ])
    }
}
impl Default for TextureUvs {
    fn default() -> Self {
        Self::from_frame(Rectangle::new(0.0, 0.0, 1.0, 1.0), 1.0, 1.0)
    }
}


/// A region of a base texture as seen by a sprite.
///
/// `uvs` stays `None` until the base image is known (e.g. while it is still
/// loading); sprites using such a texture are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    base: TextureId,
    frame: Rectangle,
    crop: Rectangle,
    trim: Option<Rectangle>,
    uvs: Option<TextureUvs>,
}
impl Texture {
    pub fn new(base: TextureId, frame: Rectangle) -> Self {
        Self {
            base,
            frame,
            crop: frame,
            trim: None,
            uvs: None,
        }
    }

    /// A texture covering the whole base image, ready to draw.
    pub fn whole(base: TextureId, width: f32, height: f32) -> Self {
        let mut texture = Self::new(base, Rectangle::new(0.0, 0.0, width, height));
        texture.resolve(width, height);
        texture
    }

    /// Marks the texture as trimmed: `trim` is the untrimmed source rectangle
    /// (offset of the visible content and the original size) and `crop` the
    /// visible content.
    pub fn with_trim(mut self, trim: Rectangle, crop: Rectangle) -> Self {
        self.trim = Some(trim);
        self.crop = crop;
        self
    }

    /// Computes the UVs once the base image size is known.
    pub fn resolve(&mut self, base_width: f32, base_height: f32) {
        self.uvs = Some(TextureUvs::from_frame(self.frame, base_width, base_height));
    }

    pub fn set_uvs(&mut self, uvs: Option<TextureUvs>) {
        self.uvs = uvs;
    }

    pub fn base(&self) -> TextureId {
        self.base
    }
    pub fn frame(&self) -> Rectangle {
        self.frame
    }
    pub fn crop(&self) -> Rectangle {
        self.crop
    }
    pub fn trim(&self) -> Option<Rectangle> {
        self.trim
    }
    pub fn uvs(&self) -> Option<&TextureUvs> {
        self.uvs.as_ref()
    }
}


/// Resolves base textures to GPU textures.
pub trait TextureManager<G: GraphicsContext> {
    /// The GPU texture already created for `texture` in context `generation`, if any.
    fn gpu_texture(&self, texture: TextureId, generation: u32) -> Option<TextureHandle>;

    /// Creates (or recreates) the GPU texture for `texture` and leaves it bound.
    fn update_texture(&mut self, context: &mut G, texture: TextureId) -> Result<TextureHandle, RenderError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uvs_follow_the_frame() {
        let uvs = TextureUvs::from_frame(Rectangle::new(32.0, 0.0, 32.0, 16.0), 64.0, 64.0);
        assert_eq!(uvs.0[0], Vec2::new(0.5, 0.0));
        assert_eq!(uvs.0[1], Vec2::new(1.0, 0.0));
        assert_eq!(uvs.0[2], Vec2::new(1.0, 0.25));
        assert_eq!(uvs.0[3], Vec2::new(0.5, 0.25));
    }

    #[test]
    fn new_texture_is_unresolved() {
        let mut texture = Texture::new(TextureId(1), Rectangle::new(0.0, 0.0, 8.0, 8.0));
        assert!(texture.uvs().is_none());
        texture.resolve(16.0, 16.0);
        assert_eq!(texture.uvs().unwrap().0[2], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn whole_texture_spans_unit_square() {
        let texture = Texture::whole(TextureId(3), 10.0, 20.0);
        assert_eq!(texture.uvs(), Some(&TextureUvs::default()));
        assert_eq!(texture.crop(), texture.frame());
    }
}
