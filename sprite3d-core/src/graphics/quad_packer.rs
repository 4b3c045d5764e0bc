use super::buffer_pool::VertexBufferPool;
use super::request::RenderRequest;
use super::texture::Texture;
use super::vertex::pack_color;


/// Local extents of a quad around its anchor: `w1..w0` horizontally and
/// `h1..h0` vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerOffsets {
    pub w0: f32,
    pub w1: f32,
    pub h0: f32,
    pub h1: f32,
}
impl CornerOffsets {
    pub fn new(texture: &Texture, anchor: glam::Vec2) -> Self {
        match texture.trim() {
            // a trimmed texture gets the transparent border back before transforming
            Some(trim) => {
                let crop = texture.crop();
                let w1 = trim.x - anchor.x * trim.width;
                let h1 = trim.y - anchor.y * trim.height;
                Self {
                    w0: w1 + crop.width,
                    w1,
                    h0: h1 + crop.height,
                    h1,
                }
            }
            None => {
                let frame = texture.frame();
                Self {
                    w0: frame.width * (1.0 - anchor.x),
                    w1: frame.width * -anchor.x,
                    h0: frame.height * (1.0 - anchor.y),
                    h1: frame.height * -anchor.y,
                }
            }
        }
    }

    /// Local corners in packing order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [(f32, f32); 4] {
        [
            (self.w1, self.h1),
            (self.w0, self.h1),
            (self.w0, self.h0),
            (self.w1, self.h0),
        ]
    }
}


/// Bakes sprites into world-space vertices.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadPacker {
    /// Truncate every coordinate toward zero.
    pub round_pixels: bool,
}
impl QuadPacker {
    pub fn new(round_pixels: bool) -> Self {
        Self { round_pixels }
    }

    /// Writes the four vertices of `request` at `slot`.
    ///
    /// Returns `false` without touching the pool when the texture has no UVs yet.
    pub fn pack(&self, pool: &mut VertexBufferPool, slot: usize, request: &RenderRequest) -> bool {
        let Some(uvs) = request.texture.uvs() else {
            return false;
        };

        let offsets = CornerOffsets::new(request.texture, request.anchor);
        let transform = request.transform;
        let x_axis = transform.x_axis.truncate();
        let y_axis = transform.y_axis.truncate();
        let translation = transform.w_axis.truncate();
        let color = pack_color(request.tint, request.alpha);

        for (corner, (x, y)) in offsets.corners().into_iter().enumerate() {
            let mut position = x_axis * x + y_axis * y + translation;
            if self.round_pixels {
                position = position.trunc();
            }
            pool.write_vertex(slot, corner, position.to_array(), uvs.0[corner].to_array(), color);
        }
        true
    }
}
