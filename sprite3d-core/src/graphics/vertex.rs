use bytemuck_derive::{Pod, Zeroable};
use palette::Srgb;

use super::context::{AttributeFormat, VertexAttribute};

/// One interleaved vertex: position (xyz), texture coordinate (uv) and the
/// tint/alpha packed into a single `u32`.
///
/// ```text
/// | x | y | z | u | v | rgba |
/// 0   4   8   12  16  20     24
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: u32,
}
impl Vertex {
    pub fn new(position: [f32; 3], uv: [f32; 2], color: u32) -> Self {
        Self {
            position,
            uv,
            color,
        }
    }

    /// The attribute layout matching the interleaved stride.
    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute {
            location: 0,
            name: "aVertexPosition",
            format: AttributeFormat::Float32x3,
            offset: POSITION_OFFSET,
            stride: VERTEX_SIZE as u64,
        },
        VertexAttribute {
            location: 1,
            name: "aTextureCoord",
            format: AttributeFormat::Float32x2,
            offset: UV_OFFSET,
            stride: VERTEX_SIZE as u64,
        },
        // the color is read as four normalized unsigned bytes
        VertexAttribute {
            location: 2,
            name: "aColor",
            format: AttributeFormat::Unorm8x4,
            offset: COLOR_OFFSET,
            stride: VERTEX_SIZE as u64,
        },
    ];
}

pub const VERTEX_SIZE: usize = std::mem::size_of::<Vertex>();
pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;
/// Bytes occupied by one quad in the vertex buffer.
pub const QUAD_STRIDE: usize = VERTEX_SIZE * VERTICES_PER_QUAD;

pub const POSITION_OFFSET: u64 = 0;
pub const UV_OFFSET: u64 = 3 * 4;
pub const COLOR_OFFSET: u64 = 5 * 4;

/// Packs a tint and alpha into the vertex color word.
///
/// The tint's red and blue bytes swap places so that the little endian word
/// reads `r, g, b, a` in memory. Alpha is clamped to `0..=1`, scaled to 255
/// and truncated into the top byte.
pub fn pack_color(tint: Srgb<u8>, alpha: f32) -> u32 {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0) as u32;
    (alpha << 24) | ((tint.blue as u32) << 16) | ((tint.green as u32) << 8) | tint.red as u32
}

/// Builds a tint from a `0xRRGGBB` value.
pub fn tint_from_hex(hex: u32) -> Srgb<u8> {
    Srgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_byte_exact() {
        assert_eq!(VERTEX_SIZE, 24);
        assert_eq!(QUAD_STRIDE, 96);
        assert_eq!(std::mem::offset_of!(Vertex, position) as u64, POSITION_OFFSET);
        assert_eq!(std::mem::offset_of!(Vertex, uv) as u64, UV_OFFSET);
        assert_eq!(std::mem::offset_of!(Vertex, color) as u64, COLOR_OFFSET);
    }

    #[test]
    fn packs_white_opaque() {
        assert_eq!(pack_color(tint_from_hex(0xFFFFFF), 1.0), 0xFFFF_FFFF);
    }

    #[test]
    fn swaps_red_and_blue() {
        let packed = pack_color(tint_from_hex(0x112233), 1.0);
        assert_eq!(packed, 0xFF33_2211);
        // memory order is r, g, b, a
        assert_eq!(packed.to_le_bytes(), [0x11, 0x22, 0x33, 0xFF]);
    }

    #[test]
    fn truncates_and_clamps_alpha() {
        assert_eq!(pack_color(tint_from_hex(0), 0.5) >> 24, 127);
        assert_eq!(pack_color(tint_from_hex(0), 0.0) >> 24, 0);
        assert_eq!(pack_color(tint_from_hex(0), 3.0) >> 24, 255);
        assert_eq!(pack_color(tint_from_hex(0), -1.0) >> 24, 0);
    }

    #[test]
    fn attributes_follow_the_stride() {
        for attribute in Vertex::ATTRIBUTES {
            assert_eq!(attribute.stride, VERTEX_SIZE as u64);
            assert!(attribute.offset + attribute.format.size() <= VERTEX_SIZE as u64);
        }
    }
}
