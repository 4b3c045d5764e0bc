use crate::error::RenderError;

use super::vertex::{Vertex, INDICES_PER_QUAD, QUAD_STRIDE, VERTICES_PER_QUAD};

/// Largest batch whose vertex indices still fit in a `u16`.
pub const MAX_CAPACITY: usize = (u16::MAX as usize + 1) / VERTICES_PER_QUAD;


/// CPU-side storage shared by every quad of a batch: one interleaved vertex
/// array and the static index array drawn from it.
#[derive(Debug, Default)]
pub struct VertexBufferPool {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    capacity: usize,
}
impl VertexBufferPool {
    /// Allocates zeroed vertices for `capacity` quads together with their indices.
    pub fn reserve(capacity: usize) -> Result<Self, RenderError> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(RenderError::InvalidCapacity(capacity));
        }

        Ok(Self {
            vertices: vec![Vertex::default(); capacity * VERTICES_PER_QUAD],
            indices: Self::create_indices(capacity),
            capacity,
        })
    }

    /// Number of quads the pool can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writes one corner of the quad at `slot`.
    #[inline]
    pub fn write_vertex(&mut self, slot: usize, corner: usize, position: [f32; 3], uv: [f32; 2], color: u32) {
        debug_assert!(slot < self.capacity, "slot {slot} is outside a pool of {} quads", self.capacity);
        debug_assert!(corner < VERTICES_PER_QUAD);
        self.vertices[slot * VERTICES_PER_QUAD + corner] = Vertex::new(position, uv, color);
    }

    pub fn vertex(&self, slot: usize, corner: usize) -> &Vertex {
        &self.vertices[slot * VERTICES_PER_QUAD + corner]
    }

    /// The four corners of the quad at `slot`.
    pub fn quad(&self, slot: usize) -> &[Vertex] {
        let start = slot * VERTICES_PER_QUAD;
        &self.vertices[start..start + VERTICES_PER_QUAD]
    }

    /// The entire backing store.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The bytes of the first `quads` quads.
    pub fn vertex_bytes_for(&self, quads: usize) -> &[u8] {
        &self.vertex_bytes()[..quads * QUAD_STRIDE]
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Creates the repeating two-triangle pattern (0-1-2, 0-2-3), offset by 4 per quad
    fn create_indices(capacity: usize) -> Vec<u16> {
        let mut indices = vec![0u16; capacity * INDICES_PER_QUAD];
        indices
            .chunks_exact_mut(INDICES_PER_QUAD)
            .enumerate()
            .for_each(|(quad, chunk)| {
                let offset = (quad * VERTICES_PER_QUAD) as u16;
                chunk.copy_from_slice(&[
                    offset,
                    offset + 1,
                    offset + 2,
                    offset,
                    offset + 2,
                    offset + 3,
                ]);
            });
        indices
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::vertex::VERTEX_SIZE;

    #[test]
    fn reserve_zeroes_everything() {
        let pool = VertexBufferPool::reserve(8).unwrap();
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.vertex_bytes().len(), 8 * QUAD_STRIDE);
        assert!(pool.vertex_bytes().iter().all(|b| *b == 0));
        assert_eq!(pool.indices().len(), 8 * INDICES_PER_QUAD);
    }

    #[test]
    fn index_pattern_covers_every_quad() {
        let pool = VertexBufferPool::reserve(MAX_CAPACITY).unwrap();
        for (j, chunk) in pool.indices().chunks_exact(INDICES_PER_QUAD).enumerate() {
            let base = (4 * j) as u16;
            assert_eq!(chunk, [base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        assert_eq!(*pool.indices().last().unwrap(), u16::MAX);
    }

    #[test]
    fn rejects_bad_capacity() {
        assert!(matches!(VertexBufferPool::reserve(0), Err(RenderError::InvalidCapacity(0))));
        assert!(VertexBufferPool::reserve(MAX_CAPACITY + 1).is_err());
    }

    #[test]
    fn write_vertex_lands_at_byte_offset() {
        let mut pool = VertexBufferPool::reserve(4).unwrap();
        pool.write_vertex(2, 3, [1.0, 2.0, 3.0], [0.25, 0.75], 0xAABBCCDD);

        let offset = 2 * 4 * VERTEX_SIZE + 3 * VERTEX_SIZE;
        let bytes = &pool.vertex_bytes()[offset..offset + VERTEX_SIZE];
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &3.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[20..24], &0xAABBCCDDu32.to_le_bytes());

        // neighbours stay untouched
        assert_eq!(*pool.vertex(2, 2), Vertex::default());
        assert_eq!(*pool.vertex(3, 0), Vertex::default());
    }

    #[test]
    fn prefix_bytes_cover_whole_quads() {
        let pool = VertexBufferPool::reserve(10).unwrap();
        assert_eq!(pool.vertex_bytes_for(3).len(), 3 * QUAD_STRIDE);
        assert_eq!(pool.vertex_bytes_for(0).len(), 0);
        assert_eq!(pool.index_bytes().len(), 10 * INDICES_PER_QUAD * 2);
    }
}
