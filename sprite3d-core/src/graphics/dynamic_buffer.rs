use std::{marker::PhantomData, mem::size_of, num::NonZeroU64};

use bytemuck::{cast_slice, Pod, Zeroable};
use wgpu::{
    BindingResource, Buffer, BufferBinding, BufferDescriptor, BufferUsages,
    CommandEncoderDescriptor, Device, Queue,
};


/// A GPU `Buffer` that grows to fit whatever is written into it.
#[derive(Debug)]
pub struct DynamicBuffer<T: Pod + Zeroable> {
    label: String,
    buffer: Buffer,
    /// Whether the buffer was reallocated since it was last bound.
    dirty: bool,
    usage: BufferUsages,
    marker: PhantomData<T>,
}

impl<T: Pod + Zeroable> DynamicBuffer<T> {
    /// Creates a buffer able to hold `len` instances of `T` before reallocating.
    pub fn with_capacity(label: &str, device: &Device, mut usage: BufferUsages, len: usize) -> Self {
        usage |= BufferUsages::COPY_DST | BufferUsages::COPY_SRC;

        let size = (len * size_of::<T>()).next_power_of_two() as u64;
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size: 4.max(size),
            usage,
            mapped_at_creation: false,
        });

        Self {
            label: label.to_owned(),
            buffer,
            dirty: false,
            usage,
            marker: PhantomData,
        }
    }

    /// Binds `size` bytes from the start of the buffer, or all of it for `None`.
    /// Invalid once the buffer is dirty.
    pub fn binding(&self, size: Option<NonZeroU64>) -> BindingResource<'_> {
        BindingResource::Buffer(BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size,
        })
    }

    /// The GPU buffer currently backing this object. Changes on reallocation.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Writes `data` starting at element `offset`, growing the buffer first if needed.
    pub fn write(&mut self, device: &Device, queue: &Queue, offset: usize, data: &[T]) {
        let start = (offset * size_of::<T>()) as u64;
        let bytes = cast_slice::<_, u8>(data);
        self.ensure_raw_size(device, queue, start + bytes.len() as u64);
        queue.write_buffer(&self.buffer, start, bytes);
    }

    /// Copies `len` bytes from offset `from` to offset `to` on the GPU, growing
    /// the buffer first if needed. The ranges must not overlap.
    pub fn copy_within(&mut self, device: &Device, queue: &Queue, from: u64, to: u64, len: u64) {
        self.ensure_raw_size(device, queue, to + len);

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Dynamic buffer move encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, from, &self.buffer, to, len);
        queue.submit(Some(encoder.finish()));
    }

    /// Reallocates to at least `size` bytes, keeping the old contents.
    fn ensure_raw_size(&mut self, device: &Device, queue: &Queue, size: u64) {
        let old_size = self.buffer.size();
        if old_size >= size {
            return;
        }

        let old_buffer = std::mem::replace(
            &mut self.buffer,
            device.create_buffer(&BufferDescriptor {
                label: Some(&self.label),
                size: (2 * old_size).max(size.next_power_of_two()),
                usage: self.usage,
                mapped_at_creation: false,
            }),
        );

        let mut copy_encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Dynamic buffer copy encoder"),
        });
        copy_encoder.copy_buffer_to_buffer(&old_buffer, 0, &self.buffer, 0, old_size);
        queue.submit(Some(copy_encoder.finish()));

        self.dirty = true;
    }
}
