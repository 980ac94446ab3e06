//! wgpu buffer backend
//!
//! Storage buffers for the sphere records, filled through the queue.

use super::buffer_cache::BufferAllocator;

pub struct WgpuBufferAllocator {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuBufferAllocator {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl BufferAllocator for WgpuBufferAllocator {
    type Buffer = wgpu::Buffer;

    fn allocate(&mut self, label: &str, count: usize, stride: usize) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (count * stride) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload(&mut self, buffer: &mut wgpu::Buffer, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.queue.write_buffer(buffer, 0, bytes);
        }
    }

    fn release(&mut self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }
}
