//! Reusable GPU structured buffer
//!
//! Holds at most one allocation and reallocates only when the element count
//! or stride changes. The native buffer is released explicitly through
//! [`GpuBufferCache::release`] (teardown, host reload) and again on drop.

/// Backend that creates, fills and frees native buffers
pub trait BufferAllocator {
    type Buffer;

    /// Allocate room for `count` elements of `stride` bytes
    fn allocate(&mut self, label: &str, count: usize, stride: usize) -> Self::Buffer;

    fn upload(&mut self, buffer: &mut Self::Buffer, bytes: &[u8]);

    fn release(&mut self, buffer: Self::Buffer);
}

/// Copyable reference to the cache's current allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    pub id: u64,
    pub count: usize,
    pub stride: usize,
}

impl BufferHandle {
    pub fn size_bytes(&self) -> usize {
        self.count * self.stride
    }
}

struct Allocation<B> {
    handle: BufferHandle,
    buffer: B,
}

/// Lazily allocated, shape-keyed buffer
pub struct GpuBufferCache<A: BufferAllocator> {
    allocator: A,
    label: String,
    current: Option<Allocation<A::Buffer>>,
    next_id: u64,
}

impl<A: BufferAllocator> GpuBufferCache<A> {
    pub fn new(allocator: A, label: &str) -> Self {
        Self {
            allocator,
            label: label.to_string(),
            current: None,
            next_id: 1,
        }
    }

    /// Buffer for `count` elements of `stride` bytes.
    ///
    /// Returns the existing allocation unchanged if its shape matches;
    /// otherwise frees it and allocates a new one.
    pub fn ensure(&mut self, count: usize, stride: usize) -> BufferHandle {
        if let Some(current) = &self.current {
            if current.handle.count == count && current.handle.stride == stride {
                return current.handle;
            }
        }

        self.release();

        let buffer = self.allocator.allocate(&self.label, count, stride);
        let handle = BufferHandle {
            id: self.next_id,
            count,
            stride,
        };
        self.next_id += 1;
        log::debug!(
            "Allocated '{}' buffer #{}: {} x {} bytes",
            self.label,
            handle.id,
            count,
            stride
        );

        self.current = Some(Allocation { handle, buffer });
        handle
    }

    /// Write `data` into the current allocation.
    ///
    /// Returns false, writing nothing, if nothing is allocated or the data
    /// does not exactly fill the allocation.
    pub fn upload<T: bytemuck::Pod>(&mut self, data: &[T]) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        match self.current.as_mut() {
            Some(current) if bytes.len() == current.handle.size_bytes() => {
                self.allocator.upload(&mut current.buffer, bytes);
                true
            }
            Some(current) => {
                log::warn!(
                    "Skipped upload to '{}' buffer #{}: {} bytes for a {} byte allocation",
                    self.label,
                    current.handle.id,
                    bytes.len(),
                    current.handle.size_bytes()
                );
                false
            }
            None => false,
        }
    }

    /// Free the current allocation, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(current) = self.current.take() {
            log::debug!("Released '{}' buffer #{}", self.label, current.handle.id);
            self.allocator.release(current.buffer);
        }
    }

    pub fn handle(&self) -> Option<BufferHandle> {
        self.current.as_ref().map(|c| c.handle)
    }

    /// Native buffer behind the current handle
    pub fn buffer(&self) -> Option<&A::Buffer> {
        self.current.as_ref().map(|c| &c.buffer)
    }

    pub fn is_allocated(&self) -> bool {
        self.current.is_some()
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }
}

impl<A: BufferAllocator> Drop for GpuBufferCache<A> {
    fn drop(&mut self) {
        self.release();
    }
}

/// CPU-side allocator for headless hosts and tests.
///
/// Buffers are plain byte vectors; counters record allocator traffic.
#[derive(Debug, Default)]
pub struct HostAllocator {
    pub allocations: u64,
    pub releases: u64,
    pub uploads: u64,
}

impl HostAllocator {
    pub fn live(&self) -> u64 {
        self.allocations - self.releases
    }
}

impl BufferAllocator for HostAllocator {
    type Buffer = Vec<u8>;

    fn allocate(&mut self, _label: &str, count: usize, stride: usize) -> Vec<u8> {
        self.allocations += 1;
        vec![0; count * stride]
    }

    fn upload(&mut self, buffer: &mut Vec<u8>, bytes: &[u8]) {
        self.uploads += 1;
        let n = bytes.len().min(buffer.len());
        buffer[..n].copy_from_slice(&bytes[..n]);
    }

    fn release(&mut self, _buffer: Vec<u8>) {
        self.releases += 1;
    }
}
