//! Host-visible buffers
//!
//! The per-frame vertex data and overlay geometry change every frame, so
//! every buffer here lives in host-visible, host-coherent memory and is
//! written through a mapping. Vertex and index buffers grow on demand.

use ash::{vk, Device};
use bytemuck::Pod;
use std::marker::PhantomData;

use crate::render::vulkan::{VulkanContext, VulkanError, VulkanResult};

/// Smallest allocation of a growable buffer in bytes
pub const MIN_DYNAMIC_BUFFER_SIZE: vk::DeviceSize = 4096;

const HOST_MEMORY: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::from_raw(
    vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw() | vk::MemoryPropertyFlags::HOST_COHERENT.as_raw(),
);

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it
    pub fn new(
        context: &VulkanContext,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_info, None).map_err(VulkanError::Api)? };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory = context
            .find_memory_type(requirements.memory_type_bits, properties)
            .and_then(|memory_type_index| {
                let alloc_info = vk::MemoryAllocateInfo::builder()
                    .allocation_size(requirements.size)
                    .memory_type_index(memory_type_index);
                unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api) }
            });
        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        if let Err(e) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
            }
            return Err(VulkanError::Api(e));
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Host-visible staging buffer filled with `bytes`
    pub fn staging(context: &VulkanContext, bytes: &[u8]) -> VulkanResult<Self> {
        let buffer = Self::new(
            context,
            bytes.len().max(1) as vk::DeviceSize,
            vk::BufferUsageFlags::TRANSFER_SRC,
            HOST_MEMORY,
        )?;
        buffer.write_bytes(bytes)?;
        Ok(buffer)
    }

    /// Copy `bytes` to the start of the buffer through a mapping
    pub fn write_bytes(&self, bytes: &[u8]) -> VulkanResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if bytes.len() as vk::DeviceSize > self.size {
            return Err(VulkanError::InvalidOperation {
                reason: format!("Write of {} bytes exceeds buffer size {}", bytes.len(), self.size),
            });
        }

        unsafe {
            let mapped = self
                .device
                .map_memory(self.memory, 0, bytes.len() as vk::DeviceSize, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.cast::<u8>(), bytes.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Capacity for `required` bytes: unchanged when it fits, otherwise the
/// next power of two, never below [`MIN_DYNAMIC_BUFFER_SIZE`]
pub fn grown_capacity(current: vk::DeviceSize, required: vk::DeviceSize) -> vk::DeviceSize {
    if required <= current {
        current
    } else {
        required.next_power_of_two().max(MIN_DYNAMIC_BUFFER_SIZE)
    }
}

/// Host-visible buffer that is reallocated when an upload does not fit
struct DynamicBuffer {
    usage: vk::BufferUsageFlags,
    buffer: Option<Buffer>,
}

impl DynamicBuffer {
    fn new(usage: vk::BufferUsageFlags) -> Self {
        Self { usage, buffer: None }
    }

    /// The caller guarantees the GPU no longer reads the old buffer
    fn upload(&mut self, context: &VulkanContext, bytes: &[u8]) -> VulkanResult<()> {
        let current = self.buffer.as_ref().map_or(0, Buffer::size);
        let capacity = grown_capacity(current, bytes.len() as vk::DeviceSize);
        if capacity != current {
            log::debug!("Growing {:?} buffer from {current} to {capacity} bytes", self.usage);
            self.buffer = Some(Buffer::new(context, capacity, self.usage, HOST_MEMORY)?);
        }

        match &self.buffer {
            Some(buffer) => buffer.write_bytes(bytes),
            None => Err(VulkanError::InvalidOperation {
                reason: "Dynamic buffer missing after allocation".to_string(),
            }),
        }
    }

    fn handle(&self) -> Option<vk::Buffer> {
        self.buffer.as_ref().map(Buffer::handle)
    }
}

/// Growable vertex buffer rewritten every frame
pub struct VertexBuffer {
    inner: DynamicBuffer,
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexBuffer {
    /// Create an empty vertex buffer; memory is allocated on first upload
    pub fn new() -> Self {
        Self {
            inner: DynamicBuffer::new(vk::BufferUsageFlags::VERTEX_BUFFER),
        }
    }

    /// Replace the contents with `bytes`
    pub fn upload(&mut self, context: &VulkanContext, bytes: &[u8]) -> VulkanResult<()> {
        self.inner.upload(context, bytes)
    }

    /// Buffer handle, `None` before the first upload
    pub fn handle(&self) -> Option<vk::Buffer> {
        self.inner.handle()
    }
}

/// Growable 32-bit index buffer
pub struct IndexBuffer {
    inner: DynamicBuffer,
}

impl Default for IndexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuffer {
    /// Create an empty index buffer
    pub fn new() -> Self {
        Self {
            inner: DynamicBuffer::new(vk::BufferUsageFlags::INDEX_BUFFER),
        }
    }

    /// Replace the contents with `indices`
    pub fn upload(&mut self, context: &VulkanContext, indices: &[u32]) -> VulkanResult<()> {
        self.inner.upload(context, bytemuck::cast_slice(indices))
    }

    /// Buffer handle, `None` before the first upload
    pub fn handle(&self) -> Option<vk::Buffer> {
        self.inner.handle()
    }
}

/// Uniform buffer holding one `T`
pub struct UniformBuffer<T> {
    buffer: Buffer,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    /// Create a uniform buffer sized for `T`
    pub fn new(context: &VulkanContext) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            context,
            std::mem::size_of::<T>() as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            HOST_MEMORY,
        )?;

        Ok(Self {
            buffer,
            _marker: PhantomData,
        })
    }

    /// Write `data` into the buffer
    pub fn update(&self, data: &T) -> VulkanResult<()> {
        self.buffer.write_bytes(bytemuck::bytes_of(data))
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Size of `T` in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_kept_when_data_fits() {
        assert_eq!(grown_capacity(8192, 8192), 8192);
        assert_eq!(grown_capacity(8192, 100), 8192);
        assert_eq!(grown_capacity(0, 0), 0);
    }

    #[test]
    fn test_capacity_grows_to_power_of_two() {
        assert_eq!(grown_capacity(0, 1), MIN_DYNAMIC_BUFFER_SIZE);
        assert_eq!(grown_capacity(4096, 4097), 8192);
        // 146 scene vertices of 32 bytes
        assert_eq!(grown_capacity(0, 146 * 32), 8192);
    }

    #[test]
    fn test_host_memory_flags() {
        assert!(HOST_MEMORY.contains(vk::MemoryPropertyFlags::HOST_VISIBLE));
        assert!(HOST_MEMORY.contains(vk::MemoryPropertyFlags::HOST_COHERENT));
    }
}
