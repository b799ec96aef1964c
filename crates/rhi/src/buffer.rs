//! GPU buffer management.
//!
//! This module handles vertex, index, uniform, staging, and readback buffers.
//! It uses gpu-allocator for memory management and provides safe abstractions
//! for buffer creation and host data transfer.
//!
//! # Overview
//!
//! - [`MemoryIntent`] describes where a buffer's memory should live and how
//!   the host touches it
//! - [`Buffer`] wraps VkBuffer with gpu-allocator managed memory
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use glint_rhi::vk;
//! use glint_rhi::device::Device;
//! use glint_rhi::buffer::{Buffer, MemoryIntent};
//!
//! # fn example(device: Arc<Device>) -> Result<(), glint_rhi::RhiError> {
//! // A persistently mapped uniform buffer, rewritten every frame.
//! let ubo = Buffer::new(
//!     device,
//!     256,
//!     vk::BufferUsageFlags::UNIFORM_BUFFER,
//!     MemoryIntent::HostPersistent,
//! )?;
//! ubo.write_bytes(0, &[0u8; 256])?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Where a buffer's memory lives and how the host accesses it.
///
/// The intent is translated into a `gpu_allocator::MemoryLocation`; the
/// allocator then picks a concrete memory type satisfying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryIntent {
    /// Device-local memory, never touched by the host. Meshes and textures
    /// live here and are filled through a staging upload.
    DeviceLocal,
    /// Host-visible memory written once, sequentially, then handed to the
    /// GPU. Staging buffers.
    HostSequential,
    /// Host-visible memory kept persistently mapped and rewritten every
    /// frame. Per-image uniform buffers.
    HostPersistent,
    /// Host-visible memory the GPU writes and the host reads back.
    HostReadback,
}

impl MemoryIntent {
    /// Translates the intent into a gpu-allocator memory location.
    pub fn memory_location(self) -> MemoryLocation {
        match self {
            MemoryIntent::DeviceLocal => MemoryLocation::GpuOnly,
            MemoryIntent::HostSequential => MemoryLocation::CpuToGpu,
            MemoryIntent::HostPersistent => MemoryLocation::CpuToGpu,
            MemoryIntent::HostReadback => MemoryLocation::GpuToCpu,
        }
    }

    /// Returns a short name used in allocation labels and logs.
    pub fn name(self) -> &'static str {
        match self {
            MemoryIntent::DeviceLocal => "device-local",
            MemoryIntent::HostSequential => "host-sequential",
            MemoryIntent::HostPersistent => "host-persistent",
            MemoryIntent::HostReadback => "host-readback",
        }
    }
}

/// GPU buffer wrapper with managed memory.
///
/// Wraps a Vulkan buffer and its memory allocation. Memory is managed by
/// gpu-allocator, which handles suballocation and memory type selection.
///
/// # Thread Safety
///
/// The buffer itself is not thread-safe. Synchronize access externally when
/// sharing between threads.
pub struct Buffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan buffer handle.
    buffer: vk::Buffer,
    /// GPU memory allocation. `None` only after Drop takes it.
    allocation: Option<Allocation>,
    /// Buffer size in bytes.
    size: vk::DeviceSize,
    /// Memory intent the buffer was created with.
    intent: MemoryIntent,
}

impl Buffer {
    /// Creates a new buffer with the specified size, usage, and intent.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or if buffer creation or memory
    /// allocation fails. Out-of-memory is not recoverable here; the caller
    /// is expected to treat it as fatal.
    pub fn new(
        device: Arc<Device>,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        intent: MemoryIntent,
    ) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidResource(
                "buffer size must be greater than 0".to_string(),
            ));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation = {
            let mut allocator = device.allocator().lock().map_err(|_| {
                RhiError::InvalidResource("allocator mutex poisoned".to_string())
            })?;
            allocator.allocate(&AllocationCreateDesc {
                name: intent.name(),
                requirements,
                location: intent.memory_location(),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())?;
        }

        debug!("Created {} buffer: {} bytes", intent.name(), size);

        Ok(Self {
            device,
            buffer,
            allocation: Some(allocation),
            size,
            intent,
        })
    }

    /// Creates a host-visible buffer and fills it with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails, `data` is empty, or the intent is
    /// not host-visible.
    pub fn new_with_data(
        device: Arc<Device>,
        usage: vk::BufferUsageFlags,
        intent: MemoryIntent,
        data: &[u8],
    ) -> RhiResult<Self> {
        let buffer = Self::new(device, data.len() as vk::DeviceSize, usage, intent)?;
        buffer.write_bytes(0, data)?;
        Ok(buffer)
    }

    /// Writes bytes through the persistent mapping at the given offset.
    ///
    /// The buffer must have been created with a host-visible intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory is not mapped or the write would run
    /// past the end of the buffer.
    pub fn write_bytes(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::InvalidResource(format!(
                "write exceeds buffer size: offset {} + data {} > buffer {}",
                offset,
                data.len(),
                self.size
            )));
        }

        let mapped_ptr = self.mapped_ptr()?;

        unsafe {
            let dst = mapped_ptr.add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }

        Ok(())
    }

    /// Reads bytes through the persistent mapping at the given offset.
    ///
    /// Used for readback validation of staged uploads. The buffer must have
    /// been created with a host-visible intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory is not mapped or the read would run
    /// past the end of the buffer.
    pub fn read_bytes(&self, offset: vk::DeviceSize, out: &mut [u8]) -> RhiResult<()> {
        if out.is_empty() {
            return Ok(());
        }

        let end = offset + out.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::InvalidResource(format!(
                "read exceeds buffer size: offset {} + out {} > buffer {}",
                offset,
                out.len(),
                self.size
            )));
        }

        let mapped_ptr = self.mapped_ptr()?;

        unsafe {
            let src = mapped_ptr.add(offset as usize);
            std::ptr::copy_nonoverlapping(src, out.as_mut_ptr(), out.len());
        }

        Ok(())
    }

    fn mapped_ptr(&self) -> RhiResult<*mut u8> {
        let allocation = self.allocation.as_ref().ok_or_else(|| {
            RhiError::InvalidResource("buffer allocation is not available".to_string())
        })?;

        let mapped = allocation.mapped_ptr().ok_or_else(|| {
            RhiError::InvalidResource("buffer memory is not host-mapped".to_string())
        })?;

        Ok(mapped.as_ptr() as *mut u8)
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the buffer size in bytes.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Returns the memory intent the buffer was created with.
    #[inline]
    pub fn intent(&self) -> MemoryIntent {
        self.intent
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Free the allocation first, then destroy the buffer.
        if let Some(allocation) = self.allocation.take() {
            if let Ok(mut allocator) = self.device.allocator().lock() {
                if let Err(e) = allocator.free(allocation) {
                    tracing::error!("Failed to free buffer allocation: {:?}", e);
                }
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        debug!("Destroyed {} buffer", self.intent.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_memory_location() {
        assert_eq!(
            MemoryIntent::DeviceLocal.memory_location(),
            MemoryLocation::GpuOnly
        );
        assert_eq!(
            MemoryIntent::HostSequential.memory_location(),
            MemoryLocation::CpuToGpu
        );
        assert_eq!(
            MemoryIntent::HostPersistent.memory_location(),
            MemoryLocation::CpuToGpu
        );
        assert_eq!(
            MemoryIntent::HostReadback.memory_location(),
            MemoryLocation::GpuToCpu
        );
    }

    #[test]
    fn test_intent_names() {
        assert_eq!(MemoryIntent::DeviceLocal.name(), "device-local");
        assert_eq!(MemoryIntent::HostSequential.name(), "host-sequential");
        assert_eq!(MemoryIntent::HostPersistent.name(), "host-persistent");
        assert_eq!(MemoryIntent::HostReadback.name(), "host-readback");
    }
}
