//! Adapter from a generic [`Allocator`] to [`DeviceMemoryAllocator`].

use std::sync::Arc;

use crate::error::{DeviceError, Result};
use crate::memory::{AllocationAttributes, Allocator, DeviceMemory, DeviceMemoryAllocator};
use crate::platform::{Platform, PlatformId};
use crate::stream::Stream;

/// Alignment of every buffer handed to a compilation backend.
pub const BACKEND_BUFFER_ALIGNMENT: usize = 64;

#[derive(Debug, Clone)]
enum Binding {
    /// Host contexts have no stream; allocations are unordered.
    Platform(Arc<dyn Platform>),
    /// Allocations are ordered against this stream.
    Stream(Arc<dyn Stream>),
}

/// Wraps a generic device allocator for use by a compilation backend.
#[derive(Debug, Clone)]
pub struct AllocatorAdapter {
    wrapped: Arc<dyn Allocator>,
    binding: Binding,
}

impl AllocatorAdapter {
    /// Adapter for a context without a stream.
    pub fn for_platform(wrapped: Arc<dyn Allocator>, platform: Arc<dyn Platform>) -> Self {
        Self {
            wrapped,
            binding: Binding::Platform(platform),
        }
    }

    /// Adapter whose allocations are tied to `stream`.
    pub fn for_stream(wrapped: Arc<dyn Allocator>, stream: Arc<dyn Stream>) -> Self {
        Self {
            wrapped,
            binding: Binding::Stream(stream),
        }
    }

    /// The generic allocator being adapted.
    pub fn wrapped(&self) -> &Arc<dyn Allocator> {
        &self.wrapped
    }

    /// Whether this adapter is bound to a stream.
    pub fn is_stream_bound(&self) -> bool {
        matches!(self.binding, Binding::Stream(_))
    }
}

impl DeviceMemoryAllocator for AllocatorAdapter {
    fn platform_id(&self) -> PlatformId {
        match &self.binding {
            Binding::Platform(platform) => platform.id(),
            Binding::Stream(stream) => stream.platform().id(),
        }
    }

    fn allocate(
        &self,
        device_ordinal: i32,
        size_bytes: u64,
        retry_on_failure: bool,
    ) -> Result<DeviceMemory> {
        if size_bytes == 0 {
            return Ok(DeviceMemory::null(device_ordinal));
        }
        let attrs = AllocationAttributes { retry_on_failure };
        let handle = self
            .wrapped
            .allocate_raw(BACKEND_BUFFER_ALIGNMENT, size_bytes, attrs)
            .ok_or_else(|| DeviceError::ResourceExhausted {
                allocator: self.wrapped.name().to_string(),
                size_bytes,
            })?;
        Ok(DeviceMemory {
            device_ordinal,
            handle,
            size_bytes,
        })
    }

    fn deallocate(&self, _device_ordinal: i32, memory: DeviceMemory) -> Result<()> {
        if !memory.is_null() {
            self.wrapped.deallocate_raw(memory.handle);
        }
        Ok(())
    }

    fn stream(&self, device_ordinal: i32) -> Result<Arc<dyn Stream>> {
        match &self.binding {
            Binding::Platform(_) => Err(DeviceError::NoStream {
                ordinal: device_ordinal,
            }),
            Binding::Stream(stream) => {
                let expected = stream.device_ordinal();
                if expected != device_ordinal {
                    return Err(DeviceError::OrdinalMismatch {
                        expected,
                        actual: device_ordinal,
                    });
                }
                Ok(Arc::clone(stream))
            }
        }
    }

    fn allows_asynchronous_deallocation(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::HostAllocator;
    use crate::platform::{StaticPlatform, HOST_PLATFORM_ID};
    use crate::stream::BoundStream;

    fn host_allocator() -> Arc<HostAllocator> {
        Arc::new(HostAllocator::new("host"))
    }

    #[test]
    fn platform_bound_adapter() {
        let alloc = host_allocator();
        let adapter = AllocatorAdapter::for_platform(alloc.clone(), Arc::new(StaticPlatform::host()));
        assert_eq!(adapter.platform_id(), HOST_PLATFORM_ID);
        assert!(!adapter.is_stream_bound());

        let mem = adapter.allocate(0, 512, true).unwrap();
        assert_eq!(mem.size_bytes, 512);
        assert_eq!(alloc.bytes_in_use(), 512);

        adapter.deallocate(0, mem).unwrap();
        assert_eq!(alloc.bytes_in_use(), 0);
    }

    #[test]
    fn zero_sized_request_yields_null_buffer() {
        let alloc = host_allocator();
        let adapter = AllocatorAdapter::for_platform(alloc.clone(), Arc::new(StaticPlatform::host()));
        let mem = adapter.allocate(0, 0, false).unwrap();
        assert!(mem.is_null());
        assert_eq!(alloc.live_allocations(), 0);
        adapter.deallocate(0, mem).unwrap();
    }

    #[test]
    fn exhaustion_is_reported() {
        let alloc = Arc::new(HostAllocator::new("tiny").with_limit(16));
        let adapter = AllocatorAdapter::for_platform(alloc, Arc::new(StaticPlatform::host()));
        let err = adapter.allocate(0, 64, false).unwrap_err();
        assert!(matches!(err, DeviceError::ResourceExhausted { size_bytes: 64, .. }));
        assert!(err.to_string().contains("tiny"));
    }

    #[test]
    fn stream_bound_adapter() {
        let platform: Arc<dyn Platform> = Arc::new(StaticPlatform::new("CUDA", 2));
        let stream: Arc<dyn Stream> = Arc::new(BoundStream::new(Arc::clone(&platform), 1));
        let adapter = AllocatorAdapter::for_stream(host_allocator(), stream);
        assert!(adapter.is_stream_bound());
        assert_eq!(adapter.platform_id(), platform.id());
        assert_eq!(adapter.stream(1).unwrap().device_ordinal(), 1);
        assert!(matches!(
            adapter.stream(0).unwrap_err(),
            DeviceError::OrdinalMismatch { expected: 1, actual: 0 }
        ));
    }

    #[test]
    fn platform_bound_adapter_has_no_stream() {
        let adapter = AllocatorAdapter::for_platform(host_allocator(), Arc::new(StaticPlatform::host()));
        assert!(matches!(adapter.stream(0), Err(DeviceError::NoStream { ordinal: 0 })));
        assert!(adapter.allows_asynchronous_deallocation());
    }
}
