//! Allocator resolution for compilation and execution.

use std::sync::Arc;

use devjit_device::{AllocationAttributes, AllocatorAdapter, Device, DeviceMemoryAllocator, Stream};
use devjit_registry::PlatformManager;
use tracing::debug;

use crate::error::{JitError, Result};
use crate::platform_info::PlatformInfo;

/// Pick the allocator buffers for `device` are allocated through.
///
/// A backend-managed device always uses its backend's allocator, stream or
/// not. Otherwise the device's own allocator is wrapped in an adapter bound
/// to `stream` when one is given, or to the device's platform.
pub fn resolve_allocator(
    device: &dyn Device,
    stream: Option<&Arc<dyn Stream>>,
    info: &PlatformInfo,
    platforms: &dyn PlatformManager,
) -> Result<Arc<dyn DeviceMemoryAllocator>> {
    if let Some(custom) = info.custom_allocator() {
        return Ok(Arc::clone(custom));
    }

    let allocator = device.allocator(AllocationAttributes::default());
    let adapter = match stream {
        Some(stream) => {
            debug!(device = device.name(), ordinal = stream.device_ordinal(), "stream-bound allocator");
            AllocatorAdapter::for_stream(allocator, Arc::clone(stream))
        }
        None => {
            let id = info.platform_id().ok_or_else(|| JitError::NoPlatform {
                device_type: info.device_type().clone(),
            })?;
            let platform = platforms.platform_with_id(id)?;
            debug!(device = device.name(), platform = platform.name(), "platform-bound allocator");
            AllocatorAdapter::for_platform(allocator, platform)
        }
    };
    Ok(Arc::new(adapter))
}
