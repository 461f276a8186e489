//! Platform snapshot of a device.
//!
//! [`platform_info_from_device`] runs once per device, usually at setup, and
//! records everything the compiler builder and allocator resolver need:
//! the device type, the platform identity, and, for backend-managed devices,
//! the backend's metadata and native allocator.

use std::sync::Arc;

use devjit_device::{
    BackendMetadata, Device, DeviceError, DeviceMemoryAllocator, DeviceType, PlatformId,
    HOST_PLATFORM_ID,
};
use tracing::debug;

use crate::error::Result;

/// Backend state attached to a device, if a backend manages it.
#[derive(Debug, Clone)]
pub enum BackendBinding {
    NoBackend,
    BackendBound {
        metadata: Arc<BackendMetadata>,
        /// The backend's own allocator. It reports exhaustion through the
        /// backend's status channel.
        allocator: Arc<dyn DeviceMemoryAllocator>,
    },
}

/// How the compiler for a device is resolved, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// A backend already manages the device and supplies its compiler.
    BackendManaged,
    /// TPU without backend metadata; the client is supplied later by the
    /// consuming compilation layer.
    TpuOffloaded,
    /// Plain host compute device.
    HostManaged,
    /// Plain accelerator with a bound stream.
    AcceleratorManaged,
    /// Anything else; resolved through platform discovery if possible.
    Generic,
}

impl DeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::BackendManaged => "backend-managed",
            DeviceClass::TpuOffloaded => "tpu-offloaded",
            DeviceClass::HostManaged => "host-managed",
            DeviceClass::AcceleratorManaged => "accelerator-managed",
            DeviceClass::Generic => "generic",
        }
    }
}

/// Immutable platform snapshot of one device.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    device_type: DeviceType,
    platform_id: Option<PlatformId>,
    backend: BackendBinding,
}

impl PlatformInfo {
    /// Snapshot without backend state.
    pub fn new(device_type: DeviceType, platform_id: Option<PlatformId>) -> Self {
        Self {
            device_type,
            platform_id,
            backend: BackendBinding::NoBackend,
        }
    }

    /// Snapshot of a backend-managed device. Platform and allocator are
    /// taken from the metadata's client.
    pub fn backend_bound(device_type: DeviceType, metadata: Arc<BackendMetadata>) -> Self {
        let allocator = metadata.client().memory_allocator();
        Self {
            device_type,
            platform_id: Some(metadata.platform().id()),
            backend: BackendBinding::BackendBound {
                metadata,
                allocator,
            },
        }
    }

    pub fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    /// Platform identity; `None` when no platform is resolvable.
    pub fn platform_id(&self) -> Option<PlatformId> {
        self.platform_id
    }

    pub fn backend(&self) -> &BackendBinding {
        &self.backend
    }

    pub fn backend_metadata(&self) -> Option<&Arc<BackendMetadata>> {
        match &self.backend {
            BackendBinding::BackendBound { metadata, .. } => Some(metadata),
            BackendBinding::NoBackend => None,
        }
    }

    pub fn custom_allocator(&self) -> Option<&Arc<dyn DeviceMemoryAllocator>> {
        match &self.backend {
            BackendBinding::BackendBound { allocator, .. } => Some(allocator),
            BackendBinding::NoBackend => None,
        }
    }

    /// Classify the device for compiler resolution.
    pub fn device_class(&self) -> DeviceClass {
        if self.backend_metadata().is_some() {
            DeviceClass::BackendManaged
        } else if self.device_type.is_tpu() {
            DeviceClass::TpuOffloaded
        } else if self.device_type.is_cpu() {
            DeviceClass::HostManaged
        } else if self.device_type.is_gpu() {
            DeviceClass::AcceleratorManaged
        } else {
            DeviceClass::Generic
        }
    }
}

/// Resolve the platform snapshot of `device`.
///
/// Host devices map to the host platform, accelerators to the platform of
/// their bound stream, and backend-managed devices to their backend's
/// platform and allocator. Devices matching none of these get no platform.
pub fn platform_info_from_device(device: &dyn Device) -> Result<PlatformInfo> {
    let device_type = device.device_type().clone();

    if device_type.is_cpu() {
        debug!(device = device.name(), "resolved host platform");
        return Ok(PlatformInfo::new(device_type, Some(HOST_PLATFORM_ID)));
    }

    if device_type.is_gpu() {
        let stream = device
            .accelerator_stream()
            .ok_or_else(|| DeviceError::NoAcceleratorStream {
                device: device.name().to_string(),
            })?;
        let platform = stream.platform();
        debug!(device = device.name(), platform = platform.name(), "resolved accelerator platform");
        return Ok(PlatformInfo::new(device_type, Some(platform.id())));
    }

    if let Some(metadata) = device.backend_metadata()? {
        debug!(
            device = device.name(),
            platform = metadata.platform().name(),
            jit_device_type = %metadata.jit_device_type(),
            "resolved backend-managed platform"
        );
        return Ok(PlatformInfo::backend_bound(device_type, metadata));
    }

    debug!(device = device.name(), device_type = %device_type, "no platform resolvable");
    Ok(PlatformInfo::new(device_type, None))
}
