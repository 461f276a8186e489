//! Device handles and backend metadata.

use std::fmt;
use std::sync::Arc;

use crate::client::Client;
use crate::device_type::DeviceType;
use crate::error::Result;
use crate::memory::{AllocationAttributes, Allocator, HostAllocator};
use crate::platform::Platform;
use crate::stream::Stream;

/// State a compilation backend already tracks for a device it manages.
#[derive(Debug, Clone)]
pub struct BackendMetadata {
    jit_device_type: DeviceType,
    platform: Arc<dyn Platform>,
    client: Arc<Client>,
}

impl BackendMetadata {
    pub fn new(jit_device_type: DeviceType, platform: Arc<dyn Platform>, client: Arc<Client>) -> Self {
        Self {
            jit_device_type,
            platform,
            client,
        }
    }

    /// Compilation device type the backend compiles this device's work as.
    pub fn jit_device_type(&self) -> &DeviceType {
        &self.jit_device_type
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }
}

/// A compute device as seen by the compiler resolver.
pub trait Device: fmt::Debug + Send + Sync {
    /// Device name (e.g., "/device:GPU:0").
    fn name(&self) -> &str;

    fn device_type(&self) -> &DeviceType;

    /// Execution stream already bound to this device, if any.
    fn accelerator_stream(&self) -> Option<Arc<dyn Stream>>;

    /// Backend metadata for backend-managed devices.
    ///
    /// `Ok(None)` means the device is not backend managed. `Err` is reserved
    /// for metadata that exists but cannot be read.
    fn backend_metadata(&self) -> Result<Option<Arc<BackendMetadata>>>;

    /// The device's generic allocator.
    fn allocator(&self, attrs: AllocationAttributes) -> Arc<dyn Allocator>;

    /// Size of the device's intra-op thread pool.
    fn intra_op_threads(&self) -> usize;
}

/// A device assembled from its parts.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    name: String,
    device_type: DeviceType,
    stream: Option<Arc<dyn Stream>>,
    metadata: Option<Arc<BackendMetadata>>,
    allocator: Arc<dyn Allocator>,
    intra_op_threads: usize,
}

impl DeviceHandle {
    /// A device with a fresh host allocator, one intra-op thread, no stream
    /// and no backend metadata.
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        let name = name.into();
        let allocator = Arc::new(HostAllocator::new(format!("{name}/allocator")));
        Self {
            name,
            device_type,
            stream: None,
            metadata: None,
            allocator,
            intra_op_threads: 1,
        }
    }

    pub fn with_stream(mut self, stream: Arc<dyn Stream>) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_backend_metadata(mut self, metadata: Arc<BackendMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_intra_op_threads(mut self, threads: usize) -> Self {
        self.intra_op_threads = threads;
        self
    }
}

impl Device for DeviceHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    fn accelerator_stream(&self) -> Option<Arc<dyn Stream>> {
        self.stream.clone()
    }

    fn backend_metadata(&self) -> Result<Option<Arc<BackendMetadata>>> {
        Ok(self.metadata.clone())
    }

    fn allocator(&self, _attrs: AllocationAttributes) -> Arc<dyn Allocator> {
        Arc::clone(&self.allocator)
    }

    fn intra_op_threads(&self) -> usize {
        self.intra_op_threads
    }
}
