//! Backend compilation clients.
//!
//! A [`Client`] is the backend object a compiler talks to: it is bound to
//! one platform, a thread budget and an optional allow-list of device
//! ordinals, and owns the allocator the backend uses for its own buffers.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::memory::DeviceMemoryAllocator;
use crate::platform::{Platform, PlatformId};

/// Options a client is constructed from.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Platform the client compiles for.
    pub platform: Arc<dyn Platform>,
    /// Intra-op thread budget; `None` lets the backend decide.
    pub intra_op_parallelism_threads: Option<usize>,
    /// Device ordinals the client may use; `None` means all.
    pub allowed_devices: Option<BTreeSet<i32>>,
}

impl ClientOptions {
    /// Options for `platform` with no thread budget or device restriction.
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            intra_op_parallelism_threads: None,
            allowed_devices: None,
        }
    }

    pub fn with_intra_op_parallelism_threads(mut self, threads: usize) -> Self {
        self.intra_op_parallelism_threads = Some(threads);
        self
    }

    pub fn with_allowed_devices(mut self, allowed: Option<BTreeSet<i32>>) -> Self {
        self.allowed_devices = allowed;
        self
    }

    /// Structural key: options with equal keys must share a client.
    pub fn key(&self) -> ClientKey {
        ClientKey {
            platform: self.platform.id(),
            intra_op_parallelism_threads: self.intra_op_parallelism_threads,
            allowed_devices: self.allowed_devices.clone(),
        }
    }
}

/// Hashable identity of a [`ClientOptions`] value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub platform: PlatformId,
    pub intra_op_parallelism_threads: Option<usize>,
    pub allowed_devices: Option<BTreeSet<i32>>,
}

/// A backend compilation client.
#[derive(Debug)]
pub struct Client {
    options: ClientOptions,
    memory_allocator: Arc<dyn DeviceMemoryAllocator>,
}

impl Client {
    /// Create a client owning `memory_allocator`.
    pub fn new(options: ClientOptions, memory_allocator: Arc<dyn DeviceMemoryAllocator>) -> Self {
        Self {
            options,
            memory_allocator,
        }
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.options.platform
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The backend-native allocator shared by everything using this client.
    pub fn memory_allocator(&self) -> Arc<dyn DeviceMemoryAllocator> {
        Arc::clone(&self.memory_allocator)
    }

    /// Device ordinals this client may compile for.
    pub fn device_ordinals(&self) -> Vec<i32> {
        let count = i32::try_from(self.options.platform.visible_device_count()).unwrap_or(i32::MAX);
        (0..count)
            .filter(|ordinal| {
                self.options
                    .allowed_devices
                    .as_ref()
                    .map_or(true, |allowed| allowed.contains(ordinal))
            })
            .collect()
    }
}
