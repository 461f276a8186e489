//! Allocator interfaces.
//!
//! Two allocator shapes meet here:
//! - [`Allocator`] is the generic device allocator every device hands out.
//! - [`DeviceMemoryAllocator`] is the interface compilation backends allocate
//!   buffers through. Backend-managed devices own one natively; everything
//!   else gets an [`crate::AllocatorAdapter`] over its generic allocator.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::platform::PlatformId;
use crate::stream::Stream;

/// Per-request allocation attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationAttributes {
    /// Whether the allocator may retry (e.g., wait for frees) before failing.
    pub retry_on_failure: bool,
}

impl Default for AllocationAttributes {
    fn default() -> Self {
        Self {
            retry_on_failure: true,
        }
    }
}

/// A device buffer handed out by a [`DeviceMemoryAllocator`].
///
/// A zero-sized buffer is the null buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMemory {
    /// Device the buffer lives on.
    pub device_ordinal: i32,
    /// Opaque allocator handle.
    pub handle: u64,
    /// Buffer size in bytes.
    pub size_bytes: u64,
}

impl DeviceMemory {
    /// The null buffer for `device_ordinal`.
    pub fn null(device_ordinal: i32) -> Self {
        Self {
            device_ordinal,
            handle: 0,
            size_bytes: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.size_bytes == 0
    }
}

/// Generic device allocator.
pub trait Allocator: fmt::Debug + Send + Sync {
    /// Allocator name, used in diagnostics.
    fn name(&self) -> &str;

    /// Allocate `size_bytes` with the given alignment.
    ///
    /// Returns `None` when the request cannot be satisfied.
    fn allocate_raw(&self, alignment: usize, size_bytes: u64, attrs: AllocationAttributes)
        -> Option<u64>;

    /// Release a handle previously returned by [`Allocator::allocate_raw`].
    fn deallocate_raw(&self, handle: u64);
}

/// Allocator interface expected by compilation backends.
pub trait DeviceMemoryAllocator: fmt::Debug + Send + Sync {
    /// Platform the allocator serves.
    fn platform_id(&self) -> PlatformId;

    /// Allocate a buffer on `device_ordinal`. A zero-byte request yields the
    /// null buffer.
    fn allocate(
        &self,
        device_ordinal: i32,
        size_bytes: u64,
        retry_on_failure: bool,
    ) -> Result<DeviceMemory>;

    /// Release a buffer. Releasing the null buffer is a no-op.
    fn deallocate(&self, device_ordinal: i32, memory: DeviceMemory) -> Result<()>;

    /// Stream that allocations on `device_ordinal` are ordered against.
    fn stream(&self, device_ordinal: i32) -> Result<Arc<dyn Stream>>;

    /// Whether buffers may be released before work using them completes.
    fn allows_asynchronous_deallocation(&self) -> bool;
}

/// Host allocator that tracks live allocations and an optional byte limit.
///
/// Handles are bookkeeping tokens, not addresses. The live map is updated
/// by single inserts and removes, so a panic elsewhere never leaves it
/// half-written and a poisoned lock is read through.
#[derive(Debug)]
pub struct HostAllocator {
    name: String,
    limit_bytes: Option<u64>,
    next_handle: AtomicU64,
    live: Mutex<HashMap<u64, u64>>,
}

impl HostAllocator {
    /// Create an unbounded allocator.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit_bytes: None,
            next_handle: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Refuse allocations that would push live bytes above `limit_bytes`.
    pub fn with_limit(mut self, limit_bytes: u64) -> Self {
        self.limit_bytes = Some(limit_bytes);
        self
    }

    /// Total bytes currently allocated.
    pub fn bytes_in_use(&self) -> u64 {
        self.live().values().sum()
    }

    /// Number of live allocations.
    pub fn live_allocations(&self) -> usize {
        self.live().len()
    }

    fn live(&self) -> MutexGuard<'_, HashMap<u64, u64>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Allocator for HostAllocator {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate_raw(
        &self,
        alignment: usize,
        size_bytes: u64,
        _attrs: AllocationAttributes,
    ) -> Option<u64> {
        if alignment != 0 && !alignment.is_power_of_two() {
            return None;
        }
        let mut live = self.live();
        if let Some(limit) = self.limit_bytes {
            let in_use: u64 = live.values().sum();
            if in_use.saturating_add(size_bytes) > limit {
                tracing::debug!(
                    allocator = %self.name,
                    size_bytes,
                    in_use,
                    limit,
                    "host allocation refused"
                );
                return None;
            }
        }
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        live.insert(handle, size_bytes);
        Some(handle)
    }

    fn deallocate_raw(&self, handle: u64) {
        self.live().remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attributes_allow_retry() {
        assert!(AllocationAttributes::default().retry_on_failure);
    }

    #[test]
    fn tracks_live_bytes() {
        let alloc = HostAllocator::new("host");
        let a = alloc.allocate_raw(64, 128, AllocationAttributes::default()).unwrap();
        let b = alloc.allocate_raw(64, 256, AllocationAttributes::default()).unwrap();
        assert_ne!(a, b);
        assert_eq!(alloc.bytes_in_use(), 384);
        alloc.deallocate_raw(a);
        assert_eq!(alloc.bytes_in_use(), 256);
        assert_eq!(alloc.live_allocations(), 1);
    }

    #[test]
    fn refuses_past_limit() {
        let alloc = HostAllocator::new("small").with_limit(100);
        assert!(alloc.allocate_raw(8, 80, AllocationAttributes::default()).is_some());
        assert!(alloc.allocate_raw(8, 40, AllocationAttributes::default()).is_none());
    }

    #[test]
    fn rejects_non_power_of_two_alignment() {
        let alloc = HostAllocator::new("host");
        assert!(alloc.allocate_raw(3, 8, AllocationAttributes::default()).is_none());
    }

    #[test]
    fn bookkeeping_survives_poisoned_lock() {
        let alloc = Arc::new(HostAllocator::new("host"));
        let kept = alloc.allocate_raw(8, 64, AllocationAttributes::default()).unwrap();

        let poisoner = Arc::clone(&alloc);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.live.lock().unwrap();
            panic!("allocation callback failed");
        })
        .join();
        assert!(joined.is_err());
        assert!(alloc.live.is_poisoned());

        assert_eq!(alloc.bytes_in_use(), 64);
        assert_eq!(alloc.live_allocations(), 1);
        let extra = alloc.allocate_raw(8, 32, AllocationAttributes::default()).unwrap();
        assert_eq!(alloc.bytes_in_use(), 96);
        alloc.deallocate_raw(kept);
        alloc.deallocate_raw(extra);
        assert_eq!(alloc.live_allocations(), 0);
    }

    #[test]
    fn null_memory() {
        let mem = DeviceMemory::null(0);
        assert!(mem.is_null());
    }
}
