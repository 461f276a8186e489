//! Execution platform identity.
//!
//! A platform is a class of execution hardware (the host CPU, one
//! accelerator family). Platforms are looked up by [`PlatformId`], an opaque
//! identity that is cheap to copy and compare.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of an execution platform.
///
/// Derived deterministically from the platform name, so the same name always
/// yields the same id across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(u64);

impl PlatformId {
    /// Derive a platform id from a platform name (64-bit FNV-1a).
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            i += 1;
        }
        Self(hash)
    }

    /// Raw identity value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Name of the generic host platform.
pub const HOST_PLATFORM_NAME: &str = "Host";

/// Identity of the generic host platform.
pub const HOST_PLATFORM_ID: PlatformId = PlatformId::from_name(HOST_PLATFORM_NAME);

/// A class of execution hardware.
///
/// Object-safe so platforms can be shared as `Arc<dyn Platform>`.
pub trait Platform: fmt::Debug + Send + Sync {
    /// Identity used for lookups.
    fn id(&self) -> PlatformId;

    /// Human-readable platform name (e.g., "Host", "CUDA").
    fn name(&self) -> &str;

    /// Number of devices of this platform visible to the process.
    fn visible_device_count(&self) -> usize;
}

/// A platform described entirely by its name and device count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPlatform {
    id: PlatformId,
    name: String,
    device_count: usize,
}

impl StaticPlatform {
    /// Describe a platform; the id is derived from the name.
    pub fn new(name: impl Into<String>, device_count: usize) -> Self {
        let name = name.into();
        Self {
            id: PlatformId::from_name(&name),
            name,
            device_count,
        }
    }

    /// The generic host platform with a single device.
    pub fn host() -> Self {
        Self::new(HOST_PLATFORM_NAME, 1)
    }
}

impl Platform for StaticPlatform {
    fn id(&self) -> PlatformId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn visible_device_count(&self) -> usize {
        self.device_count
    }
}
