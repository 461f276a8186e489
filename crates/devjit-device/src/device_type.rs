//! Device type tags.
//!
//! A [`DeviceType`] is the string tag a runtime attaches to a device
//! (`"CPU"`, `"GPU"`, ...). Compilation device types (`"XLA_CPU_JIT"`, ...)
//! use the same representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A device type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceType(String);

impl DeviceType {
    /// Plain host compute device.
    pub const CPU: &'static str = "CPU";
    /// Plain accelerator compute device.
    pub const GPU: &'static str = "GPU";
    /// TPU-class device.
    pub const TPU: &'static str = "TPU";
    /// Compilation device type used for host-offloaded TPU compilation.
    pub const TPU_XLA_JIT: &'static str = "TPU_XLA_JIT";
    /// Compilation device type registered for [`DeviceType::CPU`].
    pub const XLA_CPU_JIT: &'static str = "XLA_CPU_JIT";
    /// Compilation device type registered for [`DeviceType::GPU`].
    pub const XLA_GPU_JIT: &'static str = "XLA_GPU_JIT";

    /// Create a device type from its tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_cpu(&self) -> bool {
        self.0 == Self::CPU
    }

    pub fn is_gpu(&self) -> bool {
        self.0 == Self::GPU
    }

    pub fn is_tpu(&self) -> bool {
        self.0 == Self::TPU
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl PartialEq<str> for DeviceType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DeviceType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
