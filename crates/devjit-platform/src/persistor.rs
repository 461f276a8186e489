//! Persistent executable cache configuration.
//!
//! The cache itself lives outside this crate. A compiler only carries the
//! configuration it hands to that cache.

use std::path::PathBuf;

use devjit_device::DeviceType;

use crate::flags::JitFlags;

/// Where and how compiled executables are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistorConfig {
    /// Cache directory. Empty disables persistence.
    pub cache_directory: PathBuf,
    pub disable_strict_signature_checks: bool,
    /// File-name prefix of every cache entry.
    pub cache_prefix: String,
}

impl PersistorConfig {
    pub fn new(
        cache_directory: impl Into<PathBuf>,
        disable_strict_signature_checks: bool,
        cache_prefix: impl Into<String>,
    ) -> Self {
        Self {
            cache_directory: cache_directory.into(),
            disable_strict_signature_checks,
            cache_prefix: cache_prefix.into(),
        }
    }

    /// Copy the persistence flags verbatim.
    pub fn from_flags(flags: &JitFlags) -> Self {
        Self::new(
            flags.persistent_cache_directory.clone(),
            flags.disable_strict_signature_checks,
            flags.persistent_cache_prefix.clone(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        !self.cache_directory.as_os_str().is_empty()
    }
}

/// Persistence layer of one compiler, scoped to its compilation device type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutablePersistor {
    config: PersistorConfig,
    device_type: DeviceType,
}

impl ExecutablePersistor {
    pub fn new(config: PersistorConfig, device_type: DeviceType) -> Self {
        Self {
            config,
            device_type,
        }
    }

    pub fn config(&self) -> &PersistorConfig {
        &self.config
    }

    /// Compilation device type entries are keyed under.
    pub fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    /// Whether loaded entries must match the requesting signature exactly.
    pub fn verifies_signatures(&self) -> bool {
        !self.config.disable_strict_signature_checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persistor(dir: &str) -> ExecutablePersistor {
        ExecutablePersistor::new(
            PersistorConfig::new(dir, false, "svc"),
            DeviceType::new(DeviceType::XLA_GPU_JIT),
        )
    }

    #[test]
    fn from_flags_copies_verbatim() {
        let flags = JitFlags {
            persistent_cache_directory: PathBuf::from("/cache"),
            disable_strict_signature_checks: true,
            persistent_cache_prefix: "pfx".into(),
        };
        let config = PersistorConfig::from_flags(&flags);
        assert_eq!(config, PersistorConfig::new("/cache", true, "pfx"));
        assert!(config.is_enabled());
    }

    #[test]
    fn empty_directory_disables_persistence() {
        let p = persistor("");
        assert!(!p.config().is_enabled());
        assert!(persistor("/cache").config().is_enabled());
    }

    #[test]
    fn strict_signature_checks_by_default() {
        assert!(persistor("/cache").verifies_signatures());
        let relaxed = ExecutablePersistor::new(
            PersistorConfig::new("/cache", true, "svc"),
            DeviceType::new(DeviceType::XLA_CPU_JIT),
        );
        assert!(!relaxed.verifies_signatures());
    }
}
