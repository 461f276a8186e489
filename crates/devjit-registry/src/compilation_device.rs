//! Device type to compilation device registrations.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use devjit_device::DeviceType;

use crate::error::{RegistryError, Result};

/// How work placed on a device type is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationDeviceRegistration {
    /// Compilation device type (e.g., "XLA_GPU_JIT").
    pub compilation_device_name: DeviceType,
    /// Whether clusters on this device are compiled automatically.
    pub autoclustering: bool,
}

impl CompilationDeviceRegistration {
    pub fn new(compilation_device_name: impl Into<String>) -> Self {
        Self {
            compilation_device_name: DeviceType::new(compilation_device_name),
            autoclustering: false,
        }
    }

    pub fn with_autoclustering(mut self, enabled: bool) -> Self {
        self.autoclustering = enabled;
        self
    }
}

/// Looks up the compilation device registered for a device type.
pub trait CompilationDeviceRegistry: Send + Sync {
    /// Registration for `device_type`, if one was made.
    fn compilation_device(&self, device_type: &str) -> Option<CompilationDeviceRegistration>;
}

/// In-process registration table. Registration fails on a poisoned lock;
/// lookups read through it.
#[derive(Debug, Default)]
pub struct CompilationDeviceTable {
    registrations: RwLock<BTreeMap<String, CompilationDeviceRegistration>>,
}

impl CompilationDeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the host and accelerator registrations every process links.
    pub fn with_defaults() -> Self {
        let defaults = [
            (DeviceType::CPU, CompilationDeviceRegistration::new(DeviceType::XLA_CPU_JIT)),
            (
                DeviceType::GPU,
                CompilationDeviceRegistration::new(DeviceType::XLA_GPU_JIT).with_autoclustering(true),
            ),
        ];
        let registrations = defaults
            .into_iter()
            .map(|(device_type, registration)| (device_type.to_string(), registration))
            .collect();
        Self {
            registrations: RwLock::new(registrations),
        }
    }

    /// Register or replace the compilation device for `device_type`.
    pub fn register(
        &self,
        device_type: impl Into<String>,
        registration: CompilationDeviceRegistration,
    ) -> Result<()> {
        let device_type = device_type.into();
        let mut registrations = self
            .registrations
            .write()
            .map_err(|_| RegistryError::Poisoned { registry: "compilation devices" })?;
        tracing::debug!(
            device_type = %device_type,
            compilation_device = %registration.compilation_device_name,
            "registered compilation device"
        );
        registrations.insert(device_type, registration);
        Ok(())
    }

    /// All registrations, ordered by device type.
    pub fn registrations(&self) -> Vec<(String, CompilationDeviceRegistration)> {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl CompilationDeviceRegistry for CompilationDeviceTable {
    fn compilation_device(&self, device_type: &str) -> Option<CompilationDeviceRegistration> {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_type)
            .cloned()
    }
}
