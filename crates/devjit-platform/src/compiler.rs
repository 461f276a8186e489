//! Per-device-type compiler handles.

use std::sync::Arc;

use devjit_device::{Client, DeviceType};

use crate::persistor::{ExecutablePersistor, PersistorConfig};

/// A compiler for one compilation device type.
///
/// Combines the executable persistence layer with the backend client used
/// to compile. The client is absent for host-offloaded TPU compilation,
/// where the consuming compilation layer supplies it later.
#[derive(Debug, Clone)]
pub struct DeviceCompiler {
    persistor: ExecutablePersistor,
    client: Option<Arc<Client>>,
}

impl DeviceCompiler {
    pub fn new(
        persistor_config: PersistorConfig,
        device_type: DeviceType,
        client: Option<Arc<Client>>,
    ) -> Self {
        Self {
            persistor: ExecutablePersistor::new(persistor_config, device_type),
            client,
        }
    }

    /// Compilation device type this compiler targets.
    pub fn device_type(&self) -> &DeviceType {
        self.persistor.device_type()
    }

    pub fn client(&self) -> Option<&Arc<Client>> {
        self.client.as_ref()
    }

    pub fn persistor(&self) -> &ExecutablePersistor {
        &self.persistor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clientless_compiler() {
        let compiler = DeviceCompiler::new(
            PersistorConfig::new("", false, "p"),
            DeviceType::new(DeviceType::TPU_XLA_JIT),
            None,
        );
        assert_eq!(compiler.device_type(), "TPU_XLA_JIT");
        assert!(compiler.client().is_none());
        assert_eq!(compiler.persistor().device_type(), "TPU_XLA_JIT");
    }
}
