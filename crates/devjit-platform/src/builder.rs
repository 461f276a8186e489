//! Compiler construction.
//!
//! Resolution order for a device:
//! 1. backend metadata supplies the compilation device type and client;
//! 2. a TPU without metadata compiles as `TPU_XLA_JIT` with no client;
//! 3. otherwise the platform is discovered, a compiler must be linked for
//!    it, and a shared client is obtained for the device's options.
//!
//! Step 3 reports a missing compiler as [`JitError::Unimplemented`] so the
//! caller can run the work uncompiled instead of failing the whole cluster.

use devjit_device::{ClientOptions, Device, DeviceType};
use devjit_registry::{Backends, RegistryError};
use tracing::{debug, warn};

use crate::compiler::DeviceCompiler;
use crate::config::ConfigSource;
use crate::error::{JitError, Result};
use crate::flags::JitFlags;
use crate::persistor::PersistorConfig;
use crate::platform_info::{BackendBinding, DeviceClass, PlatformInfo};
use crate::visible_devices::allowed_devices;

/// Builds a [`DeviceCompiler`] for a device.
///
/// Every call returns a new compiler; reusing one per device type is up to
/// the caller.
#[derive(Debug, Clone)]
pub struct DeviceCompilerBuilder {
    backends: Backends,
    flags: JitFlags,
}

impl DeviceCompilerBuilder {
    pub fn new(backends: Backends, flags: JitFlags) -> Self {
        Self { backends, flags }
    }

    /// Builder over the production registries and process-wide flags.
    pub fn global() -> Self {
        Self::new(Backends::global(), JitFlags::global().clone())
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn flags(&self) -> &JitFlags {
        &self.flags
    }

    /// Resolve the compiler for `device`.
    ///
    /// `config` supplies the accelerator allow-list; a source without a
    /// session configuration leaves the client unrestricted.
    pub fn build(
        &self,
        device: &dyn Device,
        config: &dyn ConfigSource,
        info: &PlatformInfo,
    ) -> Result<DeviceCompiler> {
        let persistor_config = PersistorConfig::from_flags(&self.flags);

        match (info.backend(), info.device_class()) {
            (BackendBinding::BackendBound { metadata, .. }, _) => {
                debug!(
                    device = device.name(),
                    jit_device_type = %metadata.jit_device_type(),
                    "using backend-managed compiler"
                );
                Ok(DeviceCompiler::new(
                    persistor_config,
                    metadata.jit_device_type().clone(),
                    Some(metadata.client().clone()),
                ))
            }
            (BackendBinding::NoBackend, DeviceClass::TpuOffloaded) => {
                debug!(device = device.name(), "using host-offloaded TPU compiler");
                Ok(DeviceCompiler::new(
                    persistor_config,
                    DeviceType::new(DeviceType::TPU_XLA_JIT),
                    None,
                ))
            }
            (BackendBinding::NoBackend, _) => self.discover(device, config, info, persistor_config),
        }
    }

    fn discover(
        &self,
        device: &dyn Device,
        config: &dyn ConfigSource,
        info: &PlatformInfo,
        persistor_config: PersistorConfig,
    ) -> Result<DeviceCompiler> {
        let platform_id = info.platform_id().ok_or_else(|| JitError::NoPlatform {
            device_type: info.device_type().clone(),
        })?;
        let platform = self.backends.platforms.platform_with_id(platform_id)?;

        match self.backends.compilers.compiler_for_platform(platform.as_ref()) {
            Ok(compiler) => {
                debug!(platform = platform.name(), compiler = compiler.name(), "found compiler");
            }
            Err(err @ RegistryError::CompilerNotFound { .. }) => {
                warn!(
                    device = device.name(),
                    platform = platform.name(),
                    "no compiler linked for platform, compilation will be skipped"
                );
                return Err(JitError::Unimplemented {
                    message: format!(
                        "could not find compiler for platform {}: {err}",
                        platform.name()
                    ),
                });
            }
            Err(err) => return Err(err.into()),
        }

        let options = ClientOptions::new(platform.clone())
            .with_intra_op_parallelism_threads(device.intra_op_threads())
            .with_allowed_devices(allowed_devices(config)?);
        let client = self.backends.clients.get_or_create_client(&options)?;

        let registration = self
            .backends
            .devices
            .compilation_device(info.device_type().as_str())
            .ok_or_else(|| JitError::InvalidArgument {
                message: format!("no JIT device registered for {}", info.device_type()),
            })?;

        debug!(
            device = device.name(),
            platform = platform.name(),
            compilation_device = %registration.compilation_device_name,
            "built compiler from platform discovery"
        );
        Ok(DeviceCompiler::new(
            persistor_config,
            registration.compilation_device_name,
            Some(client),
        ))
    }
}

/// Build the compiler for `device` with [`DeviceCompilerBuilder::global`].
pub fn build_device_compiler(
    device: &dyn Device,
    config: &dyn ConfigSource,
    info: &PlatformInfo,
) -> Result<DeviceCompiler> {
    DeviceCompilerBuilder::global().build(device, config, info)
}
