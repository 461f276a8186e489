//! The collaborator bundle handed to the compiler builder.

use std::fmt;
use std::sync::Arc;

use devjit_device::{Platform, StaticPlatform, HOST_PLATFORM_ID};
use once_cell::sync::Lazy;

use crate::client::{ClientRegistry, LocalClientRegistry};
use crate::compilation_device::{CompilationDeviceRegistry, CompilationDeviceTable};
use crate::compiler::{CompilerImpl, CompilerRegistry, CompilerTable, StaticCompiler};
use crate::platform_manager::{PlatformManager, PlatformTable};

/// One instance of every registry the compiler builder consults.
#[derive(Clone)]
pub struct Backends {
    pub platforms: Arc<dyn PlatformManager>,
    pub compilers: Arc<dyn CompilerRegistry>,
    pub clients: Arc<dyn ClientRegistry>,
    pub devices: Arc<dyn CompilationDeviceRegistry>,
}

impl Backends {
    /// The process-wide production wiring.
    pub fn global() -> Backends {
        production().backends()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

/// Concrete production registries, exposed so callers can register
/// additional platforms, compilers and compilation devices.
#[derive(Debug)]
pub struct ProductionRegistries {
    pub platforms: Arc<PlatformTable>,
    pub compilers: Arc<CompilerTable>,
    pub clients: Arc<LocalClientRegistry>,
    pub devices: Arc<CompilationDeviceTable>,
}

impl ProductionRegistries {
    /// Registries with the host platform, the host compiler and the default
    /// compilation devices.
    pub fn with_host() -> Self {
        let host: Arc<dyn Platform> = Arc::new(StaticPlatform::host());
        let cpu: Arc<dyn CompilerImpl> = Arc::new(StaticCompiler::new("cpu", HOST_PLATFORM_ID));
        let platforms: PlatformTable = [host].into_iter().collect();
        let compilers: CompilerTable = [cpu].into_iter().collect();
        Self {
            platforms: Arc::new(platforms),
            compilers: Arc::new(compilers),
            clients: Arc::new(LocalClientRegistry::host_backed()),
            devices: Arc::new(CompilationDeviceTable::with_defaults()),
        }
    }

    /// View the registries as a [`Backends`] bundle.
    pub fn backends(&self) -> Backends {
        Backends {
            platforms: self.platforms.clone(),
            compilers: self.compilers.clone(),
            clients: self.clients.clone(),
            devices: self.devices.clone(),
        }
    }
}

static PRODUCTION: Lazy<ProductionRegistries> = Lazy::new(ProductionRegistries::with_host);

/// Process-wide production registries.
pub fn production() -> &'static ProductionRegistries {
    &PRODUCTION
}

#[cfg(test)]
mod tests {
    use super::*;
    use devjit_device::{ClientOptions, PlatformId};

    use crate::error::RegistryError;

    #[test]
    fn host_wiring_resolves_host_platform_and_compiler() {
        let registries = ProductionRegistries::with_host();
        let backends = registries.backends();
        let host = backends.platforms.platform_with_id(HOST_PLATFORM_ID).unwrap();
        assert_eq!(host.name(), "Host");
        let compiler = backends.compilers.compiler_for_platform(host.as_ref()).unwrap();
        assert_eq!(compiler.name(), "cpu");
        assert!(backends.devices.compilation_device("CPU").is_some());
    }

    #[test]
    fn host_wiring_accepts_further_registrations() {
        let registries = ProductionRegistries::with_host();
        assert_eq!(registries.platforms.len(), 1);
        assert!(registries.compilers.has_compiler(HOST_PLATFORM_ID));
        assert!(!registries.compilers.has_compiler(PlatformId::from_name("CUDA")));

        let err = registries
            .platforms
            .register(Arc::new(StaticPlatform::host()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePlatform { .. }));
        registries
            .platforms
            .register(Arc::new(StaticPlatform::new("CUDA", 2)))
            .unwrap();
        assert_eq!(registries.platforms.len(), 2);
    }

    #[test]
    fn backends_share_underlying_tables() {
        let registries = ProductionRegistries::with_host();
        let backends = registries.backends();
        let host: Arc<dyn Platform> = Arc::new(StaticPlatform::host());
        backends
            .clients
            .get_or_create_client(&ClientOptions::new(host))
            .unwrap();
        assert_eq!(registries.clients.len(), 1);
    }

    #[test]
    fn global_is_a_single_instance() {
        assert!(std::ptr::eq(production(), production()));
        let backends = Backends::global();
        assert!(backends.platforms.platform_with_id(HOST_PLATFORM_ID).is_ok());
    }
}
