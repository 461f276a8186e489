//! Compiler implementations linked into the process, keyed by platform.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use devjit_device::{Platform, PlatformId};

use crate::error::{RegistryError, Result};

/// A compiler implementation able to target one platform.
pub trait CompilerImpl: fmt::Debug + Send + Sync {
    /// Compiler name (e.g., "cpu", "gpu").
    fn name(&self) -> &str;

    /// Platform this compiler targets.
    fn platform_id(&self) -> PlatformId;
}

/// A compiler implementation known only by name and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCompiler {
    name: String,
    platform_id: PlatformId,
}

impl StaticCompiler {
    pub fn new(name: impl Into<String>, platform_id: PlatformId) -> Self {
        Self {
            name: name.into(),
            platform_id,
        }
    }
}

impl CompilerImpl for StaticCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn platform_id(&self) -> PlatformId {
        self.platform_id
    }
}

/// Finds the compiler implementation for a platform.
pub trait CompilerRegistry: Send + Sync {
    /// Compiler linked for `platform`.
    ///
    /// Returns [`RegistryError::CompilerNotFound`] when none is linked.
    fn compiler_for_platform(&self, platform: &dyn Platform) -> Result<Arc<dyn CompilerImpl>>;
}

/// In-process compiler table. Poisoning follows [`PlatformTable`]:
/// registration fails, lookups read through.
///
/// [`PlatformTable`]: crate::PlatformTable
#[derive(Debug, Default)]
pub struct CompilerTable {
    compilers: RwLock<BTreeMap<PlatformId, Arc<dyn CompilerImpl>>>,
}

impl CompilerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiler, replacing any previous one for the same platform.
    pub fn register(&self, compiler: Arc<dyn CompilerImpl>) -> Result<()> {
        let mut compilers = self
            .compilers
            .write()
            .map_err(|_| RegistryError::Poisoned { registry: "compilers" })?;
        tracing::debug!(compiler = compiler.name(), platform = %compiler.platform_id(), "registered compiler");
        compilers.insert(compiler.platform_id(), compiler);
        Ok(())
    }

    /// Whether a compiler is linked for `id`.
    pub fn has_compiler(&self, id: PlatformId) -> bool {
        self.compilers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }
}

/// Collects a table up front. A later compiler for the same platform
/// replaces the earlier one, as with [`CompilerTable::register`].
impl FromIterator<Arc<dyn CompilerImpl>> for CompilerTable {
    fn from_iter<I: IntoIterator<Item = Arc<dyn CompilerImpl>>>(iter: I) -> Self {
        let compilers = iter.into_iter().map(|c| (c.platform_id(), c)).collect();
        Self {
            compilers: RwLock::new(compilers),
        }
    }
}

impl CompilerRegistry for CompilerTable {
    fn compiler_for_platform(&self, platform: &dyn Platform) -> Result<Arc<dyn CompilerImpl>> {
        self.compilers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&platform.id())
            .cloned()
            .ok_or_else(|| RegistryError::CompilerNotFound {
                platform: platform.name().to_string(),
            })
    }
}
