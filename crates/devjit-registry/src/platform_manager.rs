//! Platform lookup by id.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use devjit_device::{Platform, PlatformId};

use crate::error::{RegistryError, Result};

/// Resolves platform ids to platform objects.
pub trait PlatformManager: Send + Sync {
    /// Look up a registered platform.
    fn platform_with_id(&self, id: PlatformId) -> Result<Arc<dyn Platform>>;

    /// All registered platforms, ordered by name.
    fn platforms(&self) -> Vec<Arc<dyn Platform>>;
}

/// In-process platform table.
///
/// Registration refuses a poisoned table with [`RegistryError::Poisoned`].
/// Lookups read through the poison, since every write is a single insert.
#[derive(Debug, Default)]
pub struct PlatformTable {
    platforms: RwLock<BTreeMap<PlatformId, Arc<dyn Platform>>>,
}

impl PlatformTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a platform. Registering the same id twice is an error.
    pub fn register(&self, platform: Arc<dyn Platform>) -> Result<()> {
        let mut platforms = self
            .platforms
            .write()
            .map_err(|_| RegistryError::Poisoned { registry: "platforms" })?;
        if platforms.contains_key(&platform.id()) {
            return Err(RegistryError::DuplicatePlatform {
                name: platform.name().to_string(),
            });
        }
        tracing::debug!(platform = platform.name(), id = %platform.id(), "registered platform");
        platforms.insert(platform.id(), platform);
        Ok(())
    }

    /// Number of registered platforms.
    pub fn len(&self) -> usize {
        self.platforms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects a table up front. A later platform with the same id replaces
/// the earlier one.
impl FromIterator<Arc<dyn Platform>> for PlatformTable {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Platform>>>(iter: I) -> Self {
        let platforms = iter.into_iter().map(|p| (p.id(), p)).collect();
        Self {
            platforms: RwLock::new(platforms),
        }
    }
}

impl PlatformManager for PlatformTable {
    fn platform_with_id(&self, id: PlatformId) -> Result<Arc<dyn Platform>> {
        self.platforms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(RegistryError::PlatformNotFound { id })
    }

    fn platforms(&self) -> Vec<Arc<dyn Platform>> {
        let mut all: Vec<_> = self
            .platforms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devjit_device::{StaticPlatform, HOST_PLATFORM_ID};

    #[test]
    fn register_and_lookup() {
        let table = PlatformTable::new();
        assert!(table.is_empty());
        table.register(Arc::new(StaticPlatform::host())).unwrap();
        let host = table.platform_with_id(HOST_PLATFORM_ID).unwrap();
        assert_eq!(host.name(), "Host");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let table = PlatformTable::new();
        let err = table
            .platform_with_id(PlatformId::from_name("CUDA"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::PlatformNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let table = PlatformTable::new();
        table.register(Arc::new(StaticPlatform::new("CUDA", 2))).unwrap();
        let err = table
            .register(Arc::new(StaticPlatform::new("CUDA", 4)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePlatform { ref name } if name == "CUDA"));
    }

    #[test]
    fn collected_table_keeps_last_duplicate() {
        let table: PlatformTable = [
            Arc::new(StaticPlatform::host()) as Arc<dyn Platform>,
            Arc::new(StaticPlatform::new("CUDA", 2)),
            Arc::new(StaticPlatform::new("CUDA", 4)),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.len(), 2);
        let cuda = table.platform_with_id(PlatformId::from_name("CUDA")).unwrap();
        assert_eq!(cuda.visible_device_count(), 4);
    }

    #[test]
    fn poisoned_table_still_answers_lookups() {
        let table = Arc::new(PlatformTable::new());
        table.register(Arc::new(StaticPlatform::host())).unwrap();

        let writer = Arc::clone(&table);
        let joined = std::thread::spawn(move || {
            let _guard = writer.platforms.write().unwrap();
            panic!("platform plugin failed to initialize");
        })
        .join();
        assert!(joined.is_err());

        assert_eq!(table.len(), 1);
        assert_eq!(table.platforms().len(), 1);
        assert_eq!(table.platform_with_id(HOST_PLATFORM_ID).unwrap().name(), "Host");
        let err = table
            .register(Arc::new(StaticPlatform::new("CUDA", 2)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Poisoned { registry: "platforms" }));
    }

    #[test]
    fn platforms_sorted_by_name() {
        let table = PlatformTable::new();
        table.register(Arc::new(StaticPlatform::new("ROCM", 1))).unwrap();
        table.register(Arc::new(StaticPlatform::new("CUDA", 1))).unwrap();
        table.register(Arc::new(StaticPlatform::host())).unwrap();
        let names: Vec<String> = table
            .platforms()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["CUDA", "Host", "ROCM"]);
    }
}
