//! Registry error types.

use devjit_device::{DeviceError, PlatformId};

/// Errors that can occur during registry lookups.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No platform is registered under this id.
    #[error("platform {id} not found")]
    PlatformNotFound { id: PlatformId },

    /// A platform with this name or id is already registered.
    #[error("platform '{name}' already registered")]
    DuplicatePlatform { name: String },

    /// No compiler implementation is linked for the platform.
    #[error("no compiler registered for platform '{platform}'")]
    CompilerNotFound { platform: String },

    /// The compiler registry failed for a reason other than absence.
    #[error("compiler lookup failed for platform '{platform}': {detail}")]
    CompilerLookup { platform: String, detail: String },

    /// A client could not be created.
    #[error("client creation failed for platform '{platform}': {detail}")]
    ClientCreation { platform: String, detail: String },

    /// A registry lock was poisoned by a panicking writer.
    #[error("registry '{registry}' is poisoned")]
    Poisoned { registry: &'static str },

    /// Device primitive failure surfaced while building a registry object.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

impl RegistryError {
    /// Whether this error means "nothing registered" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::PlatformNotFound { .. } | RegistryError::CompilerNotFound { .. }
        )
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
