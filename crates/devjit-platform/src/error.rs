//! Errors raised while resolving platforms and building compilers.

use devjit_device::{DeviceError, DeviceType};
use devjit_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur while resolving a device's compiler.
#[derive(Debug, Error)]
pub enum JitError {
    /// Malformed configuration value or unregistered device type.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No compiler is linked for the resolved platform.
    ///
    /// Callers may recover by running the work without compilation.
    #[error("unimplemented: {message}")]
    Unimplemented { message: String },

    /// The device resolved to no platform at all.
    #[error("no platform resolvable for device type '{device_type}'")]
    NoPlatform { device_type: DeviceType },

    /// Malformed process flag.
    #[error("invalid flag {name}: {detail}")]
    Config { name: String, detail: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl JitError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, JitError::InvalidArgument { .. })
    }

    /// Whether the caller should skip compilation rather than fail.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, JitError::Unimplemented { .. })
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, JitError>;
