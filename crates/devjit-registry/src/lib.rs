//! Registries the devjit compiler resolver consults.
//!
//! Every registry is a trait so callers can inject fakes; the
//! production implementations are in-process tables guarded by locks.
//!
//! # Registries
//!
//! - **Platforms** ([`PlatformManager`]): platform id to platform object
//! - **Compilers** ([`CompilerRegistry`]): which platforms have a compiler linked
//! - **Clients** ([`ClientRegistry`]): get-or-create clients keyed by options
//! - **Compilation devices** ([`CompilationDeviceRegistry`]): device type to
//!   compilation device type
//!
//! [`Backends`] bundles one of each. [`Backends::global`] is the
//! process-wide production wiring.

pub mod backends;
pub mod client;
pub mod compilation_device;
pub mod compiler;
pub mod error;
pub mod platform_manager;

pub use backends::{production, Backends, ProductionRegistries};
pub use client::{ClientFactory, ClientRegistry, LocalClientRegistry};
pub use compilation_device::{
    CompilationDeviceRegistration, CompilationDeviceRegistry, CompilationDeviceTable,
};
pub use compiler::{CompilerImpl, CompilerRegistry, CompilerTable, StaticCompiler};
pub use error::{RegistryError, Result};
pub use platform_manager::{PlatformManager, PlatformTable};
