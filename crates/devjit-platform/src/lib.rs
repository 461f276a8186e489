//! Platform resolution and compiler construction for just-in-time compilation.
//!
//! Given a device handle, this crate decides which compilation backend
//! services it and builds a [`DeviceCompiler`] bound to the right platform,
//! client and allocator:
//!
//! 1. [`platform_info_from_device`] snapshots the device into a [`PlatformInfo`].
//! 2. [`DeviceCompilerBuilder::build`] resolves the compiler, falling back
//!    through backend metadata, host-offloaded TPU compilation and generic
//!    platform discovery.
//! 3. [`resolve_allocator`] picks the allocator compilation and execution
//!    steps allocate buffers through.
//!
//! Allow-lists of accelerator ordinals come from
//! [`parse_visible_device_list`].

pub mod allocator;
pub mod builder;
pub mod compiler;
pub mod config;
pub mod error;
pub mod flags;
pub mod persistor;
pub mod platform_info;
pub mod visible_devices;

pub use allocator::resolve_allocator;
pub use builder::{build_device_compiler, DeviceCompilerBuilder};
pub use compiler::DeviceCompiler;
pub use config::{ConfigSource, GpuOptions, SessionConfig};
pub use error::{JitError, Result};
pub use flags::JitFlags;
pub use persistor::{ExecutablePersistor, PersistorConfig};
pub use platform_info::{platform_info_from_device, BackendBinding, DeviceClass, PlatformInfo};
pub use visible_devices::{allowed_devices, parse_visible_device_list, AllowedDevices};
