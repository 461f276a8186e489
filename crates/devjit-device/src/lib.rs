//! Device primitives consumed by the devjit compiler resolver.
//!
//! The resolver never owns hardware. It sees devices, platforms, streams and
//! allocators only through the traits defined here:
//! - **Platform:** a class of execution hardware, identified by [`PlatformId`]
//! - **Stream:** an execution queue bound to one device of a platform
//! - **Allocator:** a generic device allocator and the backend-facing
//!   [`DeviceMemoryAllocator`] interface, bridged by [`AllocatorAdapter`]
//! - **Client:** a backend compilation client created for a platform
//! - **Device:** the handle a caller passes in, optionally carrying
//!   [`BackendMetadata`] when a backend already manages it

pub mod adapter;
pub mod client;
pub mod device;
pub mod device_type;
pub mod error;
pub mod memory;
pub mod platform;
pub mod stream;

pub use adapter::{AllocatorAdapter, BACKEND_BUFFER_ALIGNMENT};
pub use client::{Client, ClientKey, ClientOptions};
pub use device::{BackendMetadata, Device, DeviceHandle};
pub use device_type::DeviceType;
pub use error::{DeviceError, Result};
pub use memory::{AllocationAttributes, Allocator, DeviceMemory, DeviceMemoryAllocator, HostAllocator};
pub use platform::{Platform, PlatformId, StaticPlatform, HOST_PLATFORM_ID, HOST_PLATFORM_NAME};
pub use stream::{BoundStream, Stream};
