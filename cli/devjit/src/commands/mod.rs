//! CLI command implementations.

pub mod platforms;
pub mod resolve;
pub mod visible_devices;
