//! Error types for device primitive operations.

/// Errors that can occur while working with devices, streams and allocators.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The allocator could not satisfy a request.
    #[error("out of memory while trying to allocate {size_bytes} bytes from '{allocator}'")]
    ResourceExhausted {
        /// Allocator that refused the request.
        allocator: String,
        /// Requested size.
        size_bytes: u64,
    },

    /// A backend allocator was asked for a stream but none is bound.
    #[error("no stream bound to allocator for device ordinal {ordinal}")]
    NoStream {
        /// Requested device ordinal.
        ordinal: i32,
    },

    /// A request named a device ordinal other than the one the stream serves.
    #[error("device ordinal mismatch: stream serves {expected}, request was for {actual}")]
    OrdinalMismatch {
        /// Ordinal of the bound stream.
        expected: i32,
        /// Ordinal named by the caller.
        actual: i32,
    },

    /// An accelerator device has no execution stream bound yet.
    #[error("accelerator device '{device}' has no bound execution stream")]
    NoAcceleratorStream {
        /// Device name.
        device: String,
    },

    /// Backend metadata exists but could not be read.
    #[error("backend metadata lookup failed for '{device}': {detail}")]
    MetadataLookup {
        /// Device name.
        device: String,
        /// Description of the failure.
        detail: String,
    },
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
