//! Execution streams.

use std::fmt;
use std::sync::Arc;

use crate::platform::Platform;

/// An execution queue bound to one device of a platform.
pub trait Stream: fmt::Debug + Send + Sync {
    /// Platform owning the device this stream executes on.
    fn platform(&self) -> Arc<dyn Platform>;

    /// Ordinal of the device within its platform.
    fn device_ordinal(&self) -> i32;
}

/// A stream that only records which device it is bound to.
#[derive(Debug, Clone)]
pub struct BoundStream {
    platform: Arc<dyn Platform>,
    ordinal: i32,
}

impl BoundStream {
    /// Bind a stream to device `ordinal` of `platform`.
    pub fn new(platform: Arc<dyn Platform>, ordinal: i32) -> Self {
        Self { platform, ordinal }
    }
}

impl Stream for BoundStream {
    fn platform(&self) -> Arc<dyn Platform> {
        Arc::clone(&self.platform)
    }

    fn device_ordinal(&self) -> i32 {
        self.ordinal
    }
}
