//! Error types for the device module.

use lectern_storage::StorageError;
use thiserror::Error;

/// Device identity errors.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The durable store could not be read or written.
    #[error("device storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
