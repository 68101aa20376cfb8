//! Common types used across the frontend application.

use std::fmt;

// =============================================================================
// Error Types
// =============================================================================

/// Frontend error type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    /// The host document has no usable element with this id.
    MountPoint(String),
    /// The shell was already mounted at this id.
    AlreadyMounted(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MountPoint(id) => write!(f, "Mount point error: no element #{}", id),
            AppError::AlreadyMounted(id) => write!(f, "Mount point error: #{} is already populated", id),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for frontend operations.
pub type AppResult<T> = Result<T, AppError>;
