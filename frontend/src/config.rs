//! Application configuration.

/// Id of the host element the shell is mounted into.
///
/// The host document (`index.html`) owns the element.
pub const MOUNT_POINT_ID: &str = "app";
