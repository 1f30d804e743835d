//! Error types for the LED matrix hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when configuring or driving a panel.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown pixel format name.
    #[error("Invalid pixel format: {0}")]
    InvalidPixelFormat(String),

    /// Panel geometry with a zero dimension.
    #[error("Invalid panel geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
}
