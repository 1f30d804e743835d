//! LED Matrix Hardware Library
//!
//! Provides the panel surface abstraction the display server renders into,
//! the pixel layouts frames arrive in, and the color corrections (gamma and
//! color temperature) applied on the way to the panel.

pub mod color_temp;
pub mod error;
pub mod panel;
pub mod pixel;

pub use color_temp::ColorTint;
pub use error::{Error, Result};
pub use panel::{Framebuffer, MemoryPanel, PanelSurface};
pub use pixel::{GammaTable, PixelFormat};

/// Default panel rows.
pub const DEFAULT_ROWS: u16 = 32;

/// Default panel columns.
pub const DEFAULT_COLS: u16 = 32;
