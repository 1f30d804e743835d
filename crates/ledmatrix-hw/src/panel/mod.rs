//! Panel surface module.
//!
//! The display server only ever talks to a [`PanelSurface`]. Hardware drivers
//! live outside this crate; [`MemoryPanel`] is the headless implementation.

mod memory;
mod surface;

pub mod framebuffer;

pub use framebuffer::Framebuffer;
pub use memory::MemoryPanel;
pub use surface::PanelSurface;
