//! Panel surface trait.

/// A render target exposing per-pixel writes, a global brightness and a
/// buffer swap.
///
/// Pixel writes land in a back buffer that becomes visible on [`swap`].
/// Implementations are driven from one thread at a time; callers serialize
/// access with their own lock.
///
/// [`swap`]: PanelSurface::swap
pub trait PanelSurface: Send {
    /// Panel width in pixels.
    fn width(&self) -> u16;

    /// Panel height in pixels.
    fn height(&self) -> u16;

    /// Writes one pixel to the back buffer. Out-of-bounds writes are ignored.
    fn set_pixel(&mut self, x: u16, y: u16, r: u8, g: u8, b: u8);

    /// Sets the hardware brightness level (0-100).
    fn set_brightness(&mut self, level: u8);

    /// Returns the hardware brightness level last set.
    fn brightness(&self) -> u8;

    /// Publishes the back buffer (on vertical sync where supported).
    fn swap(&mut self);
}
