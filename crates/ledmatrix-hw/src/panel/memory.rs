//! Headless double-buffered panel.

use super::framebuffer::Framebuffer;
use super::surface::PanelSurface;
use crate::Result;
use tracing::debug;

/// In-memory panel used when no hardware driver is attached.
///
/// Writes go to the back buffer; [`PanelSurface::swap`] copies it to the
/// front buffer, which is what an observer of the panel "sees".
pub struct MemoryPanel {
    front: Framebuffer,
    back: Framebuffer,
    brightness: u8,
    frames: u64,
}

impl MemoryPanel {
    /// Creates a blank panel at full brightness.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        let front = Framebuffer::new(width, height)?;
        debug!("Created {}x{} memory panel", width, height);
        Ok(Self {
            back: front.clone(),
            front,
            brightness: 100,
            frames: 0,
        })
    }

    /// Returns the currently displayed buffer.
    pub fn front(&self) -> &Framebuffer {
        &self.front
    }

    /// Returns the buffer being drawn into.
    pub fn back(&self) -> &Framebuffer {
        &self.back
    }

    /// Returns the number of swaps performed.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl PanelSurface for MemoryPanel {
    fn width(&self) -> u16 {
        self.front.width()
    }

    fn height(&self) -> u16 {
        self.front.height()
    }

    fn set_pixel(&mut self, x: u16, y: u16, r: u8, g: u8, b: u8) {
        self.back.set_pixel(x, y, r, g, b);
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level.min(100);
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }

    fn swap(&mut self) {
        self.front.clone_from(&self.back);
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_visible_after_swap() {
        let mut panel = MemoryPanel::new(2, 2).unwrap();
        panel.set_pixel(1, 1, 10, 20, 30);
        assert_eq!(panel.front().get_pixel(1, 1), Some((0, 0, 0)));
        assert_eq!(panel.back().get_pixel(1, 1), Some((10, 20, 30)));

        panel.swap();
        assert_eq!(panel.front().get_pixel(1, 1), Some((10, 20, 30)));
        assert_eq!(panel.frames(), 1);
    }

    #[test]
    fn test_brightness_capped() {
        let mut panel = MemoryPanel::new(1, 1).unwrap();
        assert_eq!(panel.brightness(), 100);
        panel.set_brightness(40);
        assert_eq!(panel.brightness(), 40);
        panel.set_brightness(200);
        assert_eq!(panel.brightness(), 100);
    }
}
