//! RGB888 framebuffer backing the in-memory panel.

use crate::{Error, Result};

/// Row-major RGB888 pixel grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    /// Pixel data as `[r, g, b]` triples.
    data: Vec<[u8; 3]>,
    /// Width of the framebuffer.
    width: u16,
    /// Height of the framebuffer.
    height: u16,
}

impl Framebuffer {
    /// Creates a framebuffer initialized to black.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGeometry {
                width: width.into(),
                height: height.into(),
            });
        }
        Ok(Self {
            data: vec![[0; 3]; width as usize * height as usize],
            width,
            height,
        })
    }

    /// Returns the width of the framebuffer.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns the height of the framebuffer.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns the raw pixel data.
    pub fn data(&self) -> &[[u8; 3]] {
        &self.data
    }

    /// Clears the framebuffer to a solid color.
    pub fn clear(&mut self, r: u8, g: u8, b: u8) {
        self.data.fill([r, g, b]);
    }

    /// Sets a pixel at the given coordinates.
    pub fn set_pixel(&mut self, x: u16, y: u16, r: u8, g: u8, b: u8) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.data[idx] = [r, g, b];
        }
    }

    /// Gets a pixel at the given coordinates.
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<(u8, u8, u8)> {
        if x < self.width && y < self.height {
            let [r, g, b] = self.data[y as usize * self.width as usize + x as usize];
            Some((r, g, b))
        } else {
            None
        }
    }
}
