//! Frame pixel layouts and gamma correction.
//!
//! A deployment pins exactly one layout; frames are raw, row-major,
//! tightly packed pixels in that layout with no header.

use crate::{Error, Result};
use std::str::FromStr;

/// Byte layout of one pixel in an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 32-bit little-endian word, R in the lowest byte: `[R, G, B, A]`.
    #[default]
    Rgba32,
    /// 32-bit with blue first: `[B, G, R, A]`.
    Bgra32,
    /// Packed 24-bit: `[R, G, B]`.
    Rgb24,
    /// Packed 24-bit with blue first: `[B, G, R]`.
    Bgr24,
}

impl PixelFormat {
    /// Returns the number of bytes one pixel occupies.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba32 | PixelFormat::Bgra32 => 4,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
        }
    }

    /// Decodes one pixel. `bytes` must hold at least `bytes_per_pixel()` bytes.
    #[inline]
    pub fn decode(&self, bytes: &[u8]) -> (u8, u8, u8) {
        match self {
            PixelFormat::Rgba32 | PixelFormat::Rgb24 => (bytes[0], bytes[1], bytes[2]),
            PixelFormat::Bgra32 | PixelFormat::Bgr24 => (bytes[2], bytes[1], bytes[0]),
        }
    }

    /// Appends one pixel in this layout. Alpha is written opaque.
    pub fn encode_into(&self, r: u8, g: u8, b: u8, out: &mut Vec<u8>) {
        match self {
            PixelFormat::Rgba32 => out.extend_from_slice(&[r, g, b, 0xFF]),
            PixelFormat::Bgra32 => out.extend_from_slice(&[b, g, r, 0xFF]),
            PixelFormat::Rgb24 => out.extend_from_slice(&[r, g, b]),
            PixelFormat::Bgr24 => out.extend_from_slice(&[b, g, r]),
        }
    }

    /// Returns the frame length for a panel of the given size.
    pub fn frame_len(&self, width: u16, height: u16) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rgba32" | "rgba" => Ok(PixelFormat::Rgba32),
            "bgra32" | "bgra" => Ok(PixelFormat::Bgra32),
            "rgb24" | "rgb" => Ok(PixelFormat::Rgb24),
            "bgr24" | "bgr" => Ok(PixelFormat::Bgr24),
            _ => Err(Error::InvalidPixelFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Rgba32 => write!(f, "rgba32"),
            PixelFormat::Bgra32 => write!(f, "bgra32"),
            PixelFormat::Rgb24 => write!(f, "rgb24"),
            PixelFormat::Bgr24 => write!(f, "bgr24"),
        }
    }
}

/// Gamma exponent used for raw LED drivers without luminance correction.
pub const GAMMA: f32 = 2.2;

/// Precomputed `(c / 255)^2.2 * 255` for every channel value.
#[derive(Clone)]
pub struct GammaTable {
    lut: [u8; 256],
}

impl GammaTable {
    /// Builds the lookup table for [`GAMMA`].
    pub fn new() -> Self {
        let mut lut = [0u8; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = ((i as f32 / 255.0).powf(GAMMA) * 255.0) as u8;
        }
        Self { lut }
    }

    /// Corrects a single channel.
    #[inline]
    pub fn correct(&self, channel: u8) -> u8 {
        self.lut[channel as usize]
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::new()
    }
}
