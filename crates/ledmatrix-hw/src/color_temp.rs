//! Color temperature to RGB tint mapping.
//!
//! The calibration table spans [`MIN_KELVIN`, `MAX_KELVIN`] in equal steps.
//! Values between two entries are linearly interpolated per channel.

/// Lowest supported color temperature in Kelvin.
pub const MIN_KELVIN: u16 = 2000;

/// Highest supported color temperature in Kelvin.
pub const MAX_KELVIN: u16 = 6500;

/// Calibration colors from [`MIN_KELVIN`] (first) to [`MAX_KELVIN`] (last).
const CALIBRATION: [(u8, u8, u8); 48] = [
    (255, 138, 18),
    (255, 142, 33),
    (255, 147, 44),
    (255, 152, 54),
    (255, 157, 63),
    (255, 161, 72),
    (255, 165, 79),
    (255, 169, 87),
    (255, 173, 94),
    (255, 177, 101),
    (255, 180, 107),
    (255, 184, 114),
    (255, 187, 120),
    (255, 190, 126),
    (255, 193, 132),
    (255, 196, 137),
    (255, 199, 143),
    (255, 201, 148),
    (255, 204, 153),
    (255, 206, 159),
    (255, 209, 163),
    (255, 211, 168),
    (255, 213, 173),
    (255, 215, 177),
    (255, 217, 182),
    (255, 219, 186),
    (255, 221, 190),
    (255, 223, 194),
    (255, 225, 198),
    (255, 227, 202),
    (255, 228, 206),
    (255, 230, 210),
    (255, 232, 213),
    (255, 233, 217),
    (255, 235, 220),
    (255, 236, 224),
    (255, 238, 227),
    (255, 239, 230),
    (255, 240, 233),
    (255, 242, 236),
    (255, 243, 239),
    (255, 244, 242),
    (255, 245, 245),
    (255, 246, 247),
    (255, 248, 251),
    (255, 249, 253),
    (254, 252, 255),
    (255, 255, 255),
];

/// Per-channel multiplicative correction (255 = channel unchanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorTint {
    /// No correction.
    pub const WHITE: ColorTint = ColorTint {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Creates a tint from channel factors.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Applies the tint to a color (`channel * factor / 255`, truncating).
    #[inline]
    pub fn apply(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        (scale(r, self.r), scale(g, self.g), scale(b, self.b))
    }
}

impl Default for ColorTint {
    fn default() -> Self {
        Self::WHITE
    }
}

#[inline]
fn scale(channel: u8, factor: u8) -> u8 {
    (channel as u16 * factor as u16 / 255) as u8
}

/// Returns true if `kelvin` lies within the calibrated range.
pub fn is_valid(kelvin: u16) -> bool {
    (MIN_KELVIN..=MAX_KELVIN).contains(&kelvin)
}

/// Maps a color temperature to its tint.
///
/// Callers must reject values outside [`MIN_KELVIN`, `MAX_KELVIN`] first;
/// out-of-range input is clamped here so the lookup stays in bounds.
pub fn tint(kelvin: u16) -> ColorTint {
    let kelvin = kelvin.clamp(MIN_KELVIN, MAX_KELVIN);
    let last = CALIBRATION.len() - 1;

    let fraction = f32::from(kelvin - MIN_KELVIN) / f32::from(MAX_KELVIN - MIN_KELVIN);
    let scaled = fraction * last as f32;

    let mut index = scaled.floor() as usize;
    let mut weight = scaled - index as f32;
    if index >= last {
        index = last;
        weight = 0.0;
    }
    let next = (index + 1).min(last);

    let (ra, ga, ba) = CALIBRATION[index];
    let (rb, gb, bb) = CALIBRATION[next];

    ColorTint {
        r: lerp(ra, rb, weight),
        g: lerp(ga, gb, weight),
        b: lerp(ba, bb, weight),
    }
}

#[inline]
fn lerp(a: u8, b: u8, t: f32) -> u8 {
    let value = f32::from(a) * (1.0 - t) + f32::from(b) * t;
    value.round().clamp(0.0, 255.0) as u8
}
