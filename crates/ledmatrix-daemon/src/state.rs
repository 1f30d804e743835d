//! Shared device state.
//!
//! One [`Device`] is created at startup and shared by the frame and control
//! workers. Brightness, color temperature, the derived tint, the retained
//! frame and the panel itself all sit behind a single mutex, so a frame is
//! always rendered with one consistent tint and a control operation never
//! interleaves with a render.

use ledmatrix_hw::color_temp::{self, MAX_KELVIN};
use ledmatrix_hw::{ColorTint, GammaTable, PanelSurface, PixelFormat};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

/// Highest accepted brightness percentage.
pub const MAX_BRIGHTNESS_PERCENT: u8 = 100;

/// Display geometry, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
    pub format: PixelFormat,
}

impl Geometry {
    pub fn new(width: u16, height: u16, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    /// Bytes per pixel of the configured layout.
    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Exact byte length of a valid frame.
    pub fn frame_len(&self) -> usize {
        self.format.frame_len(self.width, self.height)
    }
}

/// Rejected device operations. None of these change state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("brightness {0}% outside 0-100%")]
    BrightnessOutOfRange(u8),

    #[error("temperature {0}K outside 2000-6500K")]
    TemperatureOutOfRange(u16),

    #[error("frame of {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("panel is {actual_width}x{actual_height}, display configured as {width}x{height}")]
    PanelGeometry {
        width: u16,
        height: u16,
        actual_width: u16,
        actual_height: u16,
    },
}

/// Everything guarded by the device lock.
struct DeviceState<P> {
    /// Requested brightness percentage (before the ceiling is applied).
    brightness: u8,
    /// Color temperature in Kelvin.
    temperature: u16,
    /// Always `color_temp::tint(temperature)`.
    tint: ColorTint,
    /// Most recently accepted frame.
    frame: Vec<u8>,
    panel: P,
}

/// The display device shared by both workers.
pub struct Device<P> {
    geometry: Geometry,
    max_brightness: u8,
    gamma: Option<GammaTable>,
    state: Mutex<DeviceState<P>>,
}

impl<P: PanelSurface> Device<P> {
    /// Creates the device at full brightness and the coldest temperature,
    /// pushing the initial brightness to the panel.
    pub fn new(
        geometry: Geometry,
        max_brightness: u8,
        gamma: bool,
        mut panel: P,
    ) -> Result<Self, StateError> {
        if panel.width() != geometry.width || panel.height() != geometry.height {
            return Err(StateError::PanelGeometry {
                width: geometry.width,
                height: geometry.height,
                actual_width: panel.width(),
                actual_height: panel.height(),
            });
        }

        let max_brightness = max_brightness.min(MAX_BRIGHTNESS_PERCENT);
        panel.set_brightness(max_brightness);

        Ok(Self {
            geometry,
            max_brightness,
            gamma: gamma.then(GammaTable::new),
            state: Mutex::new(DeviceState {
                brightness: MAX_BRIGHTNESS_PERCENT,
                temperature: MAX_KELVIN,
                tint: color_temp::tint(MAX_KELVIN),
                frame: vec![0; geometry.frame_len()],
                panel,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState<P>> {
        // A panicked worker must not take the other one down with it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the display geometry. Needs no lock.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns the configured brightness ceiling.
    pub fn max_brightness(&self) -> u8 {
        self.max_brightness
    }

    /// Returns the requested brightness percentage.
    pub fn brightness(&self) -> u8 {
        self.lock().brightness
    }

    /// Sets brightness as a percentage of the ceiling.
    pub fn set_brightness(&self, percent: u8) -> Result<(), StateError> {
        if percent > MAX_BRIGHTNESS_PERCENT {
            return Err(StateError::BrightnessOutOfRange(percent));
        }
        let level = (percent as u16 * self.max_brightness as u16 / 100) as u8;

        let mut state = self.lock();
        state.panel.set_brightness(level);
        state.brightness = percent;
        debug!("Panel brightness level {} ({}%)", level, percent);
        Ok(())
    }

    /// Returns the color temperature in Kelvin.
    pub fn temperature(&self) -> u16 {
        self.lock().temperature
    }

    /// Returns the tint currently applied to frames.
    pub fn tint(&self) -> ColorTint {
        self.lock().tint
    }

    /// Sets the color temperature and re-renders the retained frame with the
    /// new tint, all in one critical section.
    pub fn set_temperature(&self, kelvin: u16) -> Result<(), StateError> {
        if !color_temp::is_valid(kelvin) {
            return Err(StateError::TemperatureOutOfRange(kelvin));
        }
        let tint = color_temp::tint(kelvin);

        let mut state = self.lock();
        state.temperature = kelvin;
        state.tint = tint;
        self.render(&mut state);
        debug!("Tint for {}K is {:?}", kelvin, tint);
        Ok(())
    }

    /// Validates a raw frame and, if it has the expected size, retains it
    /// and renders it to the panel.
    pub fn commit_frame(&self, data: &[u8]) -> Result<(), StateError> {
        let expected = self.geometry.frame_len();
        if data.len() != expected {
            return Err(StateError::FrameSize {
                expected,
                actual: data.len(),
            });
        }

        let mut state = self.lock();
        state.frame.copy_from_slice(data);
        self.render(&mut state);
        Ok(())
    }

    /// Renders a gradient: red to blue top to bottom, green left to right.
    pub fn show_test_pattern(&self) {
        let Geometry {
            width,
            height,
            format,
        } = self.geometry;
        let (w, h) = (width as u32, height as u32);

        let mut frame = Vec::with_capacity(self.geometry.frame_len());
        for y in 0..h {
            for x in 0..w {
                let b = (y * 255 / h) as u8;
                let g = (x * 255 / w) as u8;
                let r = 255 - b;
                format.encode_into(r, g, b, &mut frame);
            }
        }

        let mut state = self.lock();
        state.frame = frame;
        self.render(&mut state);
    }

    /// Runs `f` with the panel while holding the device lock.
    #[cfg(test)]
    pub fn with_panel<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&P) -> R,
    {
        let state = self.lock();
        f(&state.panel)
    }

    /// Writes the retained frame to the panel and swaps. Caller holds the lock.
    fn render(&self, state: &mut DeviceState<P>) {
        let width = self.geometry.width as usize;
        let format = self.geometry.format;
        let tint = state.tint;

        for (i, pixel) in state
            .frame
            .chunks_exact(self.geometry.bytes_per_pixel())
            .enumerate()
        {
            let (mut r, mut g, mut b) = format.decode(pixel);
            if let Some(gamma) = &self.gamma {
                r = gamma.correct(r);
                g = gamma.correct(g);
                b = gamma.correct(b);
            }
            let (r, g, b) = tint.apply(r, g, b);
            state
                .panel
                .set_pixel((i % width) as u16, (i / width) as u16, r, g, b);
        }

        state.panel.swap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledmatrix_hw::MemoryPanel;
    use std::sync::Arc;

    fn device(width: u16, height: u16, format: PixelFormat, gamma: bool) -> Device<MemoryPanel> {
        let panel = MemoryPanel::new(width, height).unwrap();
        Device::new(Geometry::new(width, height, format), 100, gamma, panel).unwrap()
    }

    fn solid_frame(geometry: Geometry, r: u8, g: u8, b: u8) -> Vec<u8> {
        let mut frame = Vec::new();
        for _ in 0..geometry.width as usize * geometry.height as usize {
            geometry.format.encode_into(r, g, b, &mut frame);
        }
        frame
    }

    #[test]
    fn test_defaults() {
        let device = device(4, 4, PixelFormat::Rgba32, false);
        assert_eq!(device.brightness(), 100);
        assert_eq!(device.temperature(), 6500);
        assert_eq!(device.tint(), ColorTint::WHITE);
        assert_eq!(device.with_panel(|p| p.brightness()), 100);
    }

    #[test]
    fn test_panel_geometry_must_match() {
        let panel = MemoryPanel::new(8, 8).unwrap();
        let result = Device::new(Geometry::new(4, 4, PixelFormat::Rgba32), 100, false, panel);
        assert!(matches!(result, Err(StateError::PanelGeometry { .. })));
    }

    #[test]
    fn test_brightness_scaled_by_ceiling() {
        let panel = MemoryPanel::new(2, 2).unwrap();
        let device =
            Device::new(Geometry::new(2, 2, PixelFormat::Rgba32), 80, false, panel).unwrap();
        assert_eq!(device.with_panel(|p| p.brightness()), 80);

        device.set_brightness(50).unwrap();
        assert_eq!(device.brightness(), 50);
        assert_eq!(device.with_panel(|p| p.brightness()), 40);
    }

    #[test]
    fn test_brightness_out_of_range_keeps_state() {
        let device = device(2, 2, PixelFormat::Rgba32, false);
        device.set_brightness(30).unwrap();
        assert_eq!(
            device.set_brightness(150),
            Err(StateError::BrightnessOutOfRange(150))
        );
        assert_eq!(device.brightness(), 30);
        assert_eq!(device.with_panel(|p| p.brightness()), 30);
    }

    #[test]
    fn test_temperature_updates_tint() {
        let device = device(2, 2, PixelFormat::Rgba32, false);
        device.set_temperature(2000).unwrap();
        assert_eq!(device.temperature(), 2000);
        assert_eq!(device.tint(), color_temp::tint(2000));

        assert_eq!(
            device.set_temperature(1999),
            Err(StateError::TemperatureOutOfRange(1999))
        );
        assert_eq!(
            device.set_temperature(7000),
            Err(StateError::TemperatureOutOfRange(7000))
        );
        assert_eq!(device.temperature(), 2000);
        assert_eq!(device.tint(), color_temp::tint(2000));
    }

    #[test]
    fn test_commit_frame_applies_tint() {
        let device = device(4, 4, PixelFormat::Rgba32, false);
        device.set_temperature(2000).unwrap();
        let frame = solid_frame(device.geometry(), 255, 255, 255);
        device.commit_frame(&frame).unwrap();

        device.with_panel(|panel| {
            assert!(panel
                .front()
                .data()
                .iter()
                .all(|p| *p == [255, 138, 18]));
        });
    }

    #[test]
    fn test_commit_frame_pixel_positions() {
        let device = device(3, 2, PixelFormat::Bgr24, false);
        let mut frame = vec![0u8; device.geometry().frame_len()];
        // Pixel (2, 1) is index 5; BGR order on the wire.
        frame[15..18].copy_from_slice(&[30, 20, 10]);
        device.commit_frame(&frame).unwrap();

        device.with_panel(|panel| {
            assert_eq!(panel.front().get_pixel(2, 1), Some((10, 20, 30)));
            assert_eq!(panel.front().get_pixel(0, 0), Some((0, 0, 0)));
        });
    }

    #[test]
    fn test_commit_frame_with_gamma() {
        let device = device(1, 1, PixelFormat::Rgb24, true);
        device.commit_frame(&[255, 128, 0]).unwrap();
        device.with_panel(|panel| {
            assert_eq!(panel.front().get_pixel(0, 0), Some((255, 55, 0)));
        });
    }

    #[test]
    fn test_short_frame_leaves_panel_untouched() {
        let device = device(4, 4, PixelFormat::Rgba32, false);
        let frame = solid_frame(device.geometry(), 9, 9, 9);
        device.commit_frame(&frame).unwrap();
        let frames_before = device.with_panel(|p| p.frames());

        let short = vec![255u8; device.geometry().frame_len() - 1];
        assert_eq!(
            device.commit_frame(&short),
            Err(StateError::FrameSize {
                expected: 64,
                actual: 63
            })
        );
        device.with_panel(|panel| {
            assert_eq!(panel.frames(), frames_before);
            assert!(panel.front().data().iter().all(|p| *p == [9, 9, 9]));
        });
    }

    #[test]
    fn test_temperature_rerenders_retained_frame() {
        let device = device(2, 2, PixelFormat::Rgba32, false);
        device
            .commit_frame(&solid_frame(device.geometry(), 255, 255, 255))
            .unwrap();
        device.set_temperature(2000).unwrap();

        device.with_panel(|panel| {
            assert_eq!(panel.front().get_pixel(1, 1), Some((255, 138, 18)));
        });
    }

    #[test]
    fn test_pattern() {
        let device = device(4, 4, PixelFormat::Rgba32, false);
        device.show_test_pattern();
        device.with_panel(|panel| {
            // Top-left: r = 255, g = 0, b = 0.
            assert_eq!(panel.front().get_pixel(0, 0), Some((255, 0, 0)));
            // Bottom-right: b = 3 * 255 / 4, g = 3 * 255 / 4, r = 255 - b.
            assert_eq!(panel.front().get_pixel(3, 3), Some((64, 191, 191)));
        });
    }

    #[test]
    fn test_frames_never_mix_tints() {
        let device = Arc::new(device(16, 16, PixelFormat::Rgba32, false));
        let white = solid_frame(device.geometry(), 255, 255, 255);

        let control = {
            let device = device.clone();
            std::thread::spawn(move || {
                for i in 0..200u16 {
                    let kelvin = if i % 2 == 0 { 2000 } else { 6500 };
                    device.set_temperature(kelvin).unwrap();
                }
            })
        };

        for _ in 0..200 {
            device.commit_frame(&white).unwrap();
            device.with_panel(|panel| {
                let first = panel.front().data()[0];
                assert!(panel.front().data().iter().all(|p| *p == first));
            });
        }
        control.join().unwrap();
    }
}
