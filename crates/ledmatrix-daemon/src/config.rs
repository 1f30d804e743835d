//! Configuration management.

use anyhow::{bail, Context, Result};
use ledmatrix_hw::{PixelFormat, DEFAULT_COLS, DEFAULT_ROWS};
use ledmatrix_protocol::{Endpoint, DEFAULT_CONTROL_ENDPOINT, DEFAULT_FRAME_ENDPOINT};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::state::Geometry;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Panel layout and frame format
    #[serde(default)]
    pub display: DisplayConfig,

    /// Socket endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Hardware brightness (0-100) that a 100% request maps to
    #[serde(default = "default_max_brightness")]
    pub max_brightness: u8,

    /// How long workers block on receive before checking for shutdown
    #[serde(default = "default_receive_timeout")]
    pub receive_timeout_ms: u64,

    /// Render a gradient at startup
    #[serde(default = "default_test_pattern")]
    pub test_pattern: bool,
}

/// Panel layout configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Rows per panel
    #[serde(default = "default_rows")]
    pub rows: u16,

    /// Columns per panel
    #[serde(default = "default_cols")]
    pub cols: u16,

    /// Panels daisy-chained horizontally
    #[serde(default = "default_chain")]
    pub chain_length: u16,

    /// Parallel chains stacked vertically
    #[serde(default = "default_chain")]
    pub parallel: u16,

    /// Pixel layout of incoming frames (rgba32, bgra32, rgb24, bgr24)
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Apply gamma 2.2 before writing to the panel
    #[serde(default)]
    pub gamma: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            chain_length: default_chain(),
            parallel: default_chain(),
            pixel_format: default_pixel_format(),
            gamma: false,
        }
    }
}

/// Socket endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    /// Frame endpoint
    #[serde(default = "default_frame_endpoint")]
    pub frame: String,

    /// Control endpoint
    #[serde(default = "default_control_endpoint")]
    pub control: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            frame: default_frame_endpoint(),
            control: default_control_endpoint(),
        }
    }
}

// Default value functions
fn default_max_brightness() -> u8 {
    100
}

fn default_receive_timeout() -> u64 {
    500
}

fn default_test_pattern() -> bool {
    true
}

fn default_rows() -> u16 {
    DEFAULT_ROWS
}

fn default_cols() -> u16 {
    DEFAULT_COLS
}

fn default_chain() -> u16 {
    1
}

fn default_pixel_format() -> String {
    PixelFormat::default().to_string()
}

fn default_frame_endpoint() -> String {
    DEFAULT_FRAME_ENDPOINT.to_string()
}

fn default_control_endpoint() -> String {
    DEFAULT_CONTROL_ENDPOINT.to_string()
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every derived value so startup fails before binding anything.
    pub fn validate(&self) -> Result<()> {
        self.geometry()?;
        self.frame_endpoint()?;
        self.control_endpoint()?;
        if self.max_brightness > 100 {
            bail!(
                "max_brightness must be between 0 and 100, got {}",
                self.max_brightness
            );
        }
        if self.receive_timeout_ms == 0 {
            bail!("receive_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Returns the display geometry: chains extend the width, parallel
    /// chains extend the height.
    pub fn geometry(&self) -> Result<Geometry> {
        let d = &self.display;
        let width = d.cols.checked_mul(d.chain_length);
        let height = d.rows.checked_mul(d.parallel);
        let (width, height) = match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => bail!(
                "Invalid display geometry: {} cols x {} chained, {} rows x {} parallel",
                d.cols,
                d.chain_length,
                d.rows,
                d.parallel
            ),
        };
        let format: PixelFormat = d
            .pixel_format
            .parse()
            .context("Invalid display.pixel_format")?;
        Ok(Geometry::new(width, height, format))
    }

    /// Returns the parsed frame endpoint.
    pub fn frame_endpoint(&self) -> Result<Endpoint> {
        self.endpoints
            .frame
            .parse()
            .context("Invalid endpoints.frame")
    }

    /// Returns the parsed control endpoint.
    pub fn control_endpoint(&self) -> Result<Endpoint> {
        self.endpoints
            .control
            .parse()
            .context("Invalid endpoints.control")
    }

    /// Returns the receive timeout.
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            endpoints: EndpointsConfig::default(),
            max_brightness: default_max_brightness(),
            receive_timeout_ms: default_receive_timeout(),
            test_pattern: default_test_pattern(),
        }
    }
}
