//! Display server lifecycle.

use anyhow::{Context, Result};
use ledmatrix_hw::PanelSurface;
use ledmatrix_protocol::ReplySocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::control::ControlChannel;
use crate::frame::FrameChannel;
use crate::state::Device;
use crate::worker;

/// A running display server: the shared device and its two workers.
pub struct Server<P> {
    device: Arc<Device<P>>,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl<P: PanelSurface + 'static> Server<P> {
    /// Binds both endpoints, initializes the device and starts serving.
    pub fn start(config: &Config, panel: P) -> Result<Self> {
        let geometry = config.geometry()?;
        let timeout = config.receive_timeout();

        let frame_endpoint = config.frame_endpoint()?;
        let control_endpoint = config.control_endpoint()?;
        let frame_socket = ReplySocket::bind(&frame_endpoint, timeout)
            .with_context(|| format!("Failed to bind frame endpoint {}", frame_endpoint))?;
        let control_socket = ReplySocket::bind(&control_endpoint, timeout)
            .with_context(|| format!("Failed to bind control endpoint {}", control_endpoint))?;

        let device = Device::new(
            geometry,
            config.max_brightness,
            config.display.gamma,
            panel,
        )
        .context("Failed to initialize panel")?;
        let device = Arc::new(device);
        info!(
            "Display {}x{} {} ({} bytes per frame), brightness ceiling {}",
            geometry.width,
            geometry.height,
            geometry.format,
            geometry.frame_len(),
            device.max_brightness()
        );

        if config.test_pattern {
            device.show_test_pattern();
            info!("Showing test pattern");
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let mut server = Self {
            device: device.clone(),
            shutdown: shutdown.clone(),
            workers: Vec::with_capacity(2),
        };

        let frame = worker::spawn(
            frame_socket,
            FrameChannel::new(device.clone()),
            shutdown.clone(),
        )
        .context("Failed to start frame worker")?;
        server.workers.push(frame);

        // On failure here the frame worker is stopped by dropping `server`.
        let control = worker::spawn(control_socket, ControlChannel::new(device), shutdown)
            .context("Failed to start control worker")?;
        server.workers.push(control);

        Ok(server)
    }

    /// Returns the shared device.
    #[cfg(test)]
    pub fn device(&self) -> &Arc<Device<P>> {
        &self.device
    }

    /// Signals both workers and waits for them to finish.
    pub fn stop(mut self) {
        self.join();
        info!("Server stopped");
    }
}

impl<P> Server<P> {
    fn join(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("Worker thread panicked");
            }
        }
    }
}

impl<P> Drop for Server<P> {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledmatrix_client::{ControlClient, FrameClient};
    use ledmatrix_hw::MemoryPanel;
    use std::path::Path;

    fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.display.rows = 4;
        config.display.cols = 4;
        config.receive_timeout_ms = 20;
        config.test_pattern = false;
        config.endpoints.frame = format!("ipc://{}", dir.join("frame.sock").display());
        config.endpoints.control = format!("ipc://{}", dir.join("control.sock").display());
        config
    }

    #[test]
    fn test_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let server = Server::start(&config, MemoryPanel::new(4, 4).unwrap()).unwrap();

        let mut control = ControlClient::connect(&config.control_endpoint().unwrap()).unwrap();
        let mut frames = FrameClient::connect(&config.frame_endpoint().unwrap()).unwrap();

        assert_eq!(control.get_configuration().unwrap(), (4, 4));

        control.set_brightness(50).unwrap();
        assert_eq!(control.get_brightness().unwrap(), 50);

        frames.send_frame(&[0xFF; 64]).unwrap();
        server.device().with_panel(|panel| {
            assert_eq!(panel.brightness(), 50);
            assert_eq!(panel.front().get_pixel(0, 0), Some((255, 255, 255)));
            assert_eq!(panel.front().get_pixel(3, 3), Some((255, 255, 255)));
        });
        let swaps = server.device().with_panel(|panel| panel.frames());

        // Short frames are acknowledged but never shown.
        frames.send_frame(&[0x00; 10]).unwrap();
        assert_eq!(server.device().with_panel(|panel| panel.frames()), swaps);

        control.set_temperature(6500).unwrap();
        assert_eq!(control.get_temperature().unwrap(), 6500);

        control.set_temperature(3000).unwrap();
        assert_eq!(control.get_temperature().unwrap(), 3000);
        server.device().with_panel(|panel| {
            let (r, g, b) = panel.front().get_pixel(1, 1).unwrap();
            assert!(r >= 254);
            assert!(g < 255 && b < g);
        });

        server.stop();
    }

    #[test]
    fn test_test_pattern_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.test_pattern = true;
        let server = Server::start(&config, MemoryPanel::new(4, 4).unwrap()).unwrap();

        server.device().with_panel(|panel| {
            assert_eq!(panel.frames(), 1);
            // Top-left is pure red, bottom-left leans blue.
            assert_eq!(panel.front().get_pixel(0, 0), Some((255, 0, 0)));
            let (r, _, b) = panel.front().get_pixel(0, 3).unwrap();
            assert!(b > r);
        });
        server.stop();
    }

    #[test]
    fn test_panel_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        assert!(Server::start(&config, MemoryPanel::new(8, 8).unwrap()).is_err());
    }
}
