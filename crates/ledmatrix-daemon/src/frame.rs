//! Frame channel.
//!
//! Requests are raw frames of exactly `width * height * bytes_per_pixel`
//! bytes. The reply is always empty and only means "received": a frame of
//! the wrong size is logged and dropped without touching the panel.

use ledmatrix_hw::PanelSurface;
use std::sync::Arc;
use tracing::error;

use crate::state::Device;
use crate::worker::Handler;

/// Commits incoming frames to the device.
pub struct FrameChannel<P> {
    device: Arc<Device<P>>,
}

impl<P: PanelSurface> FrameChannel<P> {
    pub fn new(device: Arc<Device<P>>) -> Self {
        Self { device }
    }
}

impl<P: PanelSurface> Handler for FrameChannel<P> {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn handle(&mut self, request: &[u8]) -> Vec<u8> {
        if let Err(e) = self.device.commit_frame(request) {
            error!("Dropped frame: {}", e);
        }
        Vec::new()
    }
}
