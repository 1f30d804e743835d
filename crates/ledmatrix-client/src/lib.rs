//! Client library for communicating with the LED Matrix Daemon.
//!
//! This crate provides blocking clients for both daemon endpoints, shared by
//! the CLI and tests.

use anyhow::{Context, Result};
use ledmatrix_protocol::{
    decode, encode, Endpoint, GetBrightnessRequest, GetConfigurationRequest,
    GetTemperatureRequest, Request, RequestSocket, SetBrightnessRequest, SetTemperatureRequest,
};
use std::time::Duration;
use tracing::debug;

/// How long to wait for the daemon to answer a request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the control endpoint.
pub struct ControlClient {
    socket: RequestSocket,
}

impl ControlClient {
    /// Connects to the control endpoint.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        Self::connect_with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Connects with a custom reply timeout. A timed-out client must be
    /// reconnected before it can send again.
    pub fn connect_with_timeout(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let socket = RequestSocket::connect(endpoint, Some(timeout))
            .with_context(|| format!("Failed to connect to {}", endpoint))?;
        Ok(Self { socket })
    }

    /// Sends a typed request and decodes the reply associated with it.
    pub fn request<R: Request>(&mut self, request: &R) -> Result<R::Reply> {
        debug!("Sending {} to {}", R::ID, self.socket.endpoint());
        let reply = self
            .socket
            .request(&encode(request))
            .with_context(|| format!("Failed to send {} request", R::ID))?;
        decode::<R::Reply>(&reply).with_context(|| format!("Unexpected reply to {}", R::ID))
    }

    /// Sets brightness as a percentage (0-100).
    ///
    /// The daemon acknowledges out-of-range values without applying them.
    pub fn set_brightness(&mut self, brightness: u8) -> Result<()> {
        self.request(&SetBrightnessRequest { brightness })?;
        Ok(())
    }

    /// Gets the brightness percentage.
    pub fn get_brightness(&mut self) -> Result<u8> {
        Ok(self.request(&GetBrightnessRequest)?.brightness)
    }

    /// Sets the color temperature in Kelvin (2000-6500).
    ///
    /// The daemon acknowledges out-of-range values without applying them.
    pub fn set_temperature(&mut self, temperature: u16) -> Result<()> {
        self.request(&SetTemperatureRequest { temperature })?;
        Ok(())
    }

    /// Gets the color temperature in Kelvin.
    pub fn get_temperature(&mut self) -> Result<u16> {
        Ok(self.request(&GetTemperatureRequest)?.temperature)
    }

    /// Gets the display size as (width, height).
    pub fn get_configuration(&mut self) -> Result<(u16, u16)> {
        let reply = self.request(&GetConfigurationRequest)?;
        Ok((reply.width, reply.height))
    }
}

/// Client for the frame endpoint.
pub struct FrameClient {
    socket: RequestSocket,
}

impl FrameClient {
    /// Connects to the frame endpoint.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        Self::connect_with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Connects with a custom reply timeout.
    pub fn connect_with_timeout(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let socket = RequestSocket::connect(endpoint, Some(timeout))
            .with_context(|| format!("Failed to connect to {}", endpoint))?;
        Ok(Self { socket })
    }

    /// Sends one raw frame and waits for the acknowledgment.
    ///
    /// The acknowledgment only means the daemon received the frame; frames of
    /// the wrong size are dropped on the daemon side.
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let reply = self
            .socket
            .request(frame)
            .context("Failed to send frame")?;
        if !reply.is_empty() {
            debug!("Ignoring {} byte frame acknowledgment", reply.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledmatrix_protocol::{BrightnessReply, NullReply, ReplySocket};
    use std::thread::JoinHandle;

    /// Answers `replies.len()` requests in order, returning what it received.
    fn fake_daemon(endpoint: &Endpoint, replies: Vec<Vec<u8>>) -> JoinHandle<Vec<Vec<u8>>> {
        let mut socket = ReplySocket::bind(endpoint, Duration::from_millis(20)).unwrap();
        std::thread::spawn(move || {
            let mut received = Vec::new();
            for reply in replies {
                let request = loop {
                    if let Some(request) = socket.receive().unwrap() {
                        break request;
                    }
                };
                received.push(request);
                socket.send(&reply).unwrap();
            }
            received
        })
    }

    #[test]
    fn test_control_requests() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::new(dir.path().join("control.sock"));
        let daemon = fake_daemon(
            &endpoint,
            vec![
                encode(&NullReply),
                encode(&BrightnessReply { brightness: 42 }),
                vec![0x08, 0x40, 0x00, 0x20, 0x00],
            ],
        );

        let mut client = ControlClient::connect(&endpoint).unwrap();
        client.set_brightness(42).unwrap();
        assert_eq!(client.get_brightness().unwrap(), 42);
        assert_eq!(client.get_configuration().unwrap(), (64, 32));

        let received = daemon.join().unwrap();
        assert_eq!(received, vec![vec![0x01, 42], vec![0x02], vec![0x07]]);
    }

    #[test]
    fn test_mismatched_reply_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::new(dir.path().join("control.sock"));
        let daemon = fake_daemon(&endpoint, vec![encode(&NullReply), vec![0x06, 0x64]]);

        let mut client = ControlClient::connect(&endpoint).unwrap();
        // A NullReply is what the daemon sends for requests it rejects.
        assert!(client.get_temperature().is_err());
        // Truncated temperature reply.
        assert!(client.get_temperature().is_err());
        daemon.join().unwrap();
    }

    #[test]
    fn test_send_frame() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::new(dir.path().join("frame.sock"));
        let daemon = fake_daemon(&endpoint, vec![Vec::new()]);

        let mut client = FrameClient::connect(&endpoint).unwrap();
        client.send_frame(&[1, 2, 3, 4]).unwrap();
        assert_eq!(daemon.join().unwrap(), vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_requests_without_daemon_fail() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::new(dir.path().join("missing.sock"));
        let timeout = Duration::from_millis(100);

        let mut control = ControlClient::connect_with_timeout(&endpoint, timeout).unwrap();
        assert!(control.get_brightness().is_err());

        let mut frames = FrameClient::connect_with_timeout(&endpoint, timeout).unwrap();
        assert!(frames.send_frame(&[0; 4]).is_err());
    }
}
