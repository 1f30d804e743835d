//! Control channel.
//!
//! Decodes the type byte, then the full typed request, dispatches it to the
//! device and encodes the reply its type is associated with. Anything that
//! fails to decode, or carries a reply type, is answered with a `NullReply`.
//! Out-of-range values are logged and answered normally with state left as is.

use ledmatrix_hw::PanelSurface;
use ledmatrix_protocol::{
    decode, encode, message_id, BrightnessReply, ConfigurationReply, GetBrightnessRequest,
    GetConfigurationRequest, GetTemperatureRequest, MessageId, NullReply, Request,
    SetBrightnessRequest, SetTemperatureRequest, TemperatureReply,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::state::Device;
use crate::worker::Handler;

/// Handles one request type.
trait Process<R: Request> {
    fn process(&self, request: R) -> R::Reply;
}

/// Applies control requests to the device.
pub struct ControlChannel<P> {
    device: Arc<Device<P>>,
}

impl<P: PanelSurface> ControlChannel<P> {
    pub fn new(device: Arc<Device<P>>) -> Self {
        Self { device }
    }

    /// Decodes and dispatches one request, returning the encoded reply.
    pub fn dispatch(&self, data: &[u8]) -> Vec<u8> {
        let id = match message_id(data) {
            Ok(id) => id,
            Err(e) => {
                warn!("Rejected control message: {}", e);
                return encode(&NullReply);
            }
        };

        match id {
            MessageId::SetBrightnessRequest => self.reply::<SetBrightnessRequest>(data),
            MessageId::GetBrightnessRequest => self.reply::<GetBrightnessRequest>(data),
            MessageId::SetTemperatureRequest => self.reply::<SetTemperatureRequest>(data),
            MessageId::GetTemperatureRequest => self.reply::<GetTemperatureRequest>(data),
            MessageId::GetConfigurationRequest => self.reply::<GetConfigurationRequest>(data),
            MessageId::NullReply
            | MessageId::BrightnessReply
            | MessageId::TemperatureReply
            | MessageId::ConfigurationReply => {
                warn!("Rejected control message: {} is not a request", id);
                encode(&NullReply)
            }
        }
    }

    fn reply<R>(&self, data: &[u8]) -> Vec<u8>
    where
        R: Request,
        Self: Process<R>,
    {
        match decode::<R>(data) {
            Ok(request) => encode(&self.process(request)),
            Err(e) => {
                warn!("Rejected control message: {}", e);
                encode(&NullReply)
            }
        }
    }
}

impl<P: PanelSurface> Process<SetBrightnessRequest> for ControlChannel<P> {
    fn process(&self, request: SetBrightnessRequest) -> NullReply {
        match self.device.set_brightness(request.brightness) {
            Ok(()) => info!("Brightness set to {}%", request.brightness),
            Err(e) => warn!("Ignoring set-brightness: {}", e),
        }
        NullReply
    }
}

impl<P: PanelSurface> Process<GetBrightnessRequest> for ControlChannel<P> {
    fn process(&self, _request: GetBrightnessRequest) -> BrightnessReply {
        BrightnessReply {
            brightness: self.device.brightness(),
        }
    }
}

impl<P: PanelSurface> Process<SetTemperatureRequest> for ControlChannel<P> {
    fn process(&self, request: SetTemperatureRequest) -> NullReply {
        match self.device.set_temperature(request.temperature) {
            Ok(()) => info!(
                "Temperature set to {}K, tint {:?}",
                request.temperature,
                self.device.tint()
            ),
            Err(e) => warn!("Ignoring set-temperature: {}", e),
        }
        NullReply
    }
}

impl<P: PanelSurface> Process<GetTemperatureRequest> for ControlChannel<P> {
    fn process(&self, _request: GetTemperatureRequest) -> TemperatureReply {
        TemperatureReply {
            temperature: self.device.temperature(),
        }
    }
}

impl<P: PanelSurface> Process<GetConfigurationRequest> for ControlChannel<P> {
    fn process(&self, _request: GetConfigurationRequest) -> ConfigurationReply {
        let geometry = self.device.geometry();
        debug!("Reporting geometry {}x{}", geometry.width, geometry.height);
        ConfigurationReply {
            width: geometry.width,
            height: geometry.height,
        }
    }
}

impl<P: PanelSurface> Handler for ControlChannel<P> {
    fn name(&self) -> &'static str {
        "control"
    }

    fn handle(&mut self, request: &[u8]) -> Vec<u8> {
        self.dispatch(request)
    }
}
