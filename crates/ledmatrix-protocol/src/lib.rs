//! LED Matrix Protocol
//!
//! Wire format shared by the daemon and its clients:
//!
//! - Control messages: one type byte followed by packed little-endian
//!   arguments. The type byte is the only framing; the length is implied
//!   by the type.
//! - Transport: ZeroMQ REQ/REP over `ipc://` endpoints, one single-frame
//!   message per request and per reply, in strict lockstep.

pub mod error;
pub mod message;
pub mod transport;

pub use error::{Error, Result};
pub use message::{
    decode, encode, message_id, BrightnessReply, ConfigurationReply, GetBrightnessRequest,
    GetConfigurationRequest, GetTemperatureRequest, Message, MessageId, NullReply, Request,
    SetBrightnessRequest, SetTemperatureRequest, TemperatureReply,
};
pub use transport::{Endpoint, ReplySocket, RequestSocket};

/// Default frame endpoint.
pub const DEFAULT_FRAME_ENDPOINT: &str = "ipc:///run/ledmatrix-frame.sock";

/// Default control endpoint.
pub const DEFAULT_CONTROL_ENDPOINT: &str = "ipc:///run/ledmatrix-control.sock";
