//! Control message definitions and encoding.
//!
//! Message structure:
//! - Type byte: [`MessageId`], one id space for requests and replies
//! - Arguments: fixed-size, packed, little-endian
//!
//! | Id | Message                   | Size |
//! |----|---------------------------|------|
//! | 0  | `NullReply`               | 1    |
//! | 1  | `SetBrightnessRequest`    | 2    |
//! | 2  | `GetBrightnessRequest`    | 1    |
//! | 3  | `BrightnessReply`         | 2    |
//! | 4  | `SetTemperatureRequest`   | 3    |
//! | 5  | `GetTemperatureRequest`   | 1    |
//! | 6  | `TemperatureReply`        | 3    |
//! | 7  | `GetConfigurationRequest` | 1    |
//! | 8  | `ConfigurationReply`      | 5    |

use crate::{Error, Result};

/// Message type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageId {
    NullReply = 0,
    SetBrightnessRequest = 1,
    GetBrightnessRequest = 2,
    BrightnessReply = 3,
    SetTemperatureRequest = 4,
    GetTemperatureRequest = 5,
    TemperatureReply = 6,
    GetConfigurationRequest = 7,
    ConfigurationReply = 8,
}

impl MessageId {
    /// Highest valid type byte.
    pub const MAX: u8 = MessageId::ConfigurationReply as u8;

    /// Converts a type byte to a MessageId.
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MessageId::NullReply),
            1 => Ok(MessageId::SetBrightnessRequest),
            2 => Ok(MessageId::GetBrightnessRequest),
            3 => Ok(MessageId::BrightnessReply),
            4 => Ok(MessageId::SetTemperatureRequest),
            5 => Ok(MessageId::GetTemperatureRequest),
            6 => Ok(MessageId::TemperatureReply),
            7 => Ok(MessageId::GetConfigurationRequest),
            8 => Ok(MessageId::ConfigurationReply),
            _ => Err(Error::InvalidMessage(format!(
                "type byte {} outside 0..={}",
                value,
                Self::MAX
            ))),
        }
    }

    /// Returns true for ids a client may send.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            MessageId::SetBrightnessRequest
                | MessageId::GetBrightnessRequest
                | MessageId::SetTemperatureRequest
                | MessageId::GetTemperatureRequest
                | MessageId::GetConfigurationRequest
        )
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageId::NullReply => "null-reply",
            MessageId::SetBrightnessRequest => "set-brightness",
            MessageId::GetBrightnessRequest => "get-brightness",
            MessageId::BrightnessReply => "brightness-reply",
            MessageId::SetTemperatureRequest => "set-temperature",
            MessageId::GetTemperatureRequest => "get-temperature",
            MessageId::TemperatureReply => "temperature-reply",
            MessageId::GetConfigurationRequest => "get-configuration",
            MessageId::ConfigurationReply => "configuration-reply",
        };
        write!(f, "{}", name)
    }
}

/// A fixed-layout message.
pub trait Message: Sized {
    /// Type byte identifying this message.
    const ID: MessageId;

    /// Size of the packed arguments.
    const ARGS_SIZE: usize;

    /// Total encoded size including the type byte.
    const SIZE: usize = 1 + Self::ARGS_SIZE;

    /// Appends the packed arguments.
    fn write_args(&self, out: &mut Vec<u8>);

    /// Reads the packed arguments. `args` is exactly `ARGS_SIZE` bytes.
    fn read_args(args: &[u8]) -> Self;
}

/// A message sent by clients, answered by exactly one `Reply`.
pub trait Request: Message {
    /// The reply this request is answered with.
    type Reply: Message;
}

/// Reads the type byte of a message.
pub fn message_id(data: &[u8]) -> Result<MessageId> {
    let first = data
        .first()
        .ok_or_else(|| Error::InvalidMessage("empty message".to_string()))?;
    MessageId::from_byte(*first)
}

/// Decodes a message of type `T`, checking length and type byte.
pub fn decode<T: Message>(data: &[u8]) -> Result<T> {
    let id = message_id(data)?;
    if data.len() != T::SIZE {
        return Err(Error::InvalidMessage(format!(
            "{} must be {} bytes, got {}",
            T::ID,
            T::SIZE,
            data.len()
        )));
    }
    if id != T::ID {
        return Err(Error::InvalidMessage(format!(
            "expected {}, got {}",
            T::ID,
            id
        )));
    }
    Ok(T::read_args(&data[1..]))
}

/// Encodes a message: type byte followed by packed arguments.
pub fn encode<T: Message>(message: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(T::SIZE);
    out.push(T::ID as u8);
    message.write_args(&mut out);
    debug_assert_eq!(out.len(), T::SIZE);
    out
}

/// Empty acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NullReply;

impl Message for NullReply {
    const ID: MessageId = MessageId::NullReply;
    const ARGS_SIZE: usize = 0;

    fn write_args(&self, _out: &mut Vec<u8>) {}

    fn read_args(_args: &[u8]) -> Self {
        NullReply
    }
}

/// Sets brightness as a percentage (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBrightnessRequest {
    pub brightness: u8,
}

impl Message for SetBrightnessRequest {
    const ID: MessageId = MessageId::SetBrightnessRequest;
    const ARGS_SIZE: usize = 1;

    fn write_args(&self, out: &mut Vec<u8>) {
        out.push(self.brightness);
    }

    fn read_args(args: &[u8]) -> Self {
        Self {
            brightness: args[0],
        }
    }
}

impl Request for SetBrightnessRequest {
    type Reply = NullReply;
}

/// Queries the brightness percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetBrightnessRequest;

impl Message for GetBrightnessRequest {
    const ID: MessageId = MessageId::GetBrightnessRequest;
    const ARGS_SIZE: usize = 0;

    fn write_args(&self, _out: &mut Vec<u8>) {}

    fn read_args(_args: &[u8]) -> Self {
        GetBrightnessRequest
    }
}

impl Request for GetBrightnessRequest {
    type Reply = BrightnessReply;
}

/// Current brightness percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessReply {
    pub brightness: u8,
}

impl Message for BrightnessReply {
    const ID: MessageId = MessageId::BrightnessReply;
    const ARGS_SIZE: usize = 1;

    fn write_args(&self, out: &mut Vec<u8>) {
        out.push(self.brightness);
    }

    fn read_args(args: &[u8]) -> Self {
        Self {
            brightness: args[0],
        }
    }
}

/// Sets color temperature in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTemperatureRequest {
    pub temperature: u16,
}

impl Message for SetTemperatureRequest {
    const ID: MessageId = MessageId::SetTemperatureRequest;
    const ARGS_SIZE: usize = 2;

    fn write_args(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.temperature.to_le_bytes());
    }

    fn read_args(args: &[u8]) -> Self {
        Self {
            temperature: u16::from_le_bytes([args[0], args[1]]),
        }
    }
}

impl Request for SetTemperatureRequest {
    type Reply = NullReply;
}

/// Queries the color temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetTemperatureRequest;

impl Message for GetTemperatureRequest {
    const ID: MessageId = MessageId::GetTemperatureRequest;
    const ARGS_SIZE: usize = 0;

    fn write_args(&self, _out: &mut Vec<u8>) {}

    fn read_args(_args: &[u8]) -> Self {
        GetTemperatureRequest
    }
}

impl Request for GetTemperatureRequest {
    type Reply = TemperatureReply;
}

/// Current color temperature in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureReply {
    pub temperature: u16,
}

impl Message for TemperatureReply {
    const ID: MessageId = MessageId::TemperatureReply;
    const ARGS_SIZE: usize = 2;

    fn write_args(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.temperature.to_le_bytes());
    }

    fn read_args(args: &[u8]) -> Self {
        Self {
            temperature: u16::from_le_bytes([args[0], args[1]]),
        }
    }
}

/// Queries the display geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetConfigurationRequest;

impl Message for GetConfigurationRequest {
    const ID: MessageId = MessageId::GetConfigurationRequest;
    const ARGS_SIZE: usize = 0;

    fn write_args(&self, _out: &mut Vec<u8>) {}

    fn read_args(_args: &[u8]) -> Self {
        GetConfigurationRequest
    }
}

impl Request for GetConfigurationRequest {
    type Reply = ConfigurationReply;
}

/// Display geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationReply {
    pub width: u16,
    pub height: u16,
}

impl Message for ConfigurationReply {
    const ID: MessageId = MessageId::ConfigurationReply;
    const ARGS_SIZE: usize = 4;

    fn write_args(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
    }

    fn read_args(args: &[u8]) -> Self {
        Self {
            width: u16::from_le_bytes([args[0], args[1]]),
            height: u16::from_le_bytes([args[2], args[3]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_message_sizes() {
        assert_eq!(NullReply::SIZE, 1);
        assert_eq!(SetBrightnessRequest::SIZE, 2);
        assert_eq!(BrightnessReply::SIZE, 2);
        assert_eq!(SetTemperatureRequest::SIZE, 3);
        assert_eq!(TemperatureReply::SIZE, 3);
        assert_eq!(GetBrightnessRequest::SIZE, 1);
        assert_eq!(GetTemperatureRequest::SIZE, 1);
        assert_eq!(GetConfigurationRequest::SIZE, 1);
        assert_eq!(ConfigurationReply::SIZE, 5);
    }

    #[test]
    fn test_encoded_layout() {
        assert_eq!(encode(&NullReply), vec![0x00]);
        assert_eq!(encode(&SetBrightnessRequest { brightness: 50 }), vec![0x01, 50]);
        assert_eq!(
            encode(&SetTemperatureRequest { temperature: 6500 }),
            vec![0x04, 0x64, 0x19]
        );
        assert_eq!(
            encode(&ConfigurationReply {
                width: 64,
                height: 32
            }),
            vec![0x08, 64, 0, 32, 0]
        );
    }

    #[test]
    fn test_message_id() {
        assert_eq!(message_id(&[0x02]).unwrap(), MessageId::GetBrightnessRequest);
        assert_eq!(message_id(&[0x08, 0, 0]).unwrap(), MessageId::ConfigurationReply);
        assert!(matches!(message_id(&[]), Err(Error::InvalidMessage(_))));
        assert!(matches!(message_id(&[9]), Err(Error::InvalidMessage(_))));
        assert!(matches!(message_id(&[0xFF]), Err(Error::InvalidMessage(_))));
    }

    #[test]
    fn test_request_ids() {
        assert!(MessageId::SetBrightnessRequest.is_request());
        assert!(MessageId::GetConfigurationRequest.is_request());
        assert!(!MessageId::NullReply.is_request());
        assert!(!MessageId::TemperatureReply.is_request());
    }

    #[test]
    fn test_decode() {
        let msg: SetTemperatureRequest = decode(&[0x04, 0xD0, 0x07]).unwrap();
        assert_eq!(msg.temperature, 2000);

        let reply: ConfigurationReply = decode(&[0x08, 32, 0, 16, 0]).unwrap();
        assert_eq!(
            reply,
            ConfigurationReply {
                width: 32,
                height: 16
            }
        );
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        // Right size, wrong type byte.
        assert!(matches!(
            decode::<SetBrightnessRequest>(&[0x03, 50]),
            Err(Error::InvalidMessage(_))
        ));
        assert!(matches!(
            decode::<GetBrightnessRequest>(&[0x05]),
            Err(Error::InvalidMessage(_))
        ));
    }

    fn survives_encoding<T: Message + PartialEq + std::fmt::Debug>(
        message: T,
    ) -> std::result::Result<(), TestCaseError> {
        let encoded = encode(&message);
        prop_assert_eq!(encoded.len(), T::SIZE);
        prop_assert_eq!(decode::<T>(&encoded).unwrap(), message);
        Ok(())
    }

    /// Any length other than `T::SIZE` behind a correct type byte is rejected.
    fn rejects_wrong_length<T: Message>(tail: &[u8]) -> std::result::Result<(), TestCaseError> {
        let mut data = vec![T::ID as u8];
        data.extend_from_slice(tail);
        let result = decode::<T>(&data);
        if data.len() == T::SIZE {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(Error::InvalidMessage(_))));
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn every_message_survives_encoding(
            brightness in any::<u8>(),
            temperature in any::<u16>(),
            width in any::<u16>(),
            height in any::<u16>(),
        ) {
            survives_encoding(NullReply)?;
            survives_encoding(SetBrightnessRequest { brightness })?;
            survives_encoding(GetBrightnessRequest)?;
            survives_encoding(BrightnessReply { brightness })?;
            survives_encoding(SetTemperatureRequest { temperature })?;
            survives_encoding(GetTemperatureRequest)?;
            survives_encoding(TemperatureReply { temperature })?;
            survives_encoding(GetConfigurationRequest)?;
            survives_encoding(ConfigurationReply { width, height })?;
        }

        #[test]
        fn every_message_rejects_wrong_length(
            tail in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            rejects_wrong_length::<NullReply>(&tail)?;
            rejects_wrong_length::<SetBrightnessRequest>(&tail)?;
            rejects_wrong_length::<GetBrightnessRequest>(&tail)?;
            rejects_wrong_length::<BrightnessReply>(&tail)?;
            rejects_wrong_length::<SetTemperatureRequest>(&tail)?;
            rejects_wrong_length::<GetTemperatureRequest>(&tail)?;
            rejects_wrong_length::<TemperatureReply>(&tail)?;
            rejects_wrong_length::<GetConfigurationRequest>(&tail)?;
            rejects_wrong_length::<ConfigurationReply>(&tail)?;
        }
    }

    #[test]
    fn test_configuration_fields_in_order() {
        let reply = ConfigurationReply {
            width: 0x0102,
            height: 0x0304,
        };
        assert_eq!(encode(&reply), vec![0x08, 0x02, 0x01, 0x04, 0x03]);
        let decoded: ConfigurationReply = decode(&[0x08, 0x02, 0x01, 0x04, 0x03]).unwrap();
        assert_eq!(decoded, reply);
    }
}
