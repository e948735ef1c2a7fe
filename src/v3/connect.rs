// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use super::connect_ack::ConnectReturnCode;
use crate::{FixedHeader, VariantPacket, PacketType};
use crate::connect_flags::ConnectFlags;
use crate::utils::validate_client_id;
use crate::{
    BinaryData, ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, PubTopic,
    StringData, U16Data, VarIntError,
};

/// Protocol name used by MQTT v3.1.1.
pub const PROTOCOL_NAME_V4: &str = "MQTT";

/// Protocol name used by MQTT v3.1.
pub const PROTOCOL_NAME_V3: &str = "MQIsdp";

/// `ConnectPacket` consists of three parts:
/// * `FixedHeader`
/// * `VariableHeader`
/// * `Payload`
/// Note that fixed header part is same in all packets so that we just ignore it.
///
/// Basic struct of `ConnectPacket` is as below:
/// ```txt
///  7                          0
/// +----------------------------+
/// | Fixed header               |
/// |                            |
/// +----------------------------+
/// | Protocol level             |
/// +----------------------------+
/// | Connect flags              |
/// +----------------------------+
/// | Keep alive                 |
/// |                            |
/// +----------------------------+
/// | Client id length           |
/// |                            |
/// +----------------------------+
/// | Client id string ...       |
/// +----------------------------+
/// | Will topic length          |
/// |                            |
/// +----------------------------+
/// | Will topic string ...      |
/// +----------------------------+
/// | Will message length        |
/// |                            |
/// +----------------------------+
/// | Will message bytes ...     |
/// +----------------------------+
/// | Username length            |
/// |                            |
/// +----------------------------+
/// | Username string ...        |
/// +----------------------------+
/// | Password length            |
/// |                            |
/// +----------------------------+
/// | Password bytes ...         |
/// +----------------------------+
/// ```
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectPacket {
    /// Protocol name, normally `MQTT` (v3.1.1) or `MQIsdp` (v3.1). Captured as-is during
    /// decode; `validate()` is where an unrecognized name is rejected.
    protocol_name: StringData,

    /// Raw protocol version byte. Not constrained to a known `ProtocolLevel` at decode
    /// time, since an out-of-range byte is a `validate()`-time return code, not a
    /// structural decode failure.
    protocol_level: u8,

    connect_flags: ConnectFlags,

    /// Time interval between two packets in seconds.
    /// Client must send PingRequest Packet before exceeding this interval.
    /// If this value is not zero and time exceeds after last packet, the Server
    /// will disconnect the network.
    ///
    /// If this value is zero, the Server is not required to disconnect the network.
    keep_alive: U16Data,

    /// Payload is `client_id`.
    /// `client_id` is generated in client side. Normally it can be `device_id` or just
    /// randomly generated string.
    /// `client_id` is used to identify client connections in server. Session is based on this field.
    /// It must be valid UTF-8 string, length shall be between 1 and 23 bytes.
    /// It can only contain the characters: "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"
    /// If `client_id` is invalid, the Server will reply ConnectAck Packet with return code
    /// 0x02(Identifier rejected).
    client_id: StringData,

    /// If the `will` flag is true in `connect_flags`, then `will_topic` field must be set.
    /// It will be used as the topic of Will Message.
    will_topic: Option<PubTopic>,

    /// If the `will` flag is true in `connect_flags`, then `will_message` field must be set.
    /// It will be used as the payload of Will Message.
    /// It consists of 0 to 64k bytes of binary data.
    will_message: BinaryData,

    /// If the `username` flag is true in `connect_flags`, then `username` field must be set.
    /// It is a valid UTF-8 string.
    username: StringData,

    /// If the `password` flag is true in `connect_flags`, then `password` field must be set.
    /// It consists of 0 to 64k bytes of binary data.
    password: BinaryData,
}

impl ConnectPacket {
    /// Create a new connect packet with `client_id`.
    ///
    /// # Errors
    ///
    /// Returns error if `client_id` is invalid.
    pub fn new(client_id: &str) -> Result<Self, EncodeError> {
        let protocol_name = StringData::from(PROTOCOL_NAME_V4)?;
        validate_client_id(client_id).map_err(|_err| EncodeError::InvalidClientId)?;
        let client_id = StringData::from(client_id)?;
        Ok(Self {
            protocol_name,
            protocol_level: 4,
            keep_alive: U16Data::new(60),
            client_id,
            ..Self::default()
        })
    }

    /// Update protocol level.
    pub const fn set_protocol_level(&mut self, level: u8) -> &Self {
        self.protocol_level = level;
        self
    }

    /// Get raw protocol version byte as read from (or to be written to) the wire.
    #[must_use]
    #[inline]
    pub const fn protocol_level(&self) -> u8 {
        self.protocol_level
    }

    /// Get current protocol name.
    #[must_use]
    pub fn protocol_name(&self) -> &str {
        self.protocol_name.as_ref()
    }

    /// Update connect flags
    pub fn set_connect_flags(&mut self, flags: ConnectFlags) -> &Self {
        self.connect_flags = flags;
        self
    }

    /// Get current connect flags.
    #[must_use]
    #[inline]
    pub const fn connect_flags(&self) -> &ConnectFlags {
        &self.connect_flags
    }

    /// Update keep alive value in milliseconds.
    pub fn set_keep_alive(&mut self, keep_alive: u16) -> &mut Self {
        self.keep_alive = U16Data::new(keep_alive);
        self
    }

    /// Get current keep alive value.
    #[must_use]
    #[inline]
    pub const fn keep_alive(&self) -> u16 {
        // TODO(Shaohua): Returns a duration
        self.keep_alive.value()
    }

    /// Update client id.
    ///
    /// # Errors
    ///
    /// Returns error if `client_id` is invalid.
    pub fn set_client_id(&mut self, client_id: &str) -> Result<&mut Self, EncodeError> {
        validate_client_id(client_id).map_err(|_err| EncodeError::InvalidClientId)?;
        self.client_id = StringData::from(client_id)?;
        Ok(self)
    }

    /// Get current client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_ref()
    }

    /// Update username value.
    ///
    /// # Errors
    ///
    /// Returns error if `username` contains invalid chars or too long.
    pub fn set_username(&mut self, username: &str) -> Result<&mut Self, EncodeError> {
        self.username = StringData::from(username)?;
        Ok(self)
    }

    /// Get current username value.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_ref()
    }

    /// Update password value.
    ///
    /// # Errors
    ///
    /// Returns error if `password` is too long.
    pub fn set_password(&mut self, password: &[u8]) -> Result<&mut Self, EncodeError> {
        self.password = BinaryData::from_slice(password)?;
        Ok(self)
    }

    /// Get current password value.
    #[must_use]
    pub fn password(&self) -> &[u8] {
        self.password.as_ref()
    }

    /// Update will-topic.
    ///
    /// # Errors
    ///
    /// Returns error if `topic` is invalid.
    pub fn set_will_topic(&mut self, topic: &str) -> Result<&mut Self, EncodeError> {
        if topic.is_empty() {
            self.will_topic = None;
        } else {
            self.will_topic = Some(PubTopic::new(topic)?);
        }
        Ok(self)
    }

    /// Get current will-topic value.
    #[must_use]
    pub fn will_topic(&self) -> Option<&str> {
        self.will_topic.as_ref().map(AsRef::as_ref)
    }

    /// Update will-message.
    ///
    /// # Errors
    ///
    /// Returns error if `message` is too long.
    pub fn set_will_message(&mut self, message: &[u8]) -> Result<&mut Self, EncodeError> {
        self.will_message = BinaryData::from_slice(message)?;
        Ok(self)
    }

    /// Get current will-message value.
    #[must_use]
    pub fn will_message(&self) -> &[u8] {
        self.will_message.as_ref()
    }

    // TODO(Shaohua): Add more getters/setters.

    /// Evaluate the cross-field CONNECT rules and return the `ConnectReturnCode` a
    /// server should reply with. This never fails and never touches the network; it is
    /// a pure function over an already-decoded packet, called by a server after
    /// `decode()` has succeeded, to decide whether to accept or refuse the connection.
    #[must_use]
    pub fn validate(&self) -> ConnectReturnCode {
        // If the User Name Flag is set to 0, the Password Flag MUST be set to 0 [MQTT-3.1.2-22].
        if !self.connect_flags.has_username() && self.connect_flags.has_password() {
            return ConnectReturnCode::MalformedUsernamePassword;
        }

        // The Server MUST validate that the reserved flag in the CONNECT Control Packet
        // is set to zero and disconnect the Client if it is not zero [MQTT-3.1.2-3].
        if self.connect_flags.reserved() {
            return ConnectReturnCode::ProtocolViolation;
        }

        let name = self.protocol_name.as_ref();
        if (name == PROTOCOL_NAME_V3 && self.protocol_level != 3)
            || (name == PROTOCOL_NAME_V4 && self.protocol_level != 4)
        {
            return ConnectReturnCode::UnacceptedProtocol;
        }
        if name != PROTOCOL_NAME_V3 && name != PROTOCOL_NAME_V4 {
            return ConnectReturnCode::ProtocolViolation;
        }

        if self.client_id.as_ref().len() > 65535
            || self.username.as_ref().len() > 65535
            || self.password.len() > 65535
        {
            return ConnectReturnCode::ProtocolViolation;
        }

        // If the Client supplies a zero-byte ClientId with CleanSession set to 0, the Server
        // MUST respond to the CONNECT Packet with a CONNACK return code 0x02 (Identifier
        // rejected) and then close the Network Connection [MQTT-3.1.3-8].
        if self.client_id.is_empty() && !self.connect_flags.clean_session() {
            return ConnectReturnCode::IdentifierRejected;
        }

        // If the Will Flag is set to 0 the Will QoS and Will Retain fields in the
        // Connect Flags MUST be set to zero and the Will Topic and Will Message fields
        // MUST NOT be present in the payload [MQTT-3.1.2-11], [MQTT-3.1.2-13].
        if !self.connect_flags.will()
            && (self.connect_flags.will_qos() != crate::QoS::AtMostOnce
                || self.connect_flags.will_retain()
                || self.will_topic.is_some()
                || !self.will_message.is_empty())
        {
            return ConnectReturnCode::ProtocolViolation;
        }

        ConnectReturnCode::Accepted
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let mut remaining_length = self.protocol_name.bytes()
            + 1 // protocol_level
            + ConnectFlags::bytes()
            + U16Data::bytes()  // keep_alive
            + self.client_id.bytes();

        // Check username/password/topic/message.
        if self.connect_flags.will() {
            assert!(self.will_topic.is_some());
            if let Some(will_topic) = &self.will_topic {
                remaining_length += will_topic.bytes();
            }
            remaining_length += self.will_message.bytes();
        }
        if self.connect_flags.has_username() {
            remaining_length += self.username.bytes();
        }
        if self.connect_flags.has_password() {
            remaining_length += self.password.bytes();
        }
        FixedHeader::new(PacketType::Connect, remaining_length)
    }
}

impl EncodePacket for ConnectPacket {
    fn encode(&self, v: &mut Vec<u8>) -> Result<usize, EncodeError> {
        let old_len = v.len();

        // Write fixed header
        let fixed_header = self.get_fixed_header()?;
        fixed_header.encode(v)?;

        // Write variable header
        self.protocol_name.encode(v)?;
        v.push(self.protocol_level);
        self.connect_flags.encode(v)?;
        self.keep_alive.encode(v)?;

        // Write payload
        self.client_id.encode(v)?;
        if self.connect_flags.will() {
            assert!(self.will_topic.is_some());
            if let Some(will_topic) = &self.will_topic {
                will_topic.encode(v)?;
            }

            self.will_message.encode(v)?;
        }
        if self.connect_flags.has_username() {
            self.username.encode(v)?;
        }
        if self.connect_flags.has_password() {
            self.password.encode(v)?;
        }

        Ok(v.len() - old_len)
    }
}

impl DecodePacket for ConnectPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type() != PacketType::Connect {
            return Err(DecodeError::InvalidPacketType);
        }

        // Protocol name/version, the reserved bit, the username/password flag pairing,
        // the will-flag/qos/retain combination, and the empty-client-id/clean-session
        // combination are all cross-field CONNECT rules rather than decode failures: a
        // CONNECT packet decodes successfully whenever its wire shape is well-formed, and
        // `validate()` reports the connection-level outcome as a `ConnectReturnCode`.
        let protocol_name = StringData::decode(ba)?;

        let protocol_level = ba.read_byte()?;

        let connect_flags = ConnectFlags::decode(ba)?;

        let keep_alive = U16Data::decode(ba)?;

        // A Server MAY allow a Client to supply a ClientId that has a length of zero bytes,
        // however if it does so the Server MUST treat this as a special case and assign
        // a unique ClientId to that Client. It MUST then process the CONNECT packet
        // as if the Client had provided that unique ClientId [MQTT-3.1.3-6].
        let client_id = StringData::decode(ba)?;

        let will_topic = if connect_flags.will() {
            Some(PubTopic::decode(ba)?)
        } else {
            None
        };
        let will_message = if connect_flags.will() {
            BinaryData::decode(ba)?
        } else {
            BinaryData::new()
        };

        let username = if connect_flags.has_username() {
            StringData::decode(ba)?
        } else {
            StringData::new()
        };

        let password = if connect_flags.has_password() {
            BinaryData::decode(ba)?
        } else {
            BinaryData::new()
        };

        Ok(Self {
            protocol_name,
            protocol_level,
            connect_flags,
            keep_alive,
            client_id,
            will_topic,
            will_message,
            username,
            password,
        })
    }
}

impl VariantPacket for ConnectPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Connect
    }

    fn bytes(&self) -> Result<usize, VarIntError> {
        let fixed_header = self.get_fixed_header()?;
        Ok(fixed_header.bytes() + fixed_header.remaining_length())
    }
}

#[cfg(test)]
mod tests {
    use super::super::connect_ack::ConnectReturnCode;
    use super::{ByteArray, ConnectPacket, DecodePacket, EncodePacket};

    #[test]
    fn test_decode() {
        let buf: Vec<u8> = vec![
            16, 20, 0, 4, 77, 81, 84, 84, 4, 2, 0, 60, 0, 8, 119, 118, 80, 84, 88, 99, 67, 119,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba);
        assert!(packet.is_ok());
        let packet = packet.unwrap();
        assert_eq!(packet.client_id(), "wvPTXcCw");
        assert_eq!(packet.validate(), ConnectReturnCode::Accepted);
    }

    #[test]
    fn test_decode_bad_username_password_combination() {
        // username flag clear (bit 7), password flag set (bit 6): 0x40.
        let buf: Vec<u8> = vec![
            16, 12, 0, 4, 77, 81, 84, 84, 4, 0x40, 0, 60, 0, 0,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(
            packet.validate(),
            ConnectReturnCode::MalformedUsernamePassword
        );
    }

    #[test]
    fn test_decode_reserved_bit_set() {
        let buf: Vec<u8> = vec![
            16, 12, 0, 4, 77, 81, 84, 84, 4, 0b0000_0011, 0, 60, 0, 0,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.validate(), ConnectReturnCode::ProtocolViolation);
    }

    #[test]
    fn test_decode_unknown_protocol_name() {
        let buf: Vec<u8> = vec![
            16, 11, 0, 3, 65, 66, 67, 4, 2, 0, 60, 0, 0,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.validate(), ConnectReturnCode::ProtocolViolation);
    }

    #[test]
    fn test_decode_bad_protocol_version() {
        let buf: Vec<u8> = vec![
            16, 12, 0, 4, 77, 81, 84, 84, 6, 2, 0, 60, 0, 0,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.validate(), ConnectReturnCode::UnacceptedProtocol);
    }

    #[test]
    fn test_decode_empty_client_id_without_clean_session() {
        // clean-session bit clear: 0b0000_0000.
        let buf: Vec<u8> = vec![
            16, 12, 0, 4, 77, 81, 84, 84, 4, 0b0000_0000, 0, 60, 0, 0,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.validate(), ConnectReturnCode::IdentifierRejected);
    }

    #[test]
    fn test_decode_empty_client_id_with_clean_session_accepted() {
        let buf: Vec<u8> = vec![
            16, 12, 0, 4, 77, 81, 84, 84, 4, 0b0000_0010, 0, 60, 0, 0,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.validate(), ConnectReturnCode::Accepted);
    }

    #[test]
    fn test_decode_full_fixture() {
        use crate::QoS;

        let buf: Vec<u8> = vec![
            0x10, 0x2F, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0xF6, 0x01, 0x2C, 0x00, 0x04,
            0x74, 0x65, 0x73, 0x74, 0x00, 0x05, 0x2F, 0x74, 0x65, 0x73, 0x74, 0x00, 0x0B, 0x68,
            0x65, 0x6C, 0x6C, 0x6F, 0x2C, 0x77, 0x6F, 0x72, 0x6C, 0x64, 0x00, 0x03, 0x74, 0x6F,
            0x6D, 0x00, 0x04, 0x6D, 0x71, 0x74, 0x74,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();

        assert_eq!(packet.protocol_name(), "MQTT");
        assert_eq!(packet.protocol_level(), 4);
        assert!(packet.connect_flags().clean_session());
        assert!(packet.connect_flags().will());
        assert_eq!(packet.connect_flags().will_qos(), QoS::ExactOnce);
        assert!(packet.connect_flags().will_retain());
        assert!(packet.connect_flags().has_username());
        assert!(packet.connect_flags().has_password());
        assert!(!packet.connect_flags().reserved());
        assert_eq!(packet.keep_alive(), 300);
        assert_eq!(packet.client_id(), "test");
        assert_eq!(packet.will_topic(), Some("/test"));
        assert_eq!(packet.will_message(), b"hello,world");
        assert_eq!(packet.username(), "tom");
        assert_eq!(packet.password(), b"mqtt");
        assert_eq!(packet.validate(), ConnectReturnCode::Accepted);
    }

    #[test]
    fn test_round_trip_full_fixture() {
        use crate::QoS;

        const FIXTURE: [u8; 49] = [
            0x10, 0x2F, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0xF6, 0x01, 0x2C, 0x00, 0x04,
            0x74, 0x65, 0x73, 0x74, 0x00, 0x05, 0x2F, 0x74, 0x65, 0x73, 0x74, 0x00, 0x0B, 0x68,
            0x65, 0x6C, 0x6C, 0x6F, 0x2C, 0x77, 0x6F, 0x72, 0x6C, 0x64, 0x00, 0x03, 0x74, 0x6F,
            0x6D, 0x00, 0x04, 0x6D, 0x71, 0x74, 0x74,
        ];

        let mut packet = ConnectPacket::new("test").unwrap();
        packet.set_keep_alive(300);
        packet.set_will_topic("/test").unwrap();
        packet.set_will_message(b"hello,world").unwrap();
        packet.set_username("tom").unwrap();
        packet.set_password(b"mqtt").unwrap();

        let mut flags = packet.connect_flags().clone();
        flags.set_clean_session(true);
        flags.set_will(true);
        flags.set_will_qos(QoS::ExactOnce);
        flags.set_will_retain(true);
        flags.set_has_username(true);
        flags.set_has_password(true);
        packet.set_connect_flags(flags);

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &FIXTURE);

        let mut ba = ByteArray::new(&buf);
        let decoded = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(decoded, packet);
    }
}
