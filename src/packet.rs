// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::v3::{
    ConnectAckPacket, ConnectPacket, DisconnectPacket, PingRequestPacket, PingResponsePacket,
    PublishAckPacket, PublishCompletePacket, PublishPacket, PublishReceivedPacket,
    PublishReleasePacket, SubscribeAckPacket, SubscribePacket, UnsubscribeAckPacket,
    UnsubscribePacket,
};
use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, VarIntError,
    VariantPacket,
};

/// Sum type over every MQTT v3.1.1 control packet.
///
/// Each packet type carries its own decode/encode logic; this enum only dispatches
/// to the right one based on the fixed header's packet type nibble.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    Connect(ConnectPacket),
    ConnectAck(ConnectAckPacket),
    Publish(PublishPacket),
    PublishAck(PublishAckPacket),
    PublishReceived(PublishReceivedPacket),
    PublishRelease(PublishReleasePacket),
    PublishComplete(PublishCompletePacket),
    Subscribe(SubscribePacket),
    SubscribeAck(SubscribeAckPacket),
    Unsubscribe(UnsubscribePacket),
    UnsubscribeAck(UnsubscribeAckPacket),
    PingRequest(PingRequestPacket),
    PingResponse(PingResponsePacket),
    Disconnect(DisconnectPacket),
}

impl Packet {
    /// Construct the default value of the packet variant named by `message_type`,
    /// the type nibble found in the top 4 bits of a fixed header's first byte
    /// (`1` for CONNECT through `14` for DISCONNECT).
    ///
    /// # Errors
    ///
    /// Returns error if `message_type` is 0, 15, or greater than 14.
    pub fn empty(message_type: u8) -> Result<Self, DecodeError> {
        match message_type {
            1 => Ok(Self::Connect(ConnectPacket::default())),
            2 => Ok(Self::ConnectAck(ConnectAckPacket::default())),
            3 => Ok(Self::Publish(PublishPacket::default())),
            4 => Ok(Self::PublishAck(PublishAckPacket::default())),
            5 => Ok(Self::PublishReceived(PublishReceivedPacket::default())),
            6 => Ok(Self::PublishRelease(PublishReleasePacket::default())),
            7 => Ok(Self::PublishComplete(PublishCompletePacket::default())),
            8 => Ok(Self::Subscribe(SubscribePacket::default())),
            9 => Ok(Self::SubscribeAck(SubscribeAckPacket::default())),
            10 => Ok(Self::Unsubscribe(UnsubscribePacket::default())),
            11 => Ok(Self::UnsubscribeAck(UnsubscribeAckPacket::default())),
            12 => Ok(Self::PingRequest(PingRequestPacket::default())),
            13 => Ok(Self::PingResponse(PingResponsePacket::default())),
            14 => Ok(Self::Disconnect(DisconnectPacket::default())),
            _ => Err(DecodeError::InvalidPacketType),
        }
    }

    /// Packet type nibble, as it appears in the fixed header.
    #[must_use]
    pub const fn packet_type(&self) -> u8 {
        match self {
            Self::Connect(_) => 1,
            Self::ConnectAck(_) => 2,
            Self::Publish(_) => 3,
            Self::PublishAck(_) => 4,
            Self::PublishReceived(_) => 5,
            Self::PublishRelease(_) => 6,
            Self::PublishComplete(_) => 7,
            Self::Subscribe(_) => 8,
            Self::SubscribeAck(_) => 9,
            Self::Unsubscribe(_) => 10,
            Self::UnsubscribeAck(_) => 11,
            Self::PingRequest(_) => 12,
            Self::PingResponse(_) => 13,
            Self::Disconnect(_) => 14,
        }
    }

    /// Reset the packet to the default value of its own variant, keeping the tag.
    ///
    /// A caller pooling `Packet` values calls this before returning one to the
    /// pool instead of allocating a fresh value on the next `Packet::empty`.
    pub fn reset(&mut self) {
        match self {
            Self::Connect(p) => *p = Default::default(),
            Self::ConnectAck(p) => *p = Default::default(),
            Self::Publish(p) => *p = Default::default(),
            Self::PublishAck(p) => *p = Default::default(),
            Self::PublishReceived(p) => *p = Default::default(),
            Self::PublishRelease(p) => *p = Default::default(),
            Self::PublishComplete(p) => *p = Default::default(),
            Self::Subscribe(p) => *p = Default::default(),
            Self::SubscribeAck(p) => *p = Default::default(),
            Self::Unsubscribe(p) => *p = Default::default(),
            Self::UnsubscribeAck(p) => *p = Default::default(),
            Self::PingRequest(p) => *p = Default::default(),
            Self::PingResponse(p) => *p = Default::default(),
            Self::Disconnect(p) => *p = Default::default(),
        }
    }

    /// Total encoded length of this packet, fixed header included.
    ///
    /// # Errors
    ///
    /// Returns error if the packet's remaining length overflows a Variable Byte
    /// Integer (larger than 256MB).
    pub fn bytes(&self) -> Result<usize, VarIntError> {
        match self {
            Self::Connect(p) => p.bytes(),
            Self::ConnectAck(p) => p.bytes(),
            Self::Publish(p) => p.bytes(),
            Self::PublishAck(p) => p.bytes(),
            Self::PublishReceived(p) => p.bytes(),
            Self::PublishRelease(p) => p.bytes(),
            Self::PublishComplete(p) => p.bytes(),
            Self::Subscribe(p) => p.bytes(),
            Self::SubscribeAck(p) => p.bytes(),
            Self::Unsubscribe(p) => p.bytes(),
            Self::UnsubscribeAck(p) => p.bytes(),
            Self::PingRequest(p) => p.bytes(),
            Self::PingResponse(p) => p.bytes(),
            Self::Disconnect(p) => p.bytes(),
        }
    }
}

impl Packet {
    /// Decode one packet, rejecting it up front if the fixed header's remaining
    /// length announces more than `max_len` bytes of body.
    ///
    /// This is the only caller-supplied knob the decoder has: everything else
    /// about a packet's shape comes from the bytes themselves.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::PacketTooLarge` if remaining length exceeds `max_len`,
    /// or any error `decode` itself would return.
    pub fn decode_with_limit(ba: &mut ByteArray, max_len: usize) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.remaining_length() > max_len {
            return Err(DecodeError::PacketTooLarge);
        }
        ba.reset_offset();
        Self::decode(ba)
    }
}

impl DecodePacket for Packet {
    /// Decode exactly one control packet starting at offset 0 of `ba`.
    ///
    /// # Errors
    ///
    /// Returns error if the fixed header type nibble is reserved (0 or 15), or if
    /// the matched packet type's own decode fails.
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let flag = ba.read_byte()?;
        let message_type = (flag & 0b1111_0000) >> 4;
        ba.reset_offset();
        match message_type {
            1 => Ok(Self::Connect(ConnectPacket::decode(ba)?)),
            2 => Ok(Self::ConnectAck(ConnectAckPacket::decode(ba)?)),
            3 => Ok(Self::Publish(PublishPacket::decode(ba)?)),
            4 => Ok(Self::PublishAck(PublishAckPacket::decode(ba)?)),
            5 => Ok(Self::PublishReceived(PublishReceivedPacket::decode(ba)?)),
            6 => Ok(Self::PublishRelease(PublishReleasePacket::decode(ba)?)),
            7 => Ok(Self::PublishComplete(PublishCompletePacket::decode(ba)?)),
            8 => Ok(Self::Subscribe(SubscribePacket::decode(ba)?)),
            9 => Ok(Self::SubscribeAck(SubscribeAckPacket::decode(ba)?)),
            10 => Ok(Self::Unsubscribe(UnsubscribePacket::decode(ba)?)),
            11 => Ok(Self::UnsubscribeAck(UnsubscribeAckPacket::decode(ba)?)),
            12 => Ok(Self::PingRequest(PingRequestPacket::decode(ba)?)),
            13 => Ok(Self::PingResponse(PingResponsePacket::decode(ba)?)),
            14 => Ok(Self::Disconnect(DisconnectPacket::decode(ba)?)),
            _ => Err(DecodeError::InvalidPacketType),
        }
    }
}

impl EncodePacket for Packet {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        match self {
            Self::Connect(p) => p.encode(buf),
            Self::ConnectAck(p) => p.encode(buf),
            Self::Publish(p) => p.encode(buf),
            Self::PublishAck(p) => p.encode(buf),
            Self::PublishReceived(p) => p.encode(buf),
            Self::PublishRelease(p) => p.encode(buf),
            Self::PublishComplete(p) => p.encode(buf),
            Self::Subscribe(p) => p.encode(buf),
            Self::SubscribeAck(p) => p.encode(buf),
            Self::Unsubscribe(p) => p.encode(buf),
            Self::UnsubscribeAck(p) => p.encode(buf),
            Self::PingRequest(p) => p.encode(buf),
            Self::PingResponse(p) => p.encode(buf),
            Self::Disconnect(p) => p.encode(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Packet;
    use crate::v3::PingRequestPacket;
    use crate::{ByteArray, DecodePacket, EncodePacket};

    #[test]
    fn test_round_trip() {
        let packet = Packet::PingRequest(PingRequestPacket::new());
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0xC0, 0x00]);

        let mut ba = ByteArray::new(&buf);
        let decoded = Packet::decode(&mut ba).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.packet_type(), 12);
    }

    #[test]
    fn test_empty() {
        assert!(Packet::empty(1).is_ok());
        assert!(Packet::empty(0).is_err());
        assert!(Packet::empty(15).is_err());
    }

    #[test]
    fn test_reset_keeps_variant() {
        use crate::v3::PublishAckPacket;
        use crate::PacketId;

        let mut packet = Packet::PublishAck(PublishAckPacket::new(PacketId::new(99)));
        packet.reset();
        assert_eq!(
            packet,
            Packet::PublishAck(PublishAckPacket::new(PacketId::new(0)))
        );
    }

    #[test]
    fn test_decode_with_limit() {
        use crate::v3::PublishAckPacket;
        use crate::PacketId;

        let packet = Packet::PublishAck(PublishAckPacket::new(PacketId::new(7)));
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();

        let mut ba = ByteArray::new(&buf);
        assert!(Packet::decode_with_limit(&mut ba, 2).is_ok());

        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            Packet::decode_with_limit(&mut ba, 1),
            Err(crate::DecodeError::PacketTooLarge)
        );
    }
}
