// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Encoder and decoder for MQTT v3.1/v3.1.1 control packets.
//!
//! This crate only implements the wire codec: turning a byte buffer into a typed
//! [`Packet`] and back. It does not open sockets, run an event loop, or keep any
//! session state beyond what a single control packet carries.

mod base;
mod binary_data;
mod bool_data;
mod byte_array;
mod connect_flags;
mod error;
mod header;
mod keep_alive;
mod packet;
mod string_data;
mod string_pair_data;
pub mod topic;
mod u16_data;
mod u32_data;
pub mod utils;
pub mod v3;
mod var_int;

pub use base::{DecodePacket, EncodePacket, PacketId, QoS};
pub use binary_data::BinaryData;
pub use bool_data::BoolData;
pub use byte_array::{ByteArray, ByteArrayError};
pub use connect_flags::ConnectFlags;
pub use error::{DecodeError, EncodeError};
pub use header::{FixedHeader, PacketType, VariantPacket};
pub use keep_alive::{validate_keep_alive, KeepAlive};
pub use packet::Packet;
pub use string_data::StringData;
pub use string_pair_data::StringPairData;
pub use topic::{PubTopic, SubTopic};
pub use u16_data::U16Data;
pub use u32_data::U32Data;
pub use var_int::{VarInt, VarIntError, MAX_PACKET_LEN};

pub use v3::{
    ConnectAckPacket, ConnectPacket, ConnectReturnCode, DisconnectPacket, PingRequestPacket,
    PingResponsePacket, PublishAckPacket, PublishCompletePacket, PublishPacket,
    PublishReceivedPacket, PublishReleasePacket, SubscribeAck, SubscribeAckPacket,
    SubscribePacket, SubscribeTopic, UnsubscribeAckPacket, UnsubscribePacket,
};
