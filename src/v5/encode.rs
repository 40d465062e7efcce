use bytes::{BufMut, BytesMut};

use super::packet::*;
use crate::error::EncodeError;
use crate::utils::{write_variable_length, Encode};

/// Size of the packet content, excluding the fixed header.
pub(super) fn encoded_size(packet: &Packet) -> usize {
    match packet {
        Packet::Connect(pkt) => pkt.encoded_size(),
        Packet::ConnectAck(pkt) => pkt.encoded_size(),
        Packet::Publish(pkt) => pkt.encoded_size(),
        Packet::PublishAck(pkt) | Packet::PublishReceived(pkt) => pkt.encoded_size(),
        Packet::PublishRelease(pkt) | Packet::PublishComplete(pkt) => pkt.encoded_size(),
        Packet::Subscribe(pkt) => pkt.encoded_size(),
        Packet::SubscribeAck(pkt) => pkt.encoded_size(),
        Packet::Unsubscribe(pkt) => pkt.encoded_size(),
        Packet::UnsubscribeAck(pkt) => pkt.encoded_size(),
        Packet::PingRequest | Packet::PingResponse => 0,
        Packet::Disconnect(pkt) => pkt.encoded_size(),
        Packet::Auth(pkt) => pkt.encoded_size(),
    }
}

pub(super) fn encode(packet: &Packet, dst: &mut BytesMut, content_size: u32) -> Result<(), EncodeError> {
    dst.put_u8(packet.packet_type());
    write_variable_length(content_size, dst)?;

    match packet {
        Packet::Connect(pkt) => pkt.encode(dst),
        Packet::ConnectAck(pkt) => pkt.encode(dst),
        Packet::Publish(pkt) => pkt.encode(dst),
        Packet::PublishAck(pkt) | Packet::PublishReceived(pkt) => pkt.encode(dst),
        Packet::PublishRelease(pkt) | Packet::PublishComplete(pkt) => pkt.encode(dst),
        Packet::Subscribe(pkt) => pkt.encode(dst),
        Packet::SubscribeAck(pkt) => pkt.encode(dst),
        Packet::Unsubscribe(pkt) => pkt.encode(dst),
        Packet::UnsubscribeAck(pkt) => pkt.encode(dst),
        Packet::PingRequest | Packet::PingResponse => Ok(()),
        Packet::Disconnect(pkt) => pkt.encode(dst),
        Packet::Auth(pkt) => pkt.encode(dst),
    }
}
