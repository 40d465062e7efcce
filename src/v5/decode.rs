use bytes::Bytes;

use super::packet::*;
use crate::error::DecodeError;
use crate::types::packet_type;

pub(super) fn decode_packet(
    mut src: Bytes,
    first_byte: u8,
    max_properties: usize,
) -> Result<Packet, DecodeError> {
    match first_byte {
        packet_type::PUBLISH_START..=packet_type::PUBLISH_END => {
            Ok(Packet::Publish(Publish::decode(&mut src, first_byte & 0b0000_1111, max_properties)?))
        }
        packet_type::PUBACK => Ok(Packet::PublishAck(PublishAck::decode(&mut src, max_properties)?)),
        packet_type::PINGREQ => Ok(Packet::PingRequest),
        packet_type::PINGRESP => Ok(Packet::PingResponse),
        packet_type::SUBSCRIBE => Ok(Packet::Subscribe(Subscribe::decode(&mut src, max_properties)?)),
        packet_type::SUBACK => Ok(Packet::SubscribeAck(SubscribeAck::decode(&mut src, max_properties)?)),
        packet_type::UNSUBSCRIBE => {
            Ok(Packet::Unsubscribe(Unsubscribe::decode(&mut src, max_properties)?))
        }
        packet_type::UNSUBACK => {
            Ok(Packet::UnsubscribeAck(UnsubscribeAck::decode(&mut src, max_properties)?))
        }
        packet_type::CONNECT => Ok(Packet::Connect(Box::new(Connect::decode(&mut src, max_properties)?))),
        packet_type::CONNACK => {
            Ok(Packet::ConnectAck(Box::new(ConnectAck::decode(&mut src, max_properties)?)))
        }
        packet_type::DISCONNECT => Ok(Packet::Disconnect(Disconnect::decode(&mut src, max_properties)?)),
        packet_type::AUTH => Ok(Packet::Auth(Auth::decode(&mut src, max_properties)?)),
        packet_type::PUBREC => Ok(Packet::PublishReceived(PublishAck::decode(&mut src, max_properties)?)),
        packet_type::PUBREL => Ok(Packet::PublishRelease(PublishAck2::decode(&mut src, max_properties)?)),
        packet_type::PUBCOMP => {
            Ok(Packet::PublishComplete(PublishAck2::decode(&mut src, max_properties)?))
        }
        _ => Err(DecodeError::UnsupportedPacketType),
    }
}
