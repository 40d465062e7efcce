use std::num::NonZeroU16;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::utils::{Decode, Encode};
use super::disconnect::{decode_reason_packet, encode_reason_packet, reason_packet_size};
use crate::v5::PropertyList;

/// PUBACK/PUBREC message content
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PublishAck {
    /// Packet Identifier
    pub packet_id: NonZeroU16,
    pub reason_code: PublishAckReason,
    pub properties: PropertyList,
}

/// PUBREL/PUBCOMP message content
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PublishAck2 {
    /// Packet Identifier
    pub packet_id: NonZeroU16,
    pub reason_code: PublishAck2Reason,
    pub properties: PropertyList,
}

prim_enum! {
    /// PUBACK / PUBREC reason codes
    #[derive(serde::Deserialize, serde::Serialize)]
    pub enum PublishAckReason {
        Success = 0,
        NoMatchingSubscribers = 16,
        UnspecifiedError = 128,
        ImplementationSpecificError = 131,
        NotAuthorized = 135,
        TopicNameInvalid = 144,
        PacketIdentifierInUse = 145,
        QuotaExceeded = 151,
        PayloadFormatInvalid = 153
    }
}

prim_enum! {
    /// PUBREL / PUBCOMP reason codes
    #[derive(serde::Deserialize, serde::Serialize)]
    pub enum PublishAck2Reason {
        Success = 0,
        PacketIdNotFound = 146
    }
}

impl PublishAck {
    pub fn new(packet_id: NonZeroU16) -> Self {
        PublishAck {
            packet_id,
            reason_code: PublishAckReason::Success,
            properties: PropertyList::new(),
        }
    }

    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let packet_id = NonZeroU16::decode(src)?;
        let (reason_code, properties) =
            decode_reason_packet(src, PublishAckReason::Success, max_properties)?;
        Ok(PublishAck { packet_id, reason_code, properties })
    }
}

impl Encode for PublishAck {
    fn encoded_size(&self) -> usize {
        2 + reason_packet_size(&self.properties)
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u16(self.packet_id.get());
        encode_reason_packet(buf, self.reason_code.into(), &self.properties)
    }
}

impl PublishAck2 {
    pub fn new(packet_id: NonZeroU16) -> Self {
        PublishAck2 {
            packet_id,
            reason_code: PublishAck2Reason::Success,
            properties: PropertyList::new(),
        }
    }

    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let packet_id = NonZeroU16::decode(src)?;
        let (reason_code, properties) =
            decode_reason_packet(src, PublishAck2Reason::Success, max_properties)?;
        Ok(PublishAck2 { packet_id, reason_code, properties })
    }
}

impl Encode for PublishAck2 {
    fn encoded_size(&self) -> usize {
        2 + reason_packet_size(&self.properties)
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u16(self.packet_id.get());
        encode_reason_packet(buf, self.reason_code.into(), &self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"\x12\x43" ; "packet id only")]
    #[test_case(b"\x12\x43\x00" ; "with success code")]
    #[test_case(b"\x12\x43\x00\x00" ; "with empty properties")]
    fn test_success_forms(input: &[u8]) {
        let mut src = Bytes::copy_from_slice(input);
        let ack = PublishAck::decode(&mut src, 32).unwrap();
        assert_eq!(ack.packet_id.get(), 0x1243);
        assert_eq!(ack.reason_code, PublishAckReason::Success);
        assert!(ack.properties.is_empty());
    }

    #[test]
    fn test_success_encoding() {
        let ack = PublishAck::new(NonZeroU16::new(0x1243).unwrap());
        let mut buf = BytesMut::new();
        ack.encode(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"\x12\x43\x00");
        assert_eq!(ack.encoded_size(), 3);
    }

    #[test]
    fn test_reason_code_round_trip() {
        let mut ack = PublishAck::new(NonZeroU16::new(1).unwrap());
        ack.reason_code = PublishAckReason::QuotaExceeded;

        let mut buf = BytesMut::new();
        ack.encode(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"\x00\x01\x97");

        let decoded = PublishAck::decode(&mut buf.freeze(), 32).unwrap();
        assert_eq!(decoded, ack);
    }

    #[test]
    fn test_release_unknown_reason_code() {
        let mut src = Bytes::from_static(b"\x00\x01\x80");
        assert!(matches!(PublishAck2::decode(&mut src, 32), Err(DecodeError::MalformedPacket)));
    }
}
