use std::num::NonZeroU16;

use bytes::{Bytes, BytesMut};
use bytestring::ByteString;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::types::QoS;
use crate::utils::{Decode, Encode};
use crate::v5::PropertyList;

/// PUBLISH message
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Publish {
    /// this might be re-delivery of an earlier attempt to send the Packet.
    pub dup: bool,
    pub retain: bool,
    pub qos: QoS,
    /// the information channel to which payload data is published.
    pub topic: ByteString,
    /// only present in PUBLISH Packets where the QoS level is 1 or 2.
    pub packet_id: Option<NonZeroU16>,
    pub properties: PropertyList,
    /// the Application Message that is being published.
    pub payload: Bytes,
}

impl Publish {
    pub(crate) fn decode(
        src: &mut Bytes,
        packet_flags: u8,
        max_properties: usize,
    ) -> Result<Self, DecodeError> {
        let topic = ByteString::decode(src)?;
        let qos = QoS::try_from((packet_flags & 0b0110) >> 1)?;
        let packet_id = if qos == QoS::AtMostOnce {
            None
        } else {
            // packet id must be non-zero
            Some(NonZeroU16::decode(src)?)
        };
        let properties = PropertyList::decode(src, max_properties)?;

        Ok(Publish {
            dup: (packet_flags & 0b1000) == 0b1000,
            qos,
            retain: (packet_flags & 0b0001) == 0b0001,
            topic,
            packet_id,
            properties,
            payload: src.split_off(0),
        })
    }

    pub(crate) fn packet_flags(&self) -> u8 {
        let mut flags = u8::from(self.qos) << 1;
        if self.dup {
            flags |= 0b1000;
        }
        if self.retain {
            flags |= 0b0001;
        }
        flags
    }
}

impl Encode for Publish {
    fn encoded_size(&self) -> usize {
        self.topic.encoded_size()
            + if self.qos == QoS::AtMostOnce { 0 } else { 2 }
            + self.properties.encoded_size()
            + self.payload.len()
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        self.topic.encode(buf)?;
        match (self.qos, self.packet_id) {
            (QoS::AtMostOnce, _) => (),
            (_, Some(packet_id)) => packet_id.encode(buf)?,
            (_, None) => return Err(EncodeError::PacketIdRequired),
        }
        self.properties.encode(buf)?;
        buf.extend_from_slice(self.payload.as_ref());
        Ok(())
    }
}
