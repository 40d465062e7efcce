use std::num::NonZeroU16;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use bytestring::ByteString;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::types::QoS;
use crate::utils::{Decode, Encode};
use crate::v5::PropertyList;

/// Represents SUBSCRIBE packet
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Subscribe {
    /// Packet Identifier
    pub packet_id: NonZeroU16,
    pub properties: PropertyList,
    /// the list of Topic Filters and Subscription Options to which the Client wants to subscribe.
    pub topic_filters: Vec<(ByteString, SubscriptionOptions)>,
}

/// Represents SUBACK packet
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct SubscribeAck {
    pub packet_id: NonZeroU16,
    pub properties: PropertyList,
    /// corresponds to a Topic Filter in the SUBSCRIBE Packet being acknowledged.
    pub status: Vec<SubscribeAckReason>,
}

/// Represents UNSUBSCRIBE packet
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Unsubscribe {
    /// Packet Identifier
    pub packet_id: NonZeroU16,
    pub properties: PropertyList,
    /// the list of Topic Filters that the Client wishes to unsubscribe from.
    pub topic_filters: Vec<ByteString>,
}

/// Represents UNSUBACK packet
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct UnsubscribeAck {
    /// Packet Identifier
    pub packet_id: NonZeroU16,
    pub properties: PropertyList,
    pub status: Vec<UnsubscribeAckReason>,
}

/// Subscription Options
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub struct SubscriptionOptions {
    pub qos: QoS,
    /// do not receive messages published by this client itself
    pub no_local: bool,
    /// keep the RETAIN flag of forwarded application messages
    pub retain_as_published: bool,
    pub retain_handling: RetainHandling,
}

prim_enum! {
    /// Retain Handling
    #[derive(serde::Deserialize, serde::Serialize)]
    pub enum RetainHandling {
        /// Send retained messages at the time of the subscribe
        AtSubscribe = 0,
        /// Send retained messages at subscribe only if the subscription does not currently exist
        AtSubscribeNew = 1,
        /// Do not send retained messages at the time of the subscribe
        NoAtSubscribe = 2
    }
}

prim_enum! {
    /// SUBACK reason codes
    #[derive(serde::Deserialize, serde::Serialize)]
    pub enum SubscribeAckReason {
        GrantedQos0 = 0,
        GrantedQos1 = 1,
        GrantedQos2 = 2,
        UnspecifiedError = 128,
        ImplementationSpecificError = 131,
        NotAuthorized = 135,
        TopicFilterInvalid = 143,
        PacketIdentifierInUse = 145,
        QuotaExceeded = 151,
        SharedSubscriptionNotSupported = 158,
        SubscriptionIdentifiersNotSupported = 161,
        WildcardSubscriptionsNotSupported = 162
    }
}

prim_enum! {
    /// UNSUBACK reason codes
    #[derive(serde::Deserialize, serde::Serialize)]
    pub enum UnsubscribeAckReason {
        Success = 0,
        NoSubscriptionExisted = 17,
        UnspecifiedError = 128,
        ImplementationSpecificError = 131,
        NotAuthorized = 135,
        TopicFilterInvalid = 143,
        PacketIdentifierInUse = 145
    }
}

impl SubscriptionOptions {
    fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        ensure!(byte & 0b1100_0000 == 0, DecodeError::MalformedPacket); // reserved bits
        Ok(SubscriptionOptions {
            qos: QoS::try_from(byte & 0b0000_0011)?,
            no_local: byte & 0b0000_0100 != 0,
            retain_as_published: byte & 0b0000_1000 != 0,
            retain_handling: RetainHandling::try_from((byte & 0b0011_0000) >> 4)?,
        })
    }

    fn to_byte(self) -> u8 {
        u8::from(self.qos)
            | u8::from(self.no_local) << 2
            | u8::from(self.retain_as_published) << 3
            | u8::from(self.retain_handling) << 4
    }
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        SubscriptionOptions {
            qos: QoS::AtMostOnce,
            no_local: false,
            retain_as_published: false,
            retain_handling: RetainHandling::AtSubscribe,
        }
    }
}

impl Subscribe {
    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let packet_id = NonZeroU16::decode(src)?;
        let properties = PropertyList::decode(src, max_properties)?;

        let mut topic_filters = Vec::new();
        ensure!(src.has_remaining(), DecodeError::InvalidLength); // at least one filter required
        while src.has_remaining() {
            let topic = ByteString::decode(src)?;
            ensure!(src.has_remaining(), DecodeError::InvalidLength);
            topic_filters.push((topic, SubscriptionOptions::from_byte(src.get_u8())?));
        }

        Ok(Subscribe { packet_id, properties, topic_filters })
    }
}

impl Encode for Subscribe {
    fn encoded_size(&self) -> usize {
        2 + self.properties.encoded_size()
            + self.topic_filters.iter().map(|(t, _)| t.encoded_size() + 1).sum::<usize>()
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u16(self.packet_id.get());
        self.properties.encode(buf)?;
        for (filter, options) in &self.topic_filters {
            filter.encode(buf)?;
            buf.put_u8(options.to_byte());
        }
        Ok(())
    }
}

impl SubscribeAck {
    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let packet_id = NonZeroU16::decode(src)?;
        let properties = PropertyList::decode(src, max_properties)?;
        let status =
            src.as_ref().iter().map(|&code| code.try_into()).collect::<Result<Vec<_>, _>>()?;
        src.advance(src.remaining());
        Ok(SubscribeAck { packet_id, properties, status })
    }
}

impl Encode for SubscribeAck {
    fn encoded_size(&self) -> usize {
        2 + self.properties.encoded_size() + self.status.len()
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u16(self.packet_id.get());
        self.properties.encode(buf)?;
        for &reason in &self.status {
            buf.put_u8(reason.into());
        }
        Ok(())
    }
}

impl Unsubscribe {
    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let packet_id = NonZeroU16::decode(src)?;
        let properties = PropertyList::decode(src, max_properties)?;

        let mut topic_filters = Vec::new();
        ensure!(src.has_remaining(), DecodeError::InvalidLength);
        while src.has_remaining() {
            topic_filters.push(ByteString::decode(src)?);
        }

        Ok(Unsubscribe { packet_id, properties, topic_filters })
    }
}

impl Encode for Unsubscribe {
    fn encoded_size(&self) -> usize {
        2 + self.properties.encoded_size()
            + self.topic_filters.iter().map(|t| t.encoded_size()).sum::<usize>()
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u16(self.packet_id.get());
        self.properties.encode(buf)?;
        for filter in &self.topic_filters {
            filter.encode(buf)?;
        }
        Ok(())
    }
}

impl UnsubscribeAck {
    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let packet_id = NonZeroU16::decode(src)?;
        let properties = PropertyList::decode(src, max_properties)?;
        let status =
            src.as_ref().iter().map(|&code| code.try_into()).collect::<Result<Vec<_>, _>>()?;
        src.advance(src.remaining());
        Ok(UnsubscribeAck { packet_id, properties, status })
    }
}

impl Encode for UnsubscribeAck {
    fn encoded_size(&self) -> usize {
        2 + self.properties.encoded_size() + self.status.len()
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u16(self.packet_id.get());
        self.properties.encode(buf)?;
        for &reason in &self.status {
            buf.put_u8(reason.into());
        }
        Ok(())
    }
}
