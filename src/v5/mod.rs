//! MQTT v5 Protocol codec

mod codec;
mod decode;
mod encode;
mod packet;
pub(crate) mod property;

pub use codec::Codec;
pub use packet::{
    Auth, AuthReasonCode, Connect, ConnectAck, ConnectAckReason, Disconnect, DisconnectReasonCode,
    LastWill, Packet, Publish, PublishAck, PublishAck2, PublishAck2Reason, PublishAckReason,
    RetainHandling, Subscribe, SubscribeAck, SubscribeAckReason, SubscriptionOptions, Unsubscribe,
    UnsubscribeAck, UnsubscribeAckReason,
};
pub use property::{
    Property, PropertyId, PropertyList, PropertyValue, ValueKind, DEFAULT_MAX_PROPERTIES,
};
