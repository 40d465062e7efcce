use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::utils::Encode;
use crate::v5::PropertyList;

/// DISCONNECT message
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Disconnect {
    pub reason_code: DisconnectReasonCode,
    pub properties: PropertyList,
}

prim_enum! {
    /// DISCONNECT reason codes
    #[derive(serde::Deserialize, serde::Serialize)]
    pub enum DisconnectReasonCode {
        NormalDisconnection = 0,
        DisconnectWithWillMessage = 4,
        UnspecifiedError = 128,
        MalformedPacket = 129,
        ProtocolError = 130,
        ImplementationSpecificError = 131,
        NotAuthorized = 135,
        ServerBusy = 137,
        ServerShuttingDown = 139,
        BadAuthenticationMethod = 140,
        KeepAliveTimeout = 141,
        SessionTakenOver = 142,
        TopicFilterInvalid = 143,
        TopicNameInvalid = 144,
        ReceiveMaximumExceeded = 147,
        TopicAliasInvalid = 148,
        PacketTooLarge = 149,
        MessageRateTooHigh = 150,
        QuotaExceeded = 151,
        AdministrativeAction = 152,
        PayloadFormatInvalid = 153,
        RetainNotSupported = 154,
        QosNotSupported = 155,
        UseAnotherServer = 156,
        ServerMoved = 157,
        SharedSubscriptionNotSupported = 158,
        ConnectionRateExceeded = 159,
        MaximumConnectTime = 160,
        SubscriptionIdentifiersNotSupported = 161,
        WildcardSubscriptionsNotSupported = 162
    }
}

impl Default for Disconnect {
    fn default() -> Self {
        Disconnect {
            reason_code: DisconnectReasonCode::NormalDisconnection,
            properties: PropertyList::new(),
        }
    }
}

impl Disconnect {
    pub fn new(reason_code: DisconnectReasonCode) -> Self {
        Disconnect { reason_code, properties: PropertyList::new() }
    }

    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let (reason_code, properties) =
            decode_reason_packet(src, DisconnectReasonCode::NormalDisconnection, max_properties)?;
        Ok(Disconnect { reason_code, properties })
    }
}

impl Encode for Disconnect {
    fn encoded_size(&self) -> usize {
        reason_packet_size(&self.properties)
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        encode_reason_packet(buf, self.reason_code.into(), &self.properties)
    }
}

/// Decodes the graduated reason-code form shared by DISCONNECT and AUTH.
///
/// A remaining length of zero means the default reason code and no
/// properties, one byte carries only the reason code, and anything longer
/// carries the reason code followed by a property region.
pub(super) fn decode_reason_packet<R: TryFrom<u8, Error = DecodeError>>(
    src: &mut Bytes,
    default: R,
    max_properties: usize,
) -> Result<(R, PropertyList), DecodeError> {
    if !src.has_remaining() {
        return Ok((default, PropertyList::new()));
    }
    let reason_code = src.get_u8().try_into()?;
    let properties =
        if src.has_remaining() { PropertyList::decode(src, max_properties)? } else { PropertyList::new() };
    ensure!(!src.has_remaining(), DecodeError::InvalidLength); // trailing garbage after the property region
    Ok((reason_code, properties))
}

/// The reason code is always written; an empty property region is dropped
/// from the tail (decoders treat the missing region as an empty list).
pub(super) fn reason_packet_size(properties: &PropertyList) -> usize {
    if properties.is_empty() {
        1
    } else {
        1 + properties.encoded_size()
    }
}

pub(super) fn encode_reason_packet(
    buf: &mut BytesMut,
    reason_code: u8,
    properties: &PropertyList,
) -> Result<(), EncodeError> {
    buf.put_u8(reason_code);
    if !properties.is_empty() {
        properties.encode(buf)?;
    }
    Ok(())
}
