//! MQTT v5 extensible property (TLV) engine.
//!
//! Every v5 property is an (identifier, value) pair. The identifier registry
//! is fixed by the protocol: each identifier has exactly one legal value
//! shape, and a decoder that meets the wrong shape must fail rather than
//! guess. Property lists carry their own cumulative encoded length because
//! the list is prefixed by that length (as a variable-byte integer) on the
//! wire.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use bytestring::ByteString;
use serde::{Deserialize, Serialize};

use crate::error::{CapacityError, DecodeError, EncodeError};
use crate::types::MAX_PACKET_SIZE;
use crate::utils::{
    self, decode_variable_length_cursor, var_int_len_u32, write_variable_length, Decode, Encode,
};

/// Default decode-side bound on entries per property list.
pub const DEFAULT_MAX_PROPERTIES: usize = 32;

prim_enum! {
    /// Property identifier registry.
    ///
    /// Identifiers are variable-byte integers on the wire, though every
    /// registered value fits in a single byte.
    #[derive(serde::Serialize, serde::Deserialize, Hash)]
    pub enum PropertyId {
        PayloadFormatIndicator = 0x01,
        MessageExpiryInterval = 0x02,
        ContentType = 0x03,
        ResponseTopic = 0x08,
        CorrelationData = 0x09,
        SubscriptionIdentifier = 0x0B,
        SessionExpiryInterval = 0x11,
        AssignedClientIdentifier = 0x12,
        ServerKeepAlive = 0x13,
        AuthenticationMethod = 0x15,
        AuthenticationData = 0x16,
        RequestProblemInformation = 0x17,
        WillDelayInterval = 0x18,
        RequestResponseInformation = 0x19,
        ResponseInformation = 0x1A,
        ServerReference = 0x1C,
        ReasonString = 0x1F,
        ReceiveMaximum = 0x21,
        TopicAliasMaximum = 0x22,
        TopicAlias = 0x23,
        MaximumQos = 0x24,
        RetainAvailable = 0x25,
        UserProperty = 0x26,
        MaximumPacketSize = 0x27,
        WildcardSubscriptionAvailable = 0x28,
        SubscriptionIdentifiersAvailable = 0x29,
        SharedSubscriptionAvailable = 0x2A
    }
}

/// The seven value shapes a property may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Byte,
    TwoByteInt,
    FourByteInt,
    VarInt,
    Utf8String,
    BinaryData,
    StringPair,
}

impl PropertyId {
    /// The single legal value shape for this identifier.
    pub fn value_kind(self) -> ValueKind {
        match self {
            PropertyId::PayloadFormatIndicator
            | PropertyId::RequestProblemInformation
            | PropertyId::RequestResponseInformation
            | PropertyId::MaximumQos
            | PropertyId::RetainAvailable
            | PropertyId::WildcardSubscriptionAvailable
            | PropertyId::SubscriptionIdentifiersAvailable
            | PropertyId::SharedSubscriptionAvailable => ValueKind::Byte,
            PropertyId::ServerKeepAlive
            | PropertyId::ReceiveMaximum
            | PropertyId::TopicAliasMaximum
            | PropertyId::TopicAlias => ValueKind::TwoByteInt,
            PropertyId::MessageExpiryInterval
            | PropertyId::SessionExpiryInterval
            | PropertyId::WillDelayInterval
            | PropertyId::MaximumPacketSize => ValueKind::FourByteInt,
            PropertyId::SubscriptionIdentifier => ValueKind::VarInt,
            PropertyId::ContentType
            | PropertyId::ResponseTopic
            | PropertyId::AssignedClientIdentifier
            | PropertyId::AuthenticationMethod
            | PropertyId::ResponseInformation
            | PropertyId::ServerReference
            | PropertyId::ReasonString => ValueKind::Utf8String,
            PropertyId::CorrelationData | PropertyId::AuthenticationData => ValueKind::BinaryData,
            PropertyId::UserProperty => ValueKind::StringPair,
        }
    }
}

/// A decoded property value, tagged with its wire shape.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub enum PropertyValue {
    Byte(u8),
    TwoByteInt(u16),
    FourByteInt(u32),
    VarInt(u32),
    Utf8String(ByteString),
    BinaryData(Bytes),
    StringPair(ByteString, ByteString),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Byte(_) => ValueKind::Byte,
            PropertyValue::TwoByteInt(_) => ValueKind::TwoByteInt,
            PropertyValue::FourByteInt(_) => ValueKind::FourByteInt,
            PropertyValue::VarInt(_) => ValueKind::VarInt,
            PropertyValue::Utf8String(_) => ValueKind::Utf8String,
            PropertyValue::BinaryData(_) => ValueKind::BinaryData,
            PropertyValue::StringPair(..) => ValueKind::StringPair,
        }
    }

    fn decode_kind(kind: ValueKind, src: &mut Bytes) -> Result<Self, DecodeError> {
        let value = match kind {
            ValueKind::Byte => PropertyValue::Byte(u8::decode(src)?),
            ValueKind::TwoByteInt => PropertyValue::TwoByteInt(u16::decode(src)?),
            ValueKind::FourByteInt => PropertyValue::FourByteInt(u32::decode(src)?),
            ValueKind::VarInt => PropertyValue::VarInt(decode_variable_length_cursor(src)?),
            ValueKind::Utf8String => PropertyValue::Utf8String(ByteString::decode(src)?),
            ValueKind::BinaryData => PropertyValue::BinaryData(Bytes::decode(src)?),
            ValueKind::StringPair => {
                let key = ByteString::decode(src)?;
                let val = ByteString::decode(src)?;
                PropertyValue::StringPair(key, val)
            }
        };
        Ok(value)
    }
}

impl Encode for PropertyValue {
    fn encoded_size(&self) -> usize {
        match self {
            PropertyValue::Byte(_) => 1,
            PropertyValue::TwoByteInt(_) => 2,
            PropertyValue::FourByteInt(_) => 4,
            PropertyValue::VarInt(v) => var_int_len_u32(*v) as usize,
            PropertyValue::Utf8String(s) => s.encoded_size(),
            PropertyValue::BinaryData(b) => b.encoded_size(),
            PropertyValue::StringPair(k, v) => k.encoded_size() + v.encoded_size(),
        }
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        match self {
            PropertyValue::Byte(v) => buf.put_u8(*v),
            PropertyValue::TwoByteInt(v) => buf.put_u16(*v),
            PropertyValue::FourByteInt(v) => buf.put_u32(*v),
            PropertyValue::VarInt(v) => write_variable_length(*v, buf)?,
            PropertyValue::Utf8String(s) => s.encode(buf)?,
            PropertyValue::BinaryData(b) => b.encode(buf)?,
            PropertyValue::StringPair(k, v) => {
                k.encode(buf)?;
                v.encode(buf)?;
            }
        }
        Ok(())
    }
}

/// One (identifier, value) pair. The value shape always agrees with the
/// identifier's registry entry; `new` refuses mismatched pairs.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Property {
    id: PropertyId,
    value: PropertyValue,
}

impl Property {
    pub fn new(id: PropertyId, value: PropertyValue) -> Result<Self, EncodeError> {
        ensure!(id.value_kind() == value.kind(), EncodeError::MalformedPacket);
        Ok(Property { id, value })
    }

    /// User key/value property, the common case.
    pub fn user<K, V>(key: K, value: V) -> Self
    where
        ByteString: From<K> + From<V>,
    {
        Property {
            id: PropertyId::UserProperty,
            value: PropertyValue::StringPair(key.into(), value.into()),
        }
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    fn decode(src: &mut Bytes) -> Result<Self, DecodeError> {
        let id = PropertyId::try_from(u8::try_from(decode_variable_length_cursor(src)?).map_err(|_| DecodeError::MalformedPacket)?)?;
        let value = PropertyValue::decode_kind(id.value_kind(), src)?;
        Ok(Property { id, value })
    }
}

impl Encode for Property {
    fn encoded_size(&self) -> usize {
        var_int_len_u32(u8::from(self.id) as u32) as usize + self.value.encoded_size()
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_variable_length(u8::from(self.id) as u32, buf)?;
        self.value.encode(buf)
    }
}

/// Ordered property collection with a fixed entry budget.
///
/// `byte_len` is the sum of the encoded sizes of all entries, maintained on
/// every successful `push`; it is exactly the value written as the list's
/// variable-byte-integer length prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PropertyList {
    entries: Vec<Property>,
    max_count: usize,
    byte_len: u32,
}

impl Default for PropertyList {
    fn default() -> Self {
        Self::with_max_count(DEFAULT_MAX_PROPERTIES)
    }
}

impl PartialEq for PropertyList {
    fn eq(&self, other: &Self) -> bool {
        // the capacity budget is a local policy, not part of the value
        self.entries == other.entries
    }
}

impl Eq for PropertyList {}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_count(max_count: usize) -> Self {
        PropertyList { entries: Vec::new(), max_count, byte_len: 0 }
    }

    /// Appends a property, or fails leaving the list (and its recorded
    /// byte length) untouched.
    pub fn push(&mut self, property: Property) -> Result<(), CapacityError> {
        if self.entries.len() >= self.max_count {
            return Err(CapacityError);
        }
        // byte_len is the region's length prefix and must stay encodable
        // as a variable-byte integer
        let byte_len = self
            .byte_len
            .checked_add(property.encoded_size() as u32)
            .filter(|&len| len <= MAX_PACKET_SIZE)
            .ok_or(CapacityError)?;
        self.byte_len = byte_len;
        self.entries.push(property);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cumulative encoded size of the entries, excluding the list's own
    /// length prefix.
    pub fn byte_len(&self) -> u32 {
        self.byte_len
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.entries.iter()
    }

    /// First user property with the given key, if any.
    pub fn user_property(&self, key: &str) -> Option<&ByteString> {
        self.entries.iter().find_map(|p| match &p.value {
            PropertyValue::StringPair(k, v) if p.id == PropertyId::UserProperty && k == key => Some(v),
            _ => None,
        })
    }

    /// Decodes the length-prefixed property region from `src`.
    ///
    /// The region boundary comes from the leading variable-byte integer; a
    /// value running past it, an unknown identifier, or more than
    /// `max_count` entries all fail the decode.
    pub(crate) fn decode(src: &mut Bytes, max_count: usize) -> Result<Self, DecodeError> {
        let prop_src = &mut utils::take_properties(src)?;
        let mut list = PropertyList::with_max_count(max_count);
        while prop_src.has_remaining() {
            list.push(Property::decode(prop_src)?)?;
        }
        Ok(list)
    }
}

impl Encode for PropertyList {
    fn encoded_size(&self) -> usize {
        var_int_len_u32(self.byte_len) as usize + self.byte_len as usize
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_variable_length(self.byte_len, buf)?;
        for property in &self.entries {
            property.encode(buf)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PropertyList {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> PropertyList {
        let mut props = PropertyList::new();
        props
            .push(Property::new(PropertyId::SessionExpiryInterval, PropertyValue::FourByteInt(30)).unwrap())
            .unwrap();
        props.push(Property::user("user key", "user value")).unwrap();
        props
            .push(Property::new(PropertyId::SubscriptionIdentifier, PropertyValue::VarInt(268)).unwrap())
            .unwrap();
        props
    }

    #[test]
    fn test_property_round_trip() {
        let props = sample_list();
        // 4-byte int: id + 4; pair: id + 2 * (2 + len); varint 268: id + 2
        assert_eq!(props.byte_len(), 5 + (1 + 2 + 8 + 2 + 10) + 3);

        let mut buf = BytesMut::new();
        props.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), props.encoded_size());

        let mut src = buf.freeze();
        let decoded = PropertyList::decode(&mut src, DEFAULT_MAX_PROPERTIES).unwrap();
        assert_eq!(decoded, props);
        assert_eq!(decoded.byte_len(), props.byte_len());
        assert!(!src.has_remaining());
        assert_eq!(decoded.user_property("user key").map(|v| v.as_ref()), Some("user value"));
    }

    #[test]
    fn test_id_value_shape_registry() {
        assert_eq!(PropertyId::PayloadFormatIndicator.value_kind(), ValueKind::Byte);
        assert_eq!(PropertyId::ServerKeepAlive.value_kind(), ValueKind::TwoByteInt);
        assert_eq!(PropertyId::WillDelayInterval.value_kind(), ValueKind::FourByteInt);
        assert_eq!(PropertyId::SubscriptionIdentifier.value_kind(), ValueKind::VarInt);
        assert_eq!(PropertyId::ReasonString.value_kind(), ValueKind::Utf8String);
        assert_eq!(PropertyId::CorrelationData.value_kind(), ValueKind::BinaryData);
        assert_eq!(PropertyId::UserProperty.value_kind(), ValueKind::StringPair);

        // mismatched shape is refused at construction
        assert!(matches!(
            Property::new(PropertyId::ReasonString, PropertyValue::Byte(1)),
            Err(EncodeError::MalformedPacket)
        ));
    }

    #[test]
    fn test_unknown_identifier_fails() {
        // id 0x7E is not registered
        let mut src = Bytes::from_static(b"\x02\x7e\x00");
        assert!(matches!(
            PropertyList::decode(&mut src, DEFAULT_MAX_PROPERTIES),
            Err(DecodeError::MalformedPacket)
        ));
    }

    #[test]
    fn test_value_overruns_region() {
        // declared region of 2 bytes, but a four-byte-int value needs 4
        let mut src = Bytes::from_static(b"\x02\x11\x00\x00\x00\x1e");
        assert!(matches!(
            PropertyList::decode(&mut src, DEFAULT_MAX_PROPERTIES),
            Err(DecodeError::InvalidLength)
        ));
    }

    #[test]
    fn test_capacity_exceeded_leaves_length_untouched() {
        let mut props = PropertyList::with_max_count(1);
        props.push(Property::user("a", "b")).unwrap();
        let recorded = props.byte_len();

        assert_eq!(props.push(Property::user("c", "d")), Err(CapacityError));
        assert_eq!(props.byte_len(), recorded);
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_push_keeps_length_prefix_representable() {
        // Bytes clones are cheap handles, so a large list costs little
        let value = PropertyValue::BinaryData(Bytes::from(vec![0u8; 0xFFFF]));
        let big = Property::new(PropertyId::CorrelationData, value).unwrap();

        let mut props = PropertyList::with_max_count(usize::MAX);
        loop {
            let recorded = props.byte_len();
            if props.push(big.clone()).is_err() {
                assert_eq!(props.byte_len(), recorded);
                break;
            }
        }
        assert!(props.byte_len() <= MAX_PACKET_SIZE);
        assert!(props.byte_len() + big.encoded_size() as u32 > MAX_PACKET_SIZE);
    }

    #[test]
    fn test_decode_respects_max_count() {
        let mut over = PropertyList::new();
        over.push(Property::user("k1", "v1")).unwrap();
        over.push(Property::user("k2", "v2")).unwrap();
        let mut buf = BytesMut::new();
        over.encode(&mut buf).unwrap();

        assert!(matches!(
            PropertyList::decode(&mut buf.freeze(), 1),
            Err(DecodeError::MaxPropertiesExceeded)
        ));
    }

    #[test]
    fn test_empty_list_is_single_zero_byte() {
        let props = PropertyList::new();
        let mut buf = BytesMut::new();
        props.encode(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"\x00");
    }
}
