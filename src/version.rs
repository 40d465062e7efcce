use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{DecodeError, EncodeError};
use crate::types::{packet_type, MQISDP, MQTT, MQTT_LEVEL_31, MQTT_LEVEL_311, MQTT_LEVEL_5};
use crate::utils;

/// Represents supported MQTT protocol versions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// MQTT version 3.1 or 3.1.1
    MQTT3,
    /// MQTT version 5.0
    MQTT5,
}

/// Validates an MQTT protocol name and level combination.
///
/// Level 3 pairs with "MQIsdp"; levels 4 and 5 share the name "MQTT" and are
/// told apart only by the level byte that follows the name on the wire.
///
/// The comparison length is clamped to the shorter of the expected name and
/// the supplied bytes, so a short buffer whose available bytes agree is still
/// accepted. This mirrors observed wire behavior; callers that need strict
/// name validation must check the declared length themselves.
pub fn check_version(protocol: &[u8], level: u8) -> bool {
    let expected: &[u8] = match level {
        MQTT_LEVEL_31 => MQISDP,
        MQTT_LEVEL_311 | MQTT_LEVEL_5 => MQTT,
        _ => return false,
    };
    let n = expected.len().min(protocol.len());
    protocol[..n] == expected[..n]
}

/// Codec for detecting MQTT protocol version from initial handshake
///
/// This codec is specifically designed to handle the initial CONNECT packet
/// and determine the protocol version before switching to version-specific codecs
#[derive(Debug)]
pub struct VersionCodec;

impl Decoder for VersionCodec {
    type Item = ProtocolVersion;
    type Error = DecodeError;

    /// Decodes the protocol version from the initial CONNECT packet
    ///
    /// Peeks at the buffer without consuming it: the full CONNECT is left in
    /// place for the version-specific codec that takes over afterwards.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let len = src.len();
        if len < 2 {
            return Ok(None);
        }

        let src_slice = src.as_ref();
        let first_byte = src_slice[0];
        match utils::decode_variable_length(&src_slice[1..])? {
            Some((_, mut consumed)) => {
                consumed += 1;

                if first_byte != packet_type::CONNECT {
                    return Err(DecodeError::UnsupportedPacketType);
                }

                if len <= consumed + 2 {
                    return Ok(None);
                }
                let protocol_len = u16::from_be_bytes(
                    src[consumed..consumed + 2].try_into().map_err(|_| DecodeError::InvalidProtocol)?,
                ) as usize;

                // wait until the declared name and the level byte are buffered
                let name_end = consumed + 2 + protocol_len;
                if len <= name_end {
                    return Ok(None);
                }

                let level = src[name_end];
                ensure!(check_version(&src[consumed + 2..name_end], level), DecodeError::InvalidProtocol);

                match level {
                    MQTT_LEVEL_31 | MQTT_LEVEL_311 => Ok(Some(ProtocolVersion::MQTT3)),
                    MQTT_LEVEL_5 => Ok(Some(ProtocolVersion::MQTT5)),
                    _ => Err(DecodeError::InvalidProtocol),
                }
            }
            None => Ok(None),
        }
    }
}

impl Encoder<ProtocolVersion> for VersionCodec {
    type Error = EncodeError;

    /// Encoding not supported for version detection codec
    ///
    /// This codec is only used for initial protocol detection,
    /// actual packet encoding should be handled by version-specific codecs
    fn encode(&mut self, _: ProtocolVersion, _: &mut BytesMut) -> Result<(), Self::Error> {
        Err(EncodeError::UnsupportedVersion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_check_version() {
        assert!(check_version(b"MQIsdp", MQTT_LEVEL_31));
        assert!(check_version(b"MQTT", MQTT_LEVEL_311));
        assert!(check_version(b"MQTT", MQTT_LEVEL_5));
        assert!(!check_version(b"MQIsdp", MQTT_LEVEL_5));
        assert!(!check_version(b"MQTT", MQTT_LEVEL_31));
        assert!(!check_version(b"MQTT", 6));
        // comparison clamps to the bytes available
        assert!(check_version(b"MQ", MQTT_LEVEL_311));
        assert!(!check_version(b"MX", MQTT_LEVEL_311));
    }

    /// Test invalid protocol format detection
    #[test]
    fn test_invalid_protocol() {
        let mut buf = BytesMut::from(
            b"\x10\x7f\x7f\x00\x04MQTT\x06\xC0\x00\x3C\x00\x0512345\x00\x04user\x00\x04pass".as_ref(),
        );
        assert!(matches!(VersionCodec.decode(&mut buf), Err(DecodeError::InvalidProtocol)));
    }

    /// Test valid MQTT 3.1.1 protocol detection
    #[test]
    fn test_mqtt3_protocol_detection() {
        let mut buf = BytesMut::from(b"\x10\x98\x02\0\x04MQTT\x04\xc0\0\x0f\0\x02d1\0|testhub.".as_ref());
        assert_eq!(VersionCodec.decode(&mut buf).unwrap(), Some(ProtocolVersion::MQTT3));
    }

    /// Test valid MQTT 5.0 protocol detection
    #[test]
    fn test_mqtt5_protocol_detection() {
        let mut buf = BytesMut::from(b"\x10\x98\x02\0\x04MQTT\x05\xc0\0\x0f\0\x02d1\0|testhub.".as_ref());
        assert_eq!(VersionCodec.decode(&mut buf).unwrap(), Some(ProtocolVersion::MQTT5));
    }

    /// Test partial packet handling
    #[test]
    fn test_partial_packet_handling() {
        let mut buf = BytesMut::from(b"\x10\x98\x02\0\x04MQTT\x05".as_ref());
        assert_eq!(VersionCodec.decode(&mut buf).unwrap(), Some(ProtocolVersion::MQTT5));

        let mut buf = BytesMut::from(b"\x10\x98\x02\0\x04".as_ref());
        assert_eq!(VersionCodec.decode(&mut buf).unwrap(), None);
    }
}
