use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::utils::Encode;
use super::disconnect::{decode_reason_packet, encode_reason_packet, reason_packet_size};
use crate::v5::PropertyList;

/// AUTH message
///
/// Shares the graduated wire form of DISCONNECT: the reason code and the
/// property region are omitted from the tail when they carry nothing.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Auth {
    pub reason_code: AuthReasonCode,
    pub properties: PropertyList,
}

prim_enum! {
    /// AUTH reason codes
    #[derive(serde::Deserialize, serde::Serialize)]
    pub enum AuthReasonCode {
        Success = 0,
        ContinueAuth = 24,
        ReAuth = 25
    }
}

impl Default for Auth {
    fn default() -> Self {
        Auth { reason_code: AuthReasonCode::Success, properties: PropertyList::new() }
    }
}

impl Auth {
    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let (reason_code, properties) = decode_reason_packet(src, AuthReasonCode::Success, max_properties)?;
        Ok(Auth { reason_code, properties })
    }
}

impl Encode for Auth {
    fn encoded_size(&self) -> usize {
        reason_packet_size(&self.properties)
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        encode_reason_packet(buf, self.reason_code.into(), &self.properties)
    }
}
