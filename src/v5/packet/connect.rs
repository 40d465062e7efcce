use bytes::{Buf, BufMut, Bytes, BytesMut};
use bytestring::ByteString;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::types::{ConnectFlags, QoS, MQTT_LEVEL_5, WILL_QOS_SHIFT};
use crate::utils::{Decode, Encode};
use crate::v5::PropertyList;
use crate::version::check_version;

/// Connect packet content
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Connect {
    /// the handling of the Session state.
    pub clean_start: bool,
    /// a time interval measured in seconds.
    pub keep_alive: u16,
    /// properties attached to the connect packet itself.
    pub properties: PropertyList,
    /// Will Message be stored on the Server and associated with the Network Connection.
    pub last_will: Option<LastWill>,
    /// identifies the Client to the Server.
    pub client_id: ByteString,
    /// username can be used by the Server for authentication and authorization.
    pub username: Option<ByteString>,
    /// password can be used by the Server for authentication and authorization.
    pub password: Option<Bytes>,
}

/// Connection Will
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct LastWill {
    /// the QoS level to be used when publishing the Will Message.
    pub qos: QoS,
    /// the Will Message is to be Retained when it is published.
    pub retain: bool,
    /// properties applied to the will message.
    pub properties: PropertyList,
    /// the Will Topic
    pub topic: ByteString,
    /// defines the Application Message that is to be published to the Will Topic
    pub message: Bytes,
}

impl Default for Connect {
    fn default() -> Connect {
        Connect {
            clean_start: false,
            keep_alive: 0,
            properties: PropertyList::new(),
            last_will: None,
            client_id: ByteString::default(),
            username: None,
            password: None,
        }
    }
}

impl Connect {
    /// Set client_id value
    pub fn client_id<T>(mut self, client_id: T) -> Self
    where
        ByteString: From<T>,
    {
        self.client_id = client_id.into();
        self
    }

    pub(crate) fn decode(src: &mut Bytes, max_properties: usize) -> Result<Self, DecodeError> {
        let protocol = Bytes::decode(src)?;
        ensure!(src.has_remaining(), DecodeError::InvalidLength);
        let level = src.get_u8();

        // an unrecognized name/level combination aborts the parse here; the
        // rest of the packet layout cannot be assumed for unknown versions
        ensure!(check_version(&protocol, level), DecodeError::InvalidProtocol);
        ensure!(level == MQTT_LEVEL_5, DecodeError::UnsupportedProtocolLevel);

        ensure!(src.has_remaining(), DecodeError::InvalidLength);
        let flags = ConnectFlags::from_bits(src.get_u8()).ok_or(DecodeError::ConnectReservedFlagSet)?;
        ensure!(
            !flags.contains(ConnectFlags::PASSWORD) || flags.contains(ConnectFlags::USERNAME),
            DecodeError::MalformedPacket // password flag set without username
        );

        let keep_alive = u16::decode(src)?;
        let properties = PropertyList::decode(src, max_properties)?;

        let client_id = ByteString::decode(src)?;
        ensure!(
            !client_id.is_empty() || flags.contains(ConnectFlags::CLEAN_START),
            DecodeError::InvalidClientId
        );

        let last_will = if flags.contains(ConnectFlags::WILL) {
            Some(decode_last_will(src, flags, max_properties)?)
        } else {
            None
        };

        let username = if flags.contains(ConnectFlags::USERNAME) {
            // a length prefix alone is not a username; the flag promises data
            ensure!(src.remaining() >= 3, DecodeError::InvalidLength);
            Some(ByteString::decode(src)?)
        } else {
            None
        };
        let password = if flags.contains(ConnectFlags::PASSWORD) {
            ensure!(src.remaining() >= 3, DecodeError::InvalidLength);
            Some(Bytes::decode(src)?)
        } else {
            None
        };

        Ok(Connect {
            clean_start: flags.contains(ConnectFlags::CLEAN_START),
            keep_alive,
            properties,
            client_id,
            last_will,
            username,
            password,
        })
    }
}

fn decode_last_will(
    src: &mut Bytes,
    flags: ConnectFlags,
    max_properties: usize,
) -> Result<LastWill, DecodeError> {
    let properties = PropertyList::decode(src, max_properties)?;
    let topic = ByteString::decode(src)?;
    let message = Bytes::decode(src)?;
    Ok(LastWill {
        qos: QoS::try_from((flags & ConnectFlags::WILL_QOS).bits() >> WILL_QOS_SHIFT)?,
        retain: flags.contains(ConnectFlags::WILL_RETAIN),
        properties,
        topic,
        message,
    })
}

impl Encode for Connect {
    fn encoded_size(&self) -> usize {
        6 // protocol name
            + 1 // protocol level
            + 1 // connect flags
            + 2 // keep alive
            + self.properties.encoded_size()
            + self.client_id.encoded_size()
            + self.last_will.as_ref().map_or(0, |will| {
                will.properties.encoded_size() + will.topic.encoded_size() + will.message.encoded_size()
            })
            + self.username.as_ref().map_or(0, |v| v.encoded_size())
            + self.password.as_ref().map_or(0, |v| v.encoded_size())
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        if self.password.is_some() && self.username.is_none() {
            return Err(EncodeError::MalformedPacket);
        }

        b"MQTT".as_ref().encode(buf)?;

        let mut flags = ConnectFlags::empty();
        if self.username.is_some() {
            flags |= ConnectFlags::USERNAME;
        }
        if self.password.is_some() {
            flags |= ConnectFlags::PASSWORD;
        }
        if let Some(ref will) = self.last_will {
            flags |= ConnectFlags::WILL;
            if will.retain {
                flags |= ConnectFlags::WILL_RETAIN;
            }
            flags |= ConnectFlags::from_bits_truncate(u8::from(will.qos) << WILL_QOS_SHIFT);
        }
        if self.clean_start {
            flags |= ConnectFlags::CLEAN_START;
        }

        buf.put_slice(&[MQTT_LEVEL_5, flags.bits()]);
        buf.put_u16(self.keep_alive);

        self.properties.encode(buf)?;
        self.client_id.encode(buf)?;

        if let Some(ref will) = self.last_will {
            will.properties.encode(buf)?;
            will.topic.encode(buf)?;
            will.message.encode(buf)?;
        }

        if let Some(ref username) = self.username {
            username.encode(buf)?;
        }
        if let Some(ref password) = self.password {
            password.encode(buf)?;
        }
        Ok(())
    }
}
