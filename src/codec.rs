// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Payload Codecs
//!
//! Two wire encodings are supported and chosen explicitly at every call site:
//! JSON for small, human-readable control messages and MessagePack for
//! high-volume log payloads. Both are self-describing: structs travel as maps
//! keyed by field name, so a body produced for one type does not silently
//! decode into another. The codec is announced to consumers through the AMQP
//! `content-type` property.

use crate::errors::AmqpError;
use serde::{de::DeserializeOwned, Serialize};
use std::io::Cursor;

/// Content type for JSON messages
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type for MessagePack messages
pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";

/// A wire encoding for message payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Codec {
    /// Field-name keyed JSON text.
    #[default]
    Json,
    /// Field-name keyed MessagePack.
    MsgPack,
}

impl Codec {
    /// The content type published alongside payloads of this codec.
    pub fn content_type(&self) -> &'static str {
        match self {
            Codec::Json => JSON_CONTENT_TYPE,
            Codec::MsgPack => MSGPACK_CONTENT_TYPE,
        }
    }

    /// Looks up the codec announced by a content type, if it is one we know.
    pub fn from_content_type(content_type: &str) -> Option<Codec> {
        match content_type {
            JSON_CONTENT_TYPE => Some(Codec::Json),
            MSGPACK_CONTENT_TYPE => Some(Codec::MsgPack),
            _ => None,
        }
    }

    /// Serializes `value` into a message body.
    pub fn encode<T>(&self, value: &T) -> Result<Vec<u8>, AmqpError>
    where
        T: Serialize + ?Sized,
    {
        match self {
            Codec::Json => {
                serde_json::to_vec(value).map_err(|err| AmqpError::EncodeError(err.to_string()))
            }
            Codec::MsgPack => rmp_serde::to_vec_named(value)
                .map_err(|err| AmqpError::EncodeError(err.to_string())),
        }
    }

    /// Deserializes a message body into `T`.
    ///
    /// Malformed, truncated, or shape-incompatible input yields
    /// [`AmqpError::DecodeError`]. A MessagePack body with bytes left over
    /// after the value is rejected as well.
    pub fn decode<T>(&self, bytes: &[u8]) -> Result<T, AmqpError>
    where
        T: DeserializeOwned,
    {
        match self {
            Codec::Json => {
                serde_json::from_slice(bytes).map_err(|err| AmqpError::DecodeError(err.to_string()))
            }
            Codec::MsgPack => decode_msgpack(bytes),
        }
    }
}

fn decode_msgpack<T>(bytes: &[u8]) -> Result<T, AmqpError>
where
    T: DeserializeOwned,
{
    let mut reader = Cursor::new(bytes);
    let value = rmp_serde::from_read(&mut reader)
        .map_err(|err| AmqpError::DecodeError(err.to_string()))?;

    let consumed = reader.position() as usize;
    if consumed != bytes.len() {
        return Err(AmqpError::DecodeError(format!(
            "{} trailing bytes after the value",
            bytes.len() - consumed
        )));
    }

    Ok(value)
}
