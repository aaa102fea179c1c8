// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Message Publisher
//!
//! This module publishes typed values to RabbitMQ exchanges. A value is encoded
//! with the codec chosen by the caller before the broker is contacted, so an
//! encoding failure never reaches the wire. Each call is exactly one
//! non-mandatory, non-immediate `basic.publish` on the caller's channel; there
//! is no buffering and no publisher-confirm tracking.

use crate::{codec::Codec, errors::AmqpError, otel};
use lapin::{
    options::BasicPublishOptions,
    types::{FieldTable, ShortString},
    BasicProperties, Channel,
};
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

/// Encodes `value` and builds the properties it is published with. Nothing
/// here touches the broker.
pub(crate) fn outgoing_message<T>(
    value: &T,
    codec: Codec,
) -> Result<(Vec<u8>, BasicProperties), AmqpError>
where
    T: Serialize + ?Sized,
{
    let payload = codec.encode(value)?;

    let properties = BasicProperties::default()
        .with_content_type(ShortString::from(codec.content_type()))
        .with_message_id(ShortString::from(Uuid::new_v4().to_string()))
        .with_headers(FieldTable::from(otel::outbound_headers()));

    Ok((payload, properties))
}

/// Publishes `value` to `exchange` under `key`, encoded with `codec`.
///
/// The message carries the codec's content type, a fresh message id, and the
/// current trace context in its headers.
pub async fn publish<T>(
    channel: &Channel,
    exchange: &str,
    key: &str,
    value: &T,
    codec: Codec,
) -> Result<(), AmqpError>
where
    T: Serialize + Sync + ?Sized,
{
    let (payload, properties) = outgoing_message(value, codec).map_err(|err| {
        error!(error = err.to_string(), exchange, key, "error encoding message");
        err
    })?;

    match channel
        .basic_publish(
            exchange,
            key,
            BasicPublishOptions {
                immediate: false,
                mandatory: false,
            },
            &payload,
            properties,
        )
        .await
    {
        Err(err) => {
            error!(error = err.to_string(), exchange, key, "error publishing message");
            Err(AmqpError::PublishingError(err.to_string()))
        }
        _ => {
            debug!(exchange, key, bytes = payload.len(), "message published");
            Ok(())
        }
    }
}

/// Publishes `value` as JSON.
pub async fn publish_json<T>(
    channel: &Channel,
    exchange: &str,
    key: &str,
    value: &T,
) -> Result<(), AmqpError>
where
    T: Serialize + Sync + ?Sized,
{
    publish(channel, exchange, key, value, Codec::Json).await
}

/// Publishes `value` with the compact MessagePack codec.
pub async fn publish_msgpack<T>(
    channel: &Channel,
    exchange: &str,
    key: &str,
    value: &T,
) -> Result<(), AmqpError>
where
    T: Serialize + Sync + ?Sized,
{
    publish(channel, exchange, key, value, Codec::MsgPack).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PlayingState;
    use std::collections::HashMap;

    #[test]
    fn outgoing_message_announces_the_codec() {
        let (payload, properties) =
            outgoing_message(&PlayingState { is_paused: true }, Codec::MsgPack).unwrap();

        assert_eq!(
            Codec::MsgPack.decode::<PlayingState>(&payload).unwrap(),
            PlayingState { is_paused: true }
        );
        assert_eq!(
            properties.content_type().as_ref().map(|ct| ct.as_str()),
            Some(Codec::MsgPack.content_type())
        );
    }

    #[test]
    fn every_message_gets_its_own_id() {
        let state = PlayingState { is_paused: false };
        let (_, first) = outgoing_message(&state, Codec::Json).unwrap();
        let (_, second) = outgoing_message(&state, Codec::Json).unwrap();

        let first = first.message_id().clone().unwrap();
        let second = second.message_id().clone().unwrap();
        assert!(Uuid::parse_str(first.as_str()).is_ok());
        assert_ne!(first, second);
    }

    #[test]
    fn encode_failure_stops_before_the_channel() {
        // publish builds the outgoing message first and only then borrows the
        // channel, so this error is all the broker would ever see
        let scores: HashMap<(u8, u8), u8> = HashMap::from([((0, 1), 2)]);

        let err = outgoing_message(&scores, Codec::Json).unwrap_err();
        assert!(matches!(err, AmqpError::EncodeError(_)));
    }
}
