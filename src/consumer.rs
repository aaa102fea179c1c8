// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Message Consumer
//!
//! This module processes one delivery at a time for the subscription loop:
//! it decodes the body, hands the payload to the subscription's handler and
//! acknowledges the delivery according to the handler's [`Disposition`].
//!
//! Acknowledgments always target the single delivery just handled, never a
//! range. A failed acknowledgment is logged and swallowed: once the broker has
//! the delivery back its fate is the broker's to decide.

use crate::{
    codec::Codec,
    errors::AmqpError,
    handler::{Disposition, MessageHandler},
    otel,
};
use async_trait::async_trait;
use lapin::{
    acker::Acker,
    message::Delivery,
    options::{BasicAckOptions, BasicNackOptions},
    protocol::basic::AMQPProperties,
};
use opentelemetry::{
    global::BoxedTracer,
    trace::{Span, Status},
};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use tracing::{debug, error, warn};

/// What to do with a delivery whose body cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeFailurePolicy {
    /// Reject the bad delivery without requeue and keep consuming.
    #[default]
    Discard,
    /// Leave the bad delivery unacknowledged and stop the subscription.
    Abandon,
}

/// Settles a single delivery with the broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Sends the acknowledgment matching `disposition` for this delivery only.
    async fn acknowledge(&self, disposition: Disposition) -> Result<(), AmqpError>;
}

#[async_trait]
impl Acknowledger for Acker {
    async fn acknowledge(&self, disposition: Disposition) -> Result<(), AmqpError> {
        match disposition {
            Disposition::Ack => self
                .ack(BasicAckOptions { multiple: false })
                .await
                .map(|_| ())
                .map_err(|err| AmqpError::AckMessageError(err.to_string())),
            Disposition::NackRequeue => self
                .nack(BasicNackOptions {
                    multiple: false,
                    requeue: true,
                })
                .await
                .map(|_| ())
                .map_err(|err| AmqpError::NackMessageError(err.to_string())),
            Disposition::NackDiscard => self
                .nack(BasicNackOptions {
                    multiple: false,
                    requeue: false,
                })
                .await
                .map(|_| ())
                .map_err(|err| AmqpError::NackMessageError(err.to_string())),
        }
    }
}

/// A message handed to the subscription loop by a delivery stream.
pub trait Inbound: Send + Sync {
    type Acker: Acknowledger;

    fn body(&self) -> &[u8];

    fn acker(&self) -> &Self::Acker;

    /// AMQP properties, when the delivery came from a broker.
    fn properties(&self) -> Option<&AMQPProperties> {
        None
    }
}

impl Inbound for Delivery {
    type Acker = Acker;

    fn body(&self) -> &[u8] {
        &self.data
    }

    fn acker(&self) -> &Acker {
        &self.acker
    }

    fn properties(&self) -> Option<&AMQPProperties> {
        Some(&self.properties)
    }
}

/// How the processing of one delivery ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The handler ran and its disposition was sent to the broker.
    Handled(Disposition),
    /// The body could not be decoded and the delivery was rejected.
    Discarded,
    /// The body could not be decoded and the subscription must stop.
    Abandon(AmqpError),
}

/// Decodes, handles, and acknowledges one delivery.
pub(crate) async fn consume<M, T, H>(
    tracer: &BoxedTracer,
    delivery: &M,
    queue: &str,
    codec: Codec,
    policy: DecodeFailurePolicy,
    handler: &mut H,
) -> Outcome
where
    M: Inbound,
    T: DeserializeOwned + Send + 'static,
    H: MessageHandler<T> + ?Sized,
{
    let (_ctx, mut span) = otel::new_span(delivery.properties(), tracer, queue);

    check_content_type(delivery, codec, queue);

    let payload = match codec.decode::<T>(delivery.body()) {
        Ok(payload) => payload,
        Err(err) => {
            span.record_error(&err);
            span.set_status(Status::Error {
                description: Cow::from("failure to decode payload"),
            });

            return match policy {
                DecodeFailurePolicy::Discard => {
                    warn!(error = err.to_string(), queue, "discarding undecodable message");
                    settle(delivery, Disposition::NackDiscard, &mut span).await;
                    Outcome::Discarded
                }
                DecodeFailurePolicy::Abandon => {
                    error!(error = err.to_string(), queue, "abandoning subscription");
                    Outcome::Abandon(err)
                }
            };
        }
    };

    let disposition = handler.handle(payload).await;
    debug!(queue, ?disposition, "message handled");

    settle(delivery, disposition, &mut span).await;
    Outcome::Handled(disposition)
}

async fn settle<M, S>(delivery: &M, disposition: Disposition, span: &mut S)
where
    M: Inbound,
    S: Span,
{
    match delivery.acker().acknowledge(disposition).await {
        Err(err) => {
            error!(error = err.to_string(), ?disposition, "error whiling settling msg");
            span.record_error(&err);
            span.set_status(Status::Error {
                description: Cow::from("error to settle msg"),
            });
        }
        _ => {
            if disposition == Disposition::Ack {
                span.set_status(Status::Ok);
            }
        }
    }
}

fn check_content_type<M: Inbound>(delivery: &M, codec: Codec, queue: &str) {
    let announced = delivery
        .properties()
        .and_then(|props| props.content_type().as_ref())
        .map(|content_type| content_type.as_str());

    if let Some(announced) = announced {
        if Codec::from_content_type(announced) != Some(codec) {
            warn!(
                queue,
                announced,
                expected = codec.content_type(),
                "content type does not match the subscription codec"
            );
        }
    }
}
