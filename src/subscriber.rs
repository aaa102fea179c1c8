// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Subscriptions
//!
//! This module runs the consumption loop behind every subscription. Each
//! subscription declares and binds its queue on a channel of its own, opens a
//! manual-acknowledgment consumer on it and moves both into a dedicated tokio
//! task. The task handles deliveries strictly one after another, in the order
//! the broker sent them, acknowledging each before looking at the next.
//!
//! A subscription ends when its delivery stream closes (connection or channel
//! closed), when the stream reports an error, or when a decode failure hits a
//! subscription configured with [`DecodeFailurePolicy::Abandon`]. Nothing is
//! reconnected here; the exit reason is reported through [`Subscription::wait`].

use crate::{
    codec::Codec,
    consumer::{consume, DecodeFailurePolicy, Inbound, Outcome},
    errors::AmqpError,
    handler::MessageHandler,
    queue::Durability,
    topology::declare_and_bind,
};
use futures_util::{Stream, StreamExt};
use lapin::{
    options::{BasicConsumeOptions, BasicQosOptions},
    types::FieldTable,
    Channel, Connection,
};
use opentelemetry::global;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Per-subscription settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub codec: Codec,
    pub decode_failure: DecodeFailurePolicy,
    /// Maximum number of unacknowledged deliveries the broker may push.
    pub prefetch: Option<u16>,
}

impl SubscribeOptions {
    pub fn json() -> Self {
        SubscribeOptions {
            codec: Codec::Json,
            ..Default::default()
        }
    }

    pub fn msgpack() -> Self {
        SubscribeOptions {
            codec: Codec::MsgPack,
            ..Default::default()
        }
    }

    pub fn decode_failure(mut self, policy: DecodeFailurePolicy) -> Self {
        self.decode_failure = policy;
        self
    }

    pub fn prefetch(mut self, count: u16) -> Self {
        self.prefetch = Some(count);
        self
    }
}

/// Why a subscription stopped consuming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionExit {
    /// The broker closed the delivery stream.
    StreamClosed,
    /// The delivery stream reported an error.
    StreamFailed(String),
    /// A delivery could not be decoded under the `Abandon` policy.
    DecodeAbandoned(AmqpError),
}

/// Handle to a running subscription.
#[derive(Debug)]
pub struct Subscription {
    queue: String,
    handle: JoinHandle<SubscriptionExit>,
}

impl Subscription {
    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the subscription to stop and reports why.
    pub async fn wait(self) -> Result<SubscriptionExit, AmqpError> {
        self.handle
            .await
            .map_err(|err| AmqpError::InternalError(err.to_string()))
    }
}

/// Subscribes `handler` to `queue_name`, bound to `exchange` under `key`.
///
/// Topology and consumer errors are returned before anything is spawned; once
/// this returns `Ok` the subscription runs on its own task.
pub async fn subscribe<T, H>(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    key: &str,
    durability: Durability,
    options: SubscribeOptions,
    handler: H,
) -> Result<Subscription, AmqpError>
where
    T: DeserializeOwned + Send + 'static,
    H: MessageHandler<T> + 'static,
{
    let (channel, queue) = declare_and_bind(conn, exchange, queue_name, key, durability).await?;
    let queue = queue.name().as_str().to_owned();

    if let Some(prefetch) = options.prefetch {
        if let Err(err) = channel
            .basic_qos(prefetch, BasicQosOptions { global: false })
            .await
        {
            error!(error = err.to_string(), "error to configure qos");
            return Err(AmqpError::ConsumerDeclarationError(queue));
        }
    }

    let consumer_tag = format!("{}-{}", queue, Uuid::new_v4());
    let consumer = match channel
        .basic_consume(
            &queue,
            &consumer_tag,
            BasicConsumeOptions {
                no_local: false,
                no_ack: false,
                exclusive: false,
                nowait: false,
            },
            FieldTable::default(),
        )
        .await
    {
        Err(err) => {
            error!(error = err.to_string(), "error to create the consumer");
            Err(AmqpError::ConsumerDeclarationError(queue.clone()))
        }
        Ok(c) => Ok(c),
    }?;

    debug!(queue, consumer_tag, "subscription started");

    let handle = tokio::spawn({
        let queue = queue.clone();
        async move {
            let mut handler = handler;
            let exit = consume_deliveries(consumer, &queue, options, &mut handler).await;
            finish(channel, &queue, &exit).await;
            exit
        }
    });

    Ok(Subscription { queue, handle })
}

/// Subscribes a handler of JSON payloads with the default options.
pub async fn subscribe_json<T, H>(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    key: &str,
    durability: Durability,
    handler: H,
) -> Result<Subscription, AmqpError>
where
    T: DeserializeOwned + Send + 'static,
    H: MessageHandler<T> + 'static,
{
    subscribe(
        conn,
        exchange,
        queue_name,
        key,
        durability,
        SubscribeOptions::json(),
        handler,
    )
    .await
}

/// Subscribes a handler of MessagePack payloads with the default options.
pub async fn subscribe_msgpack<T, H>(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    key: &str,
    durability: Durability,
    handler: H,
) -> Result<Subscription, AmqpError>
where
    T: DeserializeOwned + Send + 'static,
    H: MessageHandler<T> + 'static,
{
    subscribe(
        conn,
        exchange,
        queue_name,
        key,
        durability,
        SubscribeOptions::msgpack(),
        handler,
    )
    .await
}

/// Drives a delivery stream until it ends.
pub(crate) async fn consume_deliveries<S, M, E, T, H>(
    mut deliveries: S,
    queue: &str,
    options: SubscribeOptions,
    handler: &mut H,
) -> SubscriptionExit
where
    S: Stream<Item = Result<M, E>> + Unpin,
    M: Inbound,
    E: Display,
    T: DeserializeOwned + Send + 'static,
    H: MessageHandler<T> + ?Sized,
{
    let tracer = global::tracer("amqp consumer");

    while let Some(result) = deliveries.next().await {
        match result {
            Ok(delivery) => {
                let outcome = consume(
                    &tracer,
                    &delivery,
                    queue,
                    options.codec,
                    options.decode_failure,
                    handler,
                )
                .await;

                if let Outcome::Abandon(err) = outcome {
                    return SubscriptionExit::DecodeAbandoned(err);
                }
            }
            Err(err) => {
                error!(error = err.to_string(), queue, "errors consume msg");
                return SubscriptionExit::StreamFailed(err.to_string());
            }
        }
    }

    debug!(queue, "delivery stream closed");
    SubscriptionExit::StreamClosed
}

async fn finish(channel: Channel, queue: &str, exit: &SubscriptionExit) {
    match exit {
        SubscriptionExit::StreamClosed => debug!(queue, "subscription terminated"),
        SubscriptionExit::StreamFailed(reason) => {
            warn!(queue, reason, "subscription terminated by stream failure")
        }
        SubscriptionExit::DecodeAbandoned(_) => {
            // unsettled deliveries go back to the queue once the channel closes
            if let Err(err) = channel.close(200, "subscription abandoned").await {
                error!(error = err.to_string(), queue, "error to close the channel");
            }
            warn!(queue, "subscription abandoned");
        }
    }
}
