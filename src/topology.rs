// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Topology Management
//!
//! This module declares queues and binds them to exchanges. Every call opens
//! its own channel, declares the queue with a dead-letter exchange so rejected
//! messages are never silently lost, and binds it under the given key.
//!
//! Declaring is idempotent on the broker. A queue that already exists with
//! conflicting parameters makes the broker fail the declare with a precondition
//! error, which is returned as [`AmqpError::DeclareQueueError`]; the queue is not
//! deleted and re-declared. If the bind fails after the declare succeeded, the
//! queue stays on the broker.

use crate::{
    channel::open_channel,
    errors::AmqpError,
    queue::{Durability, QueueBinding, QueueDefinition},
    routing::EXCHANGE_PERIL_DEAD_LETTER,
};
use lapin::{options::QueueBindOptions, types::FieldTable, Channel, Connection, Queue};
use tracing::{debug, error};

/// Declares `queue_name` with the given durability, dead-lettering to the
/// well-known side exchange, and binds it to `exchange` under `key`.
///
/// Returns the channel the declaration ran on, so callers can publish into
/// or consume from the queue they just bound.
pub async fn declare_and_bind(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    key: &str,
    durability: Durability,
) -> Result<(Channel, Queue), AmqpError> {
    let def = QueueDefinition::new(queue_name, durability, EXCHANGE_PERIL_DEAD_LETTER);
    let binding = QueueBinding::new(queue_name)
        .exchange(exchange)
        .routing_key(key);

    declare_and_bind_with(conn, &def, &binding).await
}

/// Same as [`declare_and_bind`] for callers supplying their own queue
/// definition, e.g. one that dead-letters to a different exchange.
pub async fn declare_and_bind_with(
    conn: &Connection,
    def: &QueueDefinition,
    binding: &QueueBinding<'_>,
) -> Result<(Channel, Queue), AmqpError> {
    let channel = open_channel(conn).await?;
    let queue = declare_queue(&channel, def).await?;
    bind_queue(&channel, binding).await?;

    Ok((channel, queue))
}

async fn declare_queue(channel: &Channel, def: &QueueDefinition) -> Result<Queue, AmqpError> {
    debug!(
        durability = ?def.durability,
        dlx = ?def.dead_letter_exchange,
        "creating queue: {}",
        def.name
    );

    match channel
        .queue_declare(&def.name, def.declare_options(), def.arguments())
        .await
    {
        Err(err) => {
            error!(
                error = err.to_string(),
                name = %def.name,
                "error to declare the queue"
            );
            Err(AmqpError::DeclareQueueError(
                def.name.clone(),
                err.to_string(),
            ))
        }
        Ok(queue) => {
            debug!("queue: {} was created", def.name);
            Ok(queue)
        }
    }
}

async fn bind_queue(channel: &Channel, binding: &QueueBinding<'_>) -> Result<(), AmqpError> {
    debug!(
        "binding queue: {} to the exchange: {} with the key: {}",
        binding.queue_name, binding.exchange_name, binding.routing_key
    );

    match channel
        .queue_bind(
            binding.queue_name,
            binding.exchange_name,
            binding.routing_key,
            QueueBindOptions { nowait: false },
            FieldTable::default(),
        )
        .await
    {
        Err(err) => {
            error!(error = err.to_string(), "error to bind queue to exchange");
            Err(AmqpError::BindingExchangeToQueueError(
                binding.exchange_name.to_owned(),
                binding.queue_name.to_owned(),
                err.to_string(),
            ))
        }
        _ => {
            debug!("queue was bound");
            Ok(())
        }
    }
}
