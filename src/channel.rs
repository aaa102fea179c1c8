// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Connection and Channel Management
//!
//! This module establishes the broker connection owned by the bootstrap code and
//! opens the channels that the topology, publisher, and subscriber modules run on.
//! The connection is passed explicitly into every operation; nothing in the crate
//! keeps process-wide connection state.

use crate::{configs::AppConfigs, errors::AmqpError};
use lapin::{types::LongString, Channel, Connection, ConnectionProperties};
use std::sync::Arc;
use tracing::{debug, error};

/// Creates a new AMQP connection to RabbitMQ.
///
/// The connection is named after the application so it can be told apart in
/// the broker's management UI. It is wrapped in an Arc so subscriptions and
/// publishers on different tasks can share it.
///
/// # Example
/// ```no_run
/// # async fn run() -> Result<(), peril_pubsub::errors::AmqpError> {
/// let cfg = peril_pubsub::configs::AppConfigs::default();
/// let conn = peril_pubsub::channel::new_amqp_connection(&cfg).await?;
/// # Ok(())
/// # }
/// ```
pub async fn new_amqp_connection(cfg: &AppConfigs) -> Result<Arc<Connection>, AmqpError> {
    debug!("creating amqp connection...");
    let options = ConnectionProperties::default()
        .with_connection_name(LongString::from(cfg.app.name.clone()));

    match Connection::connect(&cfg.rabbitmq.uri(), options).await {
        Ok(conn) => {
            debug!("amqp connected");
            Ok(Arc::new(conn))
        }
        Err(err) => {
            error!(error = err.to_string(), "failure to connect");
            Err(AmqpError::ConnectionError(err.to_string()))
        }
    }
}

/// Opens a fresh channel on the given connection.
///
/// Channels are never pooled: every topology declaration and every
/// subscription gets its own.
pub async fn open_channel(conn: &Connection) -> Result<Channel, AmqpError> {
    debug!("creating amqp channel...");
    match conn.create_channel().await {
        Ok(channel) => {
            debug!(channel = channel.id(), "channel created");
            Ok(channel)
        }
        Err(err) => {
            error!(error = err.to_string(), "error to create the channel");
            Err(AmqpError::ChannelError(err.to_string()))
        }
    }
}
