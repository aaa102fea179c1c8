// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the Pub/Sub Layer
//!
//! This module provides the error type shared by every operation in the crate.
//! The `AmqpError` enum covers encoding, decoding, topology, and transport
//! failures; `ErrorKind` groups the variants into those four families so callers
//! can decide what to do without matching on every variant.

use thiserror::Error;

/// The family an [`AmqpError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value could not be serialized. Caller bug, never retried.
    Encode,
    /// Inbound bytes do not match the expected shape.
    Decode,
    /// The broker rejected a channel, declare, bind, or consume request.
    Topology,
    /// A publish, acknowledgment, or connection call failed on the wire.
    Transport,
    /// Failures of the crate's own machinery.
    Internal,
}

/// Represents errors that can occur during AMQP/RabbitMQ operations.
///
/// Every variant that wraps a broker or serializer failure carries the
/// underlying message so it survives being logged at a higher layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmqpError {
    /// Internal errors that don't fit into other categories
    #[error("internal error: {0}")]
    InternalError(String),

    /// Error establishing a connection to the RabbitMQ server
    #[error("failure to connect: {0}")]
    ConnectionError(String),

    /// Error creating a channel from an established connection
    #[error("failure to create a channel: {0}")]
    ChannelError(String),

    /// Error declaring an exchange with the given name
    #[error("failure to declare an exchange `{0}`")]
    DeclareExchangeError(String),

    /// Error declaring a queue with the given name, with the broker's reason
    #[error("failure to declare a queue `{0}`: {1}")]
    DeclareQueueError(String, String),

    /// Error binding a queue to an exchange, with the broker's reason
    #[error("failure to bind exchange `{0}` to queue `{1}`: {2}")]
    BindingExchangeToQueueError(String, String, String),

    /// Error starting a consumer on a queue
    #[error("failure to declare consumer `{0}`")]
    ConsumerDeclarationError(String),

    /// Error serializing a payload
    #[error("failure to encode payload: {0}")]
    EncodeError(String),

    /// Error parsing a message payload
    #[error("failure to decode payload: {0}")]
    DecodeError(String),

    /// Error publishing a message
    #[error("failure to publish: {0}")]
    PublishingError(String),

    /// Error acknowledging a message
    #[error("failure to ack message: {0}")]
    AckMessageError(String),

    /// Error negative-acknowledging a message
    #[error("failure to nack message: {0}")]
    NackMessageError(String),
}

impl AmqpError {
    /// Classifies the error into its family.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AmqpError::EncodeError(_) => ErrorKind::Encode,
            AmqpError::DecodeError(_) => ErrorKind::Decode,
            AmqpError::ChannelError(_)
            | AmqpError::DeclareExchangeError(_)
            | AmqpError::DeclareQueueError(_, _)
            | AmqpError::BindingExchangeToQueueError(_, _, _)
            | AmqpError::ConsumerDeclarationError(_) => ErrorKind::Topology,
            AmqpError::ConnectionError(_)
            | AmqpError::PublishingError(_)
            | AmqpError::AckMessageError(_)
            | AmqpError::NackMessageError(_) => ErrorKind::Transport,
            AmqpError::InternalError(_) => ErrorKind::Internal,
        }
    }
}
