// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Queue Management for RabbitMQ
//!
//! This module provides the queue definitions used by the topology manager.
//! A queue's flags are not set one by one: they follow from its durability
//! class. Queues declared for subscriptions dead-letter rejected messages to
//! a side exchange; the queue collecting those dead letters has no such
//! argument, otherwise a message rejected there would loop back into it.

use lapin::{
    options::QueueDeclareOptions,
    types::{AMQPValue, FieldTable, LongString, ShortString},
};
use std::collections::BTreeMap;

/// Constant for the queue argument used to specify a dead letter exchange
pub const AMQP_HEADERS_DEAD_LETTER_EXCHANGE: &str = "x-dead-letter-exchange";

/// Whether a queue outlives its consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Survives broker restarts and is shared by every consumer bound to it.
    Durable,
    /// Exclusive to the declaring connection and reclaimed when it goes away.
    Transient,
}

/// Definition of a RabbitMQ queue.
///
/// `Durable` queues are never auto-deleted nor exclusive; `Transient` queues
/// are always both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDefinition {
    pub(crate) name: String,
    pub(crate) durability: Durability,
    pub(crate) dead_letter_exchange: Option<String>,
}

impl QueueDefinition {
    /// Creates a queue definition that dead-letters to `dead_letter_exchange`.
    pub fn new(name: &str, durability: Durability, dead_letter_exchange: &str) -> QueueDefinition {
        QueueDefinition {
            name: name.to_owned(),
            durability,
            dead_letter_exchange: Some(dead_letter_exchange.to_owned()),
        }
    }

    /// Creates a queue definition without a dead-letter exchange.
    pub fn without_dead_letter(name: &str, durability: Durability) -> QueueDefinition {
        QueueDefinition {
            name: name.to_owned(),
            durability,
            dead_letter_exchange: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn durability(&self) -> Durability {
        self.durability
    }

    pub fn dead_letter_exchange(&self) -> Option<&str> {
        self.dead_letter_exchange.as_deref()
    }

    pub fn durable(&self) -> bool {
        self.durability == Durability::Durable
    }

    pub fn auto_delete(&self) -> bool {
        self.durability == Durability::Transient
    }

    pub fn exclusive(&self) -> bool {
        self.durability == Durability::Transient
    }

    /// The declare options derived from the durability class.
    pub(crate) fn declare_options(&self) -> QueueDeclareOptions {
        QueueDeclareOptions {
            passive: false,
            durable: self.durable(),
            exclusive: self.exclusive(),
            auto_delete: self.auto_delete(),
            nowait: false,
        }
    }

    /// The queue arguments, carrying the dead-letter exchange when there is one.
    pub(crate) fn arguments(&self) -> FieldTable {
        let mut args = BTreeMap::new();
        if let Some(dlx) = &self.dead_letter_exchange {
            args.insert(
                ShortString::from(AMQP_HEADERS_DEAD_LETTER_EXCHANGE),
                AMQPValue::LongString(LongString::from(dlx.clone())),
            );
        }
        FieldTable::from(args)
    }
}

/// Configuration for binding a queue to an exchange.
///
/// The routing key may contain `*` and `#` wildcard segments when the
/// exchange is a topic exchange; they are passed to the broker untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding<'qeb> {
    pub(crate) queue_name: &'qeb str,
    pub(crate) exchange_name: &'qeb str,
    pub(crate) routing_key: &'qeb str,
}

impl<'qeb> QueueBinding<'qeb> {
    /// Creates a new queue binding for the given queue.
    ///
    /// By default, the exchange name and routing key are empty strings.
    pub fn new(queue: &'qeb str) -> QueueBinding<'qeb> {
        QueueBinding {
            queue_name: queue,
            exchange_name: "",
            routing_key: "",
        }
    }

    /// Sets the exchange to bind the queue to.
    pub fn exchange(mut self, exchange: &'qeb str) -> Self {
        self.exchange_name = exchange;
        self
    }

    /// Sets the routing key for the binding.
    pub fn routing_key(mut self, key: &'qeb str) -> Self {
        self.routing_key = key;
        self
    }
}
