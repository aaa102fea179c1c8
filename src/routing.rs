// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Game Routing
//!
//! Well-known exchange names, routing keys and payload types shared by the
//! Peril server and clients.

use crate::{errors::AmqpError, publisher::publish_msgpack};
use chrono::{DateTime, Utc};
use lapin::Channel;
use serde::{Deserialize, Serialize};

/// Direct exchange carrying control messages such as pause/resume.
pub const EXCHANGE_PERIL_DIRECT: &str = "peril_direct";
/// Topic exchange carrying moves, war declarations and game logs.
pub const EXCHANGE_PERIL_TOPIC: &str = "peril_topic";
/// Fanout exchange receiving every rejected or discarded message.
pub const EXCHANGE_PERIL_DEAD_LETTER: &str = "peril_dlx";
/// Queue collecting dead-lettered messages.
pub const QUEUE_PERIL_DEAD_LETTER: &str = "peril_dlq";

pub const PAUSE_KEY: &str = "pause";
/// Prefix of the topic keys carrying a player's army moves.
pub const ARMY_MOVES_PREFIX: &str = "army_moves";
/// Prefix of the topic keys carrying war declarations.
pub const WAR_RECOGNITIONS_PREFIX: &str = "war";
pub const GAME_LOG_SLUG: &str = "game_logs";

/// Pause state broadcast by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayingState {
    pub is_paused: bool,
}

/// One entry of the shared game log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameLog {
    pub current_time: DateTime<Utc>,
    pub message: String,
    pub username: String,
}

/// Routing key for game logs written by `username`.
pub fn game_log_key(username: &str) -> String {
    format!("{}.{}", GAME_LOG_SLUG, username)
}

/// Routing key for army moves made by `username`.
pub fn army_moves_key(username: &str) -> String {
    format!("{}.{}", ARMY_MOVES_PREFIX, username)
}

/// Routing key for wars declared by `username`.
pub fn war_key(username: &str) -> String {
    format!("{}.{}", WAR_RECOGNITIONS_PREFIX, username)
}

/// Publishes `log` to the topic exchange under `game_logs.<username>` using
/// MessagePack.
pub async fn publish_game_log(channel: &Channel, log: &GameLog) -> Result<(), AmqpError> {
    publish_msgpack(
        channel,
        EXCHANGE_PERIL_TOPIC,
        &game_log_key(&log.username),
        log,
    )
    .await
}
