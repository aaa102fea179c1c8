// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! Peril server: installs the game's exchanges, tails the shared game log and
//! broadcasts pause/resume commands read from stdin.

use peril_pubsub::{
    channel::{new_amqp_connection, open_channel},
    configs::AppConfigs,
    errors::AmqpError,
    exchange::{declare_exchange, ExchangeDefinition},
    handler::Disposition,
    publisher::publish_json,
    queue::{Durability, QueueBinding, QueueDefinition},
    routing::{
        GameLog, PlayingState, EXCHANGE_PERIL_DEAD_LETTER, EXCHANGE_PERIL_DIRECT,
        EXCHANGE_PERIL_TOPIC, GAME_LOG_SLUG, PAUSE_KEY, QUEUE_PERIL_DEAD_LETTER,
    },
    subscriber::subscribe_msgpack,
    topology::declare_and_bind_with,
};
use lapin::Channel;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("PERIL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn install_exchanges(channel: &Channel) -> Result<(), AmqpError> {
    declare_exchange(channel, &ExchangeDefinition::new(EXCHANGE_PERIL_DIRECT).durable()).await?;
    declare_exchange(
        channel,
        &ExchangeDefinition::new(EXCHANGE_PERIL_TOPIC).topic().durable(),
    )
    .await?;
    declare_exchange(
        channel,
        &ExchangeDefinition::new(EXCHANGE_PERIL_DEAD_LETTER)
            .fanout()
            .durable(),
    )
    .await
}

fn print_help() {
    println!("Possible commands:");
    println!("* pause");
    println!("* resume");
    println!("* quit");
    println!("* help");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = AppConfigs::load()?;
    let conn = new_amqp_connection(&cfg).await?;
    info!("connected to the broker");

    let channel = open_channel(&conn).await?;
    install_exchanges(&channel).await?;
    declare_and_bind_with(
        &conn,
        &QueueDefinition::without_dead_letter(QUEUE_PERIL_DEAD_LETTER, Durability::Durable),
        &QueueBinding::new(QUEUE_PERIL_DEAD_LETTER).exchange(EXCHANGE_PERIL_DEAD_LETTER),
    )
    .await?;

    let subscription = subscribe_msgpack(
        &conn,
        EXCHANGE_PERIL_TOPIC,
        GAME_LOG_SLUG,
        &format!("{}.*", GAME_LOG_SLUG),
        Durability::Durable,
        |log: GameLog| {
            info!(
                time = %log.current_time,
                username = %log.username,
                "{}",
                log.message
            );
            Disposition::Ack
        },
    )
    .await?;

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = line.split_whitespace().next() else {
            continue;
        };

        match command {
            "pause" | "resume" => {
                let state = PlayingState {
                    is_paused: command == "pause",
                };
                if let Err(err) =
                    publish_json(&channel, EXCHANGE_PERIL_DIRECT, PAUSE_KEY, &state).await
                {
                    error!(error = err.to_string(), "unable to publish {} message", command);
                }
            }
            "help" => print_help(),
            "quit" => break,
            other => warn!("unknown command: {}", other),
        }
    }

    info!("shutting down");
    conn.close(200, "server shutdown").await?;

    match subscription.wait().await {
        Ok(exit) => info!(?exit, "game log subscription stopped"),
        Err(err) => error!(error = err.to_string(), "game log subscription failed"),
    }

    Ok(())
}
