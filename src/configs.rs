// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Broker Configuration
//!
//! Connection settings for the RabbitMQ broker. Values start from built-in
//! defaults that match a local development broker and can be overridden by an
//! optional `config/peril` file and by `PERIL__`-prefixed environment
//! variables, e.g. `PERIL__RABBITMQ__HOST=broker`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level configuration for a process using the pub/sub layer.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfigs {
    pub app: AppSettings,
    pub rabbitmq: RabbitMQConfigs,
}

/// Identity of the running application.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Used as the AMQP connection name.
    pub name: String,
}

/// RabbitMQ connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RabbitMQConfigs {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
}

impl RabbitMQConfigs {
    /// Renders the AMQP URI for these settings.
    pub fn uri(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.vhost
        )
    }
}

impl Default for AppConfigs {
    fn default() -> Self {
        AppConfigs {
            app: AppSettings {
                name: "peril".to_owned(),
            },
            rabbitmq: RabbitMQConfigs {
                host: "localhost".to_owned(),
                port: 5672,
                user: "guest".to_owned(),
                password: "guest".to_owned(),
                vhost: String::new(),
            },
        }
    }
}

impl AppConfigs {
    /// Loads the configuration from defaults, the optional config file and
    /// the environment.
    pub fn load() -> Result<AppConfigs, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("config/peril").required(false))
                .add_source(Environment::with_prefix("PERIL").separator("__")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<AppConfigs, ConfigError> {
        let default = AppConfigs::default();

        builder
            .set_default("app.name", default.app.name)?
            .set_default("rabbitmq.host", default.rabbitmq.host)?
            .set_default("rabbitmq.port", i64::from(default.rabbitmq.port))?
            .set_default("rabbitmq.user", default.rabbitmq.user)?
            .set_default("rabbitmq.password", default.rabbitmq.password)?
            .set_default("rabbitmq.vhost", default.rabbitmq.vhost)?
            .build()?
            .try_deserialize()
    }
}
