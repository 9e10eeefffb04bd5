// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::broker::rest::DEFAULT_ENDPOINT;
use crate::error::ConfigError;
use crate::model::SubscriptionTarget;
use crate::poll_loop::LoopOptions;
use clap::{Parser, ValueEnum};
use humantime::parse_duration;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MANUAL_BATCH_SIZE: i32 = 5;

/// Command-line flags and environment variables for the worker.
///
/// Every flag can also be set through the environment variable named in its
/// help text, which is how Cloud Run deployments configure the service.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// The project that owns the subscription.
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// The subscription to pull from.
    #[arg(long, env = "SUBSCRIPTION_ID")]
    pub subscription_id: Option<String>,

    /// The port for the HTTP server.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The Pub/Sub service endpoint.
    #[arg(long, env = "PUBSUB_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Use a Pub/Sub emulator at this `host:port`.
    ///
    /// The emulator is contacted over plain HTTP without credentials.
    #[arg(long, env = "PUBSUB_EMULATOR_HOST")]
    pub emulator_host: Option<String>,

    /// The maximum number of messages requested by each background pull.
    #[arg(long, env = "PULL_BATCH_SIZE", default_value_t = crate::poll_loop::DEFAULT_BATCH_SIZE)]
    pub batch_size: i32,

    /// The maximum number of messages requested by each `/pull` request.
    #[arg(long, env = "MANUAL_PULL_BATCH_SIZE", default_value_t = DEFAULT_MANUAL_BATCH_SIZE)]
    pub manual_batch_size: i32,

    /// The maximum time a pull waits for messages.
    #[arg(long, env = "PULL_TIMEOUT", value_parser = parse_duration, default_value = "10s")]
    pub pull_timeout: Duration,

    /// The pause between successful background pulls.
    #[arg(long, env = "POLL_INTERVAL", value_parser = parse_duration, default_value = "5s")]
    pub poll_interval: Duration,

    /// The pause after a failed background pull.
    #[arg(long, env = "ERROR_BACKOFF", value_parser = parse_duration, default_value = "30s")]
    pub error_backoff: Duration,

    /// The number of recent messages kept for `/messages`.
    #[arg(long, env = "BUFFER_CAPACITY", default_value_t = crate::recent::DEFAULT_CAPACITY)]
    pub buffer_capacity: usize,

    /// The log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line, suitable for Cloud Logging.
    Json,
    /// Human readable output.
    Text,
}

/// Where and how the worker reaches the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connection {
    /// The production service, using Application Default Credentials.
    Service { endpoint: String },
    /// A local emulator, using anonymous credentials.
    Emulator { endpoint: String },
}

impl Connection {
    pub fn endpoint(&self) -> &str {
        match self {
            Connection::Service { endpoint } | Connection::Emulator { endpoint } => endpoint,
        }
    }
}

/// The validated configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub target: SubscriptionTarget,
    pub port: u16,
    pub connection: Connection,
    pub manual_batch_size: i32,
    pub pull_timeout: Duration,
    pub loop_options: LoopOptions,
    pub buffer_capacity: usize,
}

impl Args {
    /// Validates the arguments and resolves the configuration.
    pub fn validate(&self) -> Result<Config, ConfigError> {
        let project_id = required(&self.project_id, "PROJECT_ID")?;
        let subscription_id = required(&self.subscription_id, "SUBSCRIPTION_ID")?;
        positive(self.batch_size, "PULL_BATCH_SIZE")?;
        positive(self.manual_batch_size, "MANUAL_PULL_BATCH_SIZE")?;
        if self.pull_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "PULL_TIMEOUT",
                reason: "must be greater than zero",
            });
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "BUFFER_CAPACITY",
                reason: "must be greater than zero",
            });
        }
        let connection = match self.emulator_host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => Connection::Emulator {
                endpoint: format!("http://{host}"),
            },
            _ => Connection::Service {
                endpoint: self.endpoint.clone(),
            },
        };

        Ok(Config {
            target: SubscriptionTarget::new(project_id, subscription_id),
            port: self.port,
            connection,
            manual_batch_size: self.manual_batch_size,
            pull_timeout: self.pull_timeout,
            loop_options: LoopOptions {
                batch_size: self.batch_size,
                poll_interval: self.poll_interval,
                error_backoff: self.error_backoff,
            },
            buffer_capacity: self.buffer_capacity,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn positive(value: i32, name: &'static str) -> Result<(), ConfigError> {
    if value > 0 {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        name,
        reason: "must be greater than zero",
    })
}
