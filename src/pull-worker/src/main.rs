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

use clap::Parser;
use google_cloud_auth::credentials::anonymous::Builder as Anonymous;
use google_cloud_auth::credentials::{Builder as CredentialsBuilder, Credentials};
use pubsub_pull_worker::broker::rest::RestBroker;
use pubsub_pull_worker::config::{Args, Connection, LogFormat};
use pubsub_pull_worker::poll_loop;
use pubsub_pull_worker::processor::Processor;
use pubsub_pull_worker::puller::Puller;
use pubsub_pull_worker::recent::RecentMessages;
use pubsub_pull_worker::server::{self, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    enable_tracing(args.log_format);

    let config = match args.validate() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };
    tracing::info!(
        project = config.target.project_id(),
        subscription = config.target.subscription_id(),
        endpoint = config.connection.endpoint(),
        "starting worker"
    );

    let credentials: Credentials = match &config.connection {
        Connection::Service { .. } => CredentialsBuilder::default().build()?,
        Connection::Emulator { .. } => Anonymous::new().build(),
    };
    let broker = RestBroker::new(config.connection.endpoint(), credentials)?
        .with_settle_timeout(config.pull_timeout);
    let recent = Arc::new(RecentMessages::new(config.buffer_capacity));
    let puller = Puller::new(
        Arc::new(broker),
        &config.target,
        Processor::new(recent.clone()),
    )
    .with_pull_timeout(config.pull_timeout);

    // The loop runs until the process exits, nothing joins it.
    let _poll_loop = poll_loop::spawn(puller.clone(), config.loop_options.clone());

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "serving HTTP requests");
    let router = server::router(AppState {
        puller,
        recent,
        manual_batch_size: config.manual_batch_size,
    });
    server::serve(listener, router).await?;
    tracing::info!("DONE");
    Ok(())
}

fn enable_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_target(false);
    match format {
        LogFormat::Json => builder.json().with_current_span(false).init(),
        LogFormat::Text => builder.with_thread_ids(true).init(),
    }
}
