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

use crate::puller::Puller;
use tokio::task::JoinHandle;
use tokio::time::Duration;

pub const DEFAULT_BATCH_SIZE: i32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(30);

/// Configures the background poll loop.
#[derive(Clone, Debug, PartialEq)]
pub struct LoopOptions {
    /// The maximum number of messages requested by each pull.
    pub batch_size: i32,
    /// The pause after a successful pass.
    pub poll_interval: Duration,
    /// The pause after a failed pass.
    pub error_backoff: Duration,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

/// Spawns a task that pulls from the subscription until the process exits.
///
/// The first pass starts immediately. Broker errors are logged and retried
/// after `error_backoff`; they never stop the loop.
///
/// Nothing waits for this task on shutdown. Dropping the returned handle
/// detaches the task, aborting it stops the loop.
pub fn spawn(puller: Puller, options: LoopOptions) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            subscription = puller.subscription(),
            batch_size = options.batch_size,
            "listening for messages"
        );
        loop {
            let pause = match puller.pull_once(options.batch_size).await {
                Ok(summary) => {
                    if summary.messages_received > 0 {
                        tracing::info!(
                            received = summary.messages_received,
                            processed = summary.messages_processed,
                            "background pull complete"
                        );
                    }
                    options.poll_interval
                }
                Err(e) => {
                    tracing::error!(error = %e, backoff = ?options.error_backoff, "background pull failed");
                    options.error_backoff
                }
            };
            tokio::time::sleep(pause).await;
        }
    })
}
