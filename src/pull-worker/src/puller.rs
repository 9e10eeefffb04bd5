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

use crate::broker::Broker;
use crate::error::BrokerResult;
use crate::model::{PullSummary, SubscriptionTarget};
use crate::processor::{Outcome, Processor};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs pull/process/acknowledge passes against one subscription.
///
/// Both the background poll loop and the `/pull` handler use a `Puller`.
/// Passes are not serialized: concurrent passes may receive disjoint batches,
/// or one of them may receive nothing at all.
///
/// `Puller` is cheap to clone, all the state is behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Puller {
    broker: Arc<dyn Broker>,
    subscription: Arc<str>,
    processor: Processor,
    pull_timeout: Duration,
}

impl Puller {
    pub fn new(broker: Arc<dyn Broker>, target: &SubscriptionTarget, processor: Processor) -> Self {
        Self {
            broker,
            subscription: target.path().into(),
            processor,
            pull_timeout: DEFAULT_PULL_TIMEOUT,
        }
    }

    /// Sets the maximum time a single pull call waits for messages.
    pub fn with_pull_timeout(mut self, v: Duration) -> Self {
        self.pull_timeout = v;
        self
    }

    pub fn subscription(&self) -> &str {
        &self.subscription
    }

    /// Pulls up to `max_messages`, processes them, and settles each delivery.
    ///
    /// Every pulled message is either acknowledged or rejected, never both.
    /// Acknowledgements and rejections are each sent as a single batch, and
    /// an empty batch is not sent at all. The rejections are sent even if the
    /// acknowledgements fail, the first error is returned.
    #[tracing::instrument(level = "debug", skip(self), fields(subscription = %self.subscription))]
    pub async fn pull_once(&self, max_messages: i32) -> BrokerResult<PullSummary> {
        let messages = self
            .broker
            .pull(&self.subscription, max_messages, self.pull_timeout)
            .await?;
        if messages.is_empty() {
            tracing::debug!("no messages available");
            return Ok(PullSummary::default());
        }

        let (mut acks, mut nacks) = (Vec::new(), Vec::new());
        for message in &messages {
            match self.processor.process(message) {
                Outcome::Ack(id) => acks.push(id),
                Outcome::Nack(id) => nacks.push(id),
            }
        }
        let summary = PullSummary {
            messages_processed: acks.len(),
            messages_received: messages.len(),
        };

        // A failed acknowledge must not leave the rejected messages unsettled.
        let acked = if acks.is_empty() {
            Ok(())
        } else {
            self.broker
                .acknowledge(&self.subscription, acks)
                .await
                .inspect(|_| {
                    tracing::info!(count = summary.messages_processed, "acknowledged messages")
                })
        };
        let nacked = if nacks.is_empty() {
            Ok(())
        } else {
            let count = nacks.len();
            self.broker
                .negative_acknowledge(&self.subscription, nacks)
                .await
                .inspect(|_| tracing::warn!(count, "negatively acknowledged messages"))
        };
        if let (Err(_), Err(e)) = (&acked, &nacked) {
            tracing::warn!(error = %e, "negative acknowledge also failed");
        }
        acked.and(nacked)?;
        Ok(summary)
    }
}
