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

/// A [Broker] implementation over the Pub/Sub REST API.
pub mod rest;

use crate::error::BrokerResult;
use crate::model::ReceivedMessage;
use std::time::Duration;

/// The operations the worker needs from a message broker.
///
/// Delivery guarantees, redelivery, and ack deadlines are the broker's
/// responsibility. The worker only pulls, acknowledges, and rejects.
#[async_trait::async_trait]
pub trait Broker: std::fmt::Debug + Send + Sync {
    /// Pulls up to `max_messages` from `subscription`.
    ///
    /// Returns an empty list if no messages are available. The call does not
    /// wait longer than `timeout`.
    async fn pull(
        &self,
        subscription: &str,
        max_messages: i32,
        timeout: Duration,
    ) -> BrokerResult<Vec<ReceivedMessage>>;

    /// Acknowledges a batch of deliveries.
    async fn acknowledge(&self, subscription: &str, ack_ids: Vec<String>) -> BrokerResult<()>;

    /// Makes a batch of deliveries available for redelivery.
    async fn negative_acknowledge(
        &self,
        subscription: &str,
        ack_ids: Vec<String>,
    ) -> BrokerResult<()>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;

    mockall::mock! {
        #[derive(Debug)]
        pub(crate) Broker {}
        #[async_trait::async_trait]
        impl Broker for Broker {
            async fn pull(
                &self,
                subscription: &str,
                max_messages: i32,
                timeout: Duration,
            ) -> BrokerResult<Vec<ReceivedMessage>>;
            async fn acknowledge(&self, subscription: &str, ack_ids: Vec<String>) -> BrokerResult<()>;
            async fn negative_acknowledge(
                &self,
                subscription: &str,
                ack_ids: Vec<String>,
            ) -> BrokerResult<()>;
        }
    }

    pub(crate) fn test_ack_id(i: usize) -> String {
        format!("ack-{i:03}")
    }

    pub(crate) fn test_message(i: usize, payload: impl Into<Bytes>) -> ReceivedMessage {
        ReceivedMessage {
            id: format!("message-{i:03}"),
            payload: payload.into(),
            attributes: HashMap::new(),
            ack_id: test_ack_id(i),
            publish_time: None,
        }
    }

    pub(crate) fn sorted(v: &[String]) -> Vec<String> {
        let mut v = v.to_vec();
        v.sort();
        v
    }
}
