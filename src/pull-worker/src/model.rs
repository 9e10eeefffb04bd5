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

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// A message delivered by the broker.
///
/// The `ack_id` identifies this delivery attempt. It is the only value the
/// broker needs to acknowledge or reject the message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReceivedMessage {
    /// The server-assigned message id.
    pub id: String,
    /// The raw message payload.
    pub payload: Bytes,
    /// Optional attributes attached by the publisher.
    pub attributes: HashMap<String, String>,
    /// The opaque token for this delivery.
    pub ack_id: String,
    /// The time the broker received the message, as reported by the broker.
    pub publish_time: Option<String>,
}

/// A message that decoded successfully and was retained for inspection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessedRecord {
    pub id: String,
    pub data: String,
    pub attributes: HashMap<String, String>,
    pub received_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

impl ProcessedRecord {
    pub(crate) fn new(message: &ReceivedMessage, data: String) -> Self {
        Self {
            id: message.id.clone(),
            data,
            attributes: message.attributes.clone(),
            received_at: Utc::now(),
            publish_time: message.publish_time.clone(),
        }
    }
}

/// The result of a single pull/process/acknowledge pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    /// The number of messages acknowledged in this pass.
    pub messages_processed: usize,
    /// The number of messages returned by the broker in this pass.
    pub messages_received: usize,
}

/// Identifies the subscription this process consumes from.
///
/// Resolved once at startup and never changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionTarget {
    project_id: String,
    subscription_id: String,
}

impl SubscriptionTarget {
    pub fn new<P, S>(project_id: P, subscription_id: S) -> Self
    where
        P: Into<String>,
        S: Into<String>,
    {
        Self {
            project_id: project_id.into(),
            subscription_id: subscription_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// The fully qualified subscription name used in broker requests.
    pub fn path(&self) -> String {
        format!(
            "projects/{}/subscriptions/{}",
            self.project_id, self.subscription_id
        )
    }
}
