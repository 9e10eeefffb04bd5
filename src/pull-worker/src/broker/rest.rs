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

use super::Broker;
use crate::error::{BrokerError, BrokerResult};
use crate::model::ReceivedMessage;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use google_cloud_auth::credentials::{CacheableResource, Credentials};
use http::{Extensions, HeaderMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// The default bound on `acknowledge` and `modifyAckDeadline` calls.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Calls the Pub/Sub REST API.
///
/// Negative acknowledgements are implemented as a `modifyAckDeadline` call
/// with a zero deadline, which makes the messages immediately available for
/// redelivery.
///
/// `RestBroker` holds a connection pool internally, it is cheap to clone.
#[derive(Clone, Debug)]
pub struct RestBroker {
    client: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    settle_timeout: Duration,
}

impl RestBroker {
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> BrokerResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(BrokerError::Transport)?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            endpoint,
            credentials,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        })
    }

    /// Sets the maximum time an acknowledge or negative acknowledge call may
    /// take. Unlike pulls, running out this clock is an error.
    pub fn with_settle_timeout(mut self, v: Duration) -> Self {
        self.settle_timeout = v;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, subscription: &str, method: &str) -> String {
        format!("{}/v1/{subscription}:{method}", self.endpoint)
    }

    async fn auth_headers(&self) -> BrokerResult<HeaderMap> {
        let cached = self
            .credentials
            .headers(Extensions::new())
            .await
            .map_err(BrokerError::Credentials)?;
        match cached {
            CacheableResource::New { data, .. } => Ok(data),
            CacheableResource::NotModified => {
                unreachable!("headers are not cached");
            }
        }
    }

    async fn post<B>(
        &self,
        url: String,
        body: &B,
        timeout: Option<Duration>,
    ) -> BrokerResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self
            .client
            .post(url)
            .headers(self.auth_headers().await?)
            .json(body);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let response = builder.send().await.map_err(BrokerError::Transport)?;
        if !response.status().is_success() {
            return Err(to_status_error(response).await);
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Broker for RestBroker {
    async fn pull(
        &self,
        subscription: &str,
        max_messages: i32,
        timeout: Duration,
    ) -> BrokerResult<Vec<ReceivedMessage>> {
        let request = PullRequest { max_messages };
        let response = match self
            .post(self.url(subscription, "pull"), &request, Some(timeout))
            .await
        {
            Ok(r) => r,
            // The service holds pull requests open while no messages are
            // available, running out the clock is an empty pull.
            Err(e) if e.is_timeout() => {
                tracing::debug!(subscription, "pull timed out without messages");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let response = response
            .json::<PullResponse>()
            .await
            .map_err(BrokerError::Transport)?;
        response
            .received_messages
            .into_iter()
            .map(ReceivedMessage::try_from)
            .collect()
    }

    async fn acknowledge(&self, subscription: &str, ack_ids: Vec<String>) -> BrokerResult<()> {
        let request = AcknowledgeRequest { ack_ids };
        self.post(
            self.url(subscription, "acknowledge"),
            &request,
            Some(self.settle_timeout),
        )
        .await?;
        Ok(())
    }

    async fn negative_acknowledge(
        &self,
        subscription: &str,
        ack_ids: Vec<String>,
    ) -> BrokerResult<()> {
        let request = ModifyAckDeadlineRequest {
            ack_ids,
            ack_deadline_seconds: 0,
        };
        self.post(
            self.url(subscription, "modifyAckDeadline"),
            &request,
            Some(self.settle_timeout),
        )
        .await?;
        Ok(())
    }
}

async fn to_status_error(response: reqwest::Response) -> BrokerError {
    let code = response.status().as_u16();
    let message = match response.text().await {
        Err(e) => return BrokerError::Transport(e),
        Ok(body) => serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .map(|e| e.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(body),
    };
    BrokerError::Status { code, message }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    max_messages: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeRequest {
    ack_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyAckDeadlineRequest {
    ack_ids: Vec<String>,
    ack_deadline_seconds: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PullResponse {
    received_messages: Vec<WireReceivedMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WireReceivedMessage {
    ack_id: String,
    message: WireMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WireMessage {
    data: String,
    attributes: HashMap<String, String>,
    message_id: String,
    publish_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: String,
}

impl TryFrom<WireReceivedMessage> for ReceivedMessage {
    type Error = BrokerError;

    fn try_from(value: WireReceivedMessage) -> Result<Self, Self::Error> {
        let payload = STANDARD.decode(&value.message.data).map_err(|e| {
            BrokerError::Response(format!(
                "message {} has invalid base64 data: {e}",
                value.message.message_id
            ))
        })?;
        Ok(ReceivedMessage {
            id: value.message.message_id,
            payload: payload.into(),
            attributes: value.message.attributes,
            ack_id: value.ack_id,
            publish_time: value.message.publish_time,
        })
    }
}
