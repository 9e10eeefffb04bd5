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

use crate::error::DecodeError;
use crate::model::{ProcessedRecord, ReceivedMessage};
use crate::recent::RecentMessages;
use std::sync::Arc;

/// What the worker does with a message after processing it.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Acknowledge the delivery with this ack id.
    Ack(String),
    /// Reject the delivery with this ack id, so the broker redelivers it.
    Nack(String),
}

/// Decodes messages, logs their contents, and records them.
#[derive(Clone, Debug)]
pub struct Processor {
    recent: Arc<RecentMessages>,
}

impl Processor {
    pub fn new(recent: Arc<RecentMessages>) -> Self {
        Self { recent }
    }

    /// Processes a single message.
    ///
    /// Messages with a payload that is not valid UTF-8 are rejected. All other
    /// messages are recorded and acknowledged, whether or not they contain
    /// JSON.
    pub fn process(&self, message: &ReceivedMessage) -> Outcome {
        tracing::info!(message_id = %message.id, "received message");
        let data = match decode(message) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(message_id = %message.id, error = %e, "rejecting message");
                return Outcome::Nack(message.ack_id.clone());
            }
        };
        match serde_json::from_str::<serde_json::Value>(&data) {
            Ok(value) => {
                tracing::info!(message_id = %message.id, payload = %value, "structured payload");
            }
            Err(e) => {
                tracing::debug!(message_id = %message.id, error = %e, "non-structured payload");
                tracing::info!(message_id = %message.id, payload = %data, "text payload");
            }
        }
        self.recent.push(ProcessedRecord::new(message, data));
        Outcome::Ack(message.ack_id.clone())
    }
}

fn decode(message: &ReceivedMessage) -> Result<String, DecodeError> {
    std::str::from_utf8(&message.payload)
        .map(str::to_string)
        .map_err(|source| DecodeError {
            message_id: message.id.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::tests::{test_ack_id, test_message};
    use test_case::test_case;

    #[test_case(b"a".as_slice(); "text")]
    #[test_case(br#"{"k":1}"#.as_slice(); "json")]
    #[test_case(b"".as_slice(); "empty")]
    #[test_case("caf\u{e9}".as_bytes(); "multibyte")]
    fn ack_valid_text(payload: &'static [u8]) {
        let recent = Arc::new(RecentMessages::new(10));
        let processor = Processor::new(recent.clone());
        let message = test_message(1, payload);

        let outcome = processor.process(&message);
        assert_eq!(outcome, Outcome::Ack(test_ack_id(1)));

        let records = recent.snapshot();
        assert_eq!(records.len(), 1, "{records:?}");
        assert_eq!(records[0].id, message.id);
        assert_eq!(records[0].data.as_bytes(), payload);
    }

    #[test_case(&[0xff, 0xfe, 0xfd]; "invalid bytes")]
    #[test_case(&[0x61, 0xc3]; "truncated sequence")]
    fn nack_invalid_text(payload: &'static [u8]) {
        let recent = Arc::new(RecentMessages::new(10));
        let processor = Processor::new(recent.clone());
        let message = test_message(2, payload);

        let outcome = processor.process(&message);
        assert_eq!(outcome, Outcome::Nack(test_ack_id(2)));
        assert!(recent.is_empty());
    }

    #[test]
    fn keeps_attributes() {
        let recent = Arc::new(RecentMessages::new(10));
        let processor = Processor::new(recent.clone());
        let mut message = test_message(3, "hello");
        message
            .attributes
            .insert("origin".to_string(), "test".to_string());
        message.publish_time = Some("2026-01-02T03:04:05Z".to_string());

        let _ = processor.process(&message);
        let records = recent.snapshot();
        assert_eq!(records[0].attributes, message.attributes);
        assert_eq!(records[0].publish_time, message.publish_time);
    }

    #[test]
    fn decode_error_details() {
        let message = test_message(4, vec![0xff_u8]);
        let err = decode(&message).unwrap_err();
        assert_eq!(err.message_id, message.id);
        assert_eq!(err.source.valid_up_to(), 0);
    }
}
