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

//! Errors for the pull worker.
//!
//! Each kind of failure has its own recovery path. Configuration errors stop
//! the process at startup, decode errors reject a single message, and broker
//! errors are retried by the poll loop or reported by the HTTP handlers.

/// Represents an invalid or incomplete configuration.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required setting is missing or blank.
    #[error("missing required setting {0}, set the flag or its environment variable")]
    Missing(&'static str),

    /// A setting has a value outside its valid range.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        name: &'static str,
        reason: &'static str,
    },
}

/// The message payload could not be decoded as text.
#[derive(thiserror::Error, Debug)]
#[error("message {message_id} payload is not valid UTF-8: {source}")]
pub struct DecodeError {
    pub message_id: String,
    #[source]
    pub source: std::str::Utf8Error,
}

/// Represents a failed call to the broker.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum BrokerError {
    /// The credentials could not produce authentication headers.
    #[error("cannot create authentication headers: {0}")]
    Credentials(#[source] google_cloud_auth::errors::CredentialsError),

    /// The request could not be sent, or the response could not be read.
    #[error("the request to the broker failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The broker rejected the request.
    #[error("the broker returned HTTP status {code}: {message}")]
    Status { code: u16, message: String },

    /// The broker response could not be interpreted.
    #[error("cannot parse the broker response: {0}")]
    Response(String),
}

impl BrokerError {
    /// Returns true if the request timed out waiting for the broker.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrokerError::Transport(e) if e.is_timeout())
    }
}

pub type BrokerResult<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages() {
        let err = ConfigError::Missing("PROJECT_ID");
        assert!(err.to_string().contains("PROJECT_ID"), "{err}");

        let err = ConfigError::Invalid {
            name: "PULL_BATCH_SIZE",
            reason: "must be greater than zero",
        };
        assert_eq!(
            err.to_string(),
            "invalid value for PULL_BATCH_SIZE: must be greater than zero"
        );
    }

    #[test]
    fn decode_error() {
        let bytes = vec![0xff_u8, 0xfe];
        let source = std::str::from_utf8(&bytes).unwrap_err();
        let err = DecodeError {
            message_id: "m-1".to_string(),
            source,
        };
        assert!(err.to_string().contains("m-1"), "{err}");
        assert!(std::error::Error::source(&err).is_some(), "{err:?}");
    }

    #[test]
    fn status_error() {
        let err = BrokerError::Status {
            code: 503,
            message: "try again".to_string(),
        };
        assert!(!err.is_timeout(), "{err:?}");
        assert_eq!(
            err.to_string(),
            "the broker returned HTTP status 503: try again"
        );
    }
}
