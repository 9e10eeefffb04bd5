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

//! A Pub/Sub pull worker for Cloud Run.
//!
//! The worker runs a background loop that pulls messages from a [pull
//! subscription], logs them, keeps the most recent ones in memory, and
//! acknowledges them. Messages that are not valid UTF-8 are negatively
//! acknowledged so the service redelivers them.
//!
//! An HTTP server runs alongside the loop. It provides a liveness check, a way
//! to trigger a pull on demand, and a listing of the recent messages.
//!
//! [pull subscription]: https://cloud.google.com/pubsub/docs/pull

pub mod broker;
pub mod config;
pub mod error;
pub mod model;
pub mod poll_loop;
pub mod processor;
pub mod puller;
pub mod recent;
pub mod server;

pub use error::{BrokerError, BrokerResult, ConfigError, DecodeError};
