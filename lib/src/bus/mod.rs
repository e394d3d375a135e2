// Copyright 2025 The Drasi Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Message bus abstraction.
//!
//! Resources are served over a subject-based bus with request/reply
//! semantics: a requester publishes a message carrying a reply subject and
//! waits for exactly one answer on it. `LocalMessageBus` implements this
//! in-process; other transports plug in by implementing [`MessageBus`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

mod local;

pub use local::LocalMessageBus;

/// Error type for message bus operations.
#[derive(Error, Debug)]
pub enum BusError {
    /// A request was sent to a subject nobody listens on
    #[error("No responders for subject '{subject}'")]
    NoResponders { subject: String },

    /// No reply arrived in time
    #[error("Request to '{subject}' timed out after {timeout:?}")]
    Timeout { subject: String, timeout: Duration },

    /// The bus or the subscription has shut down
    #[error("Bus connection closed")]
    Closed,

    /// A payload could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type for message bus operations
pub type BusResult<T> = Result<T, BusError>;

/// A message delivered to a subscriber.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub subject: String,
    /// Subject the receiver should publish its answer to, for requests.
    pub reply: Option<String>,
    pub payload: Vec<u8>,
}

/// Stream of messages published to one subject.
///
/// Dropping the subscription unsubscribes.
pub struct Subscription {
    subject: String,
    rx: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    pub fn new(subject: impl Into<String>, rx: mpsc::Receiver<BusMessage>) -> Self {
        Self {
            subject: subject.into(),
            rx,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Wait for the next message. `None` once the bus has shut down.
    pub async fn next(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }
}

/// Trait defining the request/response message bus resources are served on.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a message to every current subscriber of `subject`.
    ///
    /// Publishing to a subject without subscribers is not an error.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Subscribe to a subject.
    async fn subscribe(&self, subject: &str) -> BusResult<Subscription>;

    /// Send a request and wait for the first reply.
    ///
    /// # Errors
    /// * `BusError::NoResponders` - nobody is subscribed to `subject`
    /// * `BusError::Timeout` - no reply arrived within the bus request timeout
    async fn request(&self, subject: &str, payload: Vec<u8>) -> BusResult<Vec<u8>>;
}
