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

use async_trait::async_trait;
use log::{trace, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use super::{BusError, BusMessage, BusResult, MessageBus, Subscription};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-subscriber buffer. Messages for a subscriber this far behind are dropped.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

const INBOX_PREFIX: &str = "_INBOX.";

/// In-process message bus.
///
/// Subjects are matched exactly. Every subscriber of a subject receives every
/// message published to it while its buffer has room; a slow consumer whose
/// buffer is full misses messages instead of blocking the publisher. Requests use a private inbox subject per call,
/// so concurrent requests never see each other's replies.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(LocalMessageBus::new());
/// let mut sub = bus.subscribe("user").await?;
/// tokio::spawn(async move {
///     while let Some(msg) = sub.next().await {
///         // handle and answer on msg.reply
///     }
/// });
/// let reply = bus.request("user", payload).await?;
/// ```
pub struct LocalMessageBus {
    subscribers: RwLock<HashMap<String, Vec<mpsc::Sender<BusMessage>>>>,
    next_inbox: AtomicU64,
    request_timeout: Duration,
    channel_capacity: usize,
}

impl Default for LocalMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalMessageBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_inbox: AtomicU64::new(1),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set how long `request` waits for a reply.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Number of live subscriptions on a subject.
    pub async fn subscriber_count(&self, subject: &str) -> usize {
        let subscribers = self.subscribers.read().await;
        subscribers
            .get(subject)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// Deliver to every subscriber of the message subject and return how many
    /// received it. Never waits on a subscriber. Closed subscriptions are
    /// pruned on the way.
    async fn deliver(&self, message: BusMessage) -> usize {
        let senders = {
            let subscribers = self.subscribers.read().await;
            subscribers.get(&message.subject).cloned().unwrap_or_default()
        };

        let mut delivered = 0;
        let mut closed = false;
        for tx in &senders {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => warn!(
                    "Subscriber on '{}' is not keeping up, dropping message",
                    message.subject
                ),
                Err(TrySendError::Closed(_)) => closed = true,
            }
        }

        if closed {
            let mut subscribers = self.subscribers.write().await;
            if let Some(list) = subscribers.get_mut(&message.subject) {
                list.retain(|tx| !tx.is_closed());
                if list.is_empty() {
                    subscribers.remove(&message.subject);
                }
            }
        }

        trace!(
            "Delivered message on '{}' to {delivered} subscriber(s)",
            message.subject
        );
        delivered
    }

    async fn remove_subject(&self, subject: &str) {
        self.subscribers.write().await.remove(subject);
    }
}

#[async_trait]
impl MessageBus for LocalMessageBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.deliver(BusMessage {
            subject: subject.to_string(),
            reply: None,
            payload,
        })
        .await;
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> BusResult<Subscription> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        self.subscribers
            .write()
            .await
            .entry(subject.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(subject, rx))
    }

    async fn request(&self, subject: &str, payload: Vec<u8>) -> BusResult<Vec<u8>> {
        let inbox = format!(
            "{INBOX_PREFIX}{}",
            self.next_inbox.fetch_add(1, Ordering::Relaxed)
        );
        let mut replies = self.subscribe(&inbox).await?;

        let delivered = self
            .deliver(BusMessage {
                subject: subject.to_string(),
                reply: Some(inbox.clone()),
                payload,
            })
            .await;

        if delivered == 0 {
            self.remove_subject(&inbox).await;
            return Err(BusError::NoResponders {
                subject: subject.to_string(),
            });
        }

        let outcome = tokio::time::timeout(self.request_timeout, replies.next()).await;
        self.remove_subject(&inbox).await;

        match outcome {
            Ok(Some(reply)) => Ok(reply.payload),
            Ok(None) => Err(BusError::Closed),
            Err(_) => Err(BusError::Timeout {
                subject: subject.to_string(),
                timeout: self.request_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn spawn_echo(bus: Arc<LocalMessageBus>, subject: &str) {
        let mut sub = bus.subscribe(subject).await.unwrap();
        tokio::spawn(async move {
            while let Some(msg) = sub.next().await {
                if let Some(reply) = msg.reply {
                    let mut answer = b"echo:".to_vec();
                    answer.extend_from_slice(&msg.payload);
                    bus.publish(&reply, answer).await.unwrap();
                }
            }
        });
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = LocalMessageBus::new();
        let mut a = bus.subscribe("events").await.unwrap();
        let mut b = bus.subscribe("events").await.unwrap();
        let mut other = bus.subscribe("other").await.unwrap();

        bus.publish("events", b"hello".to_vec()).await.unwrap();

        assert_eq!(a.next().await.unwrap().payload, b"hello");
        assert_eq!(b.next().await.unwrap().payload, b"hello");
        assert!(other.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = LocalMessageBus::new();
        assert!(bus.publish("nobody", b"x".to_vec()).await.is_ok());
    }

    #[tokio::test]
    async fn test_request_reply() {
        let bus = Arc::new(LocalMessageBus::new());
        spawn_echo(bus.clone(), "echo").await;

        let reply = bus.request("echo", b"ping".to_vec()).await.unwrap();
        assert_eq!(reply, b"echo:ping");

        // inbox subscriptions are cleaned up after each request
        let subscribers = bus.subscribers.read().await;
        assert!(subscribers.keys().all(|s| !s.starts_with(INBOX_PREFIX)));
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_their_own_replies() {
        let bus = Arc::new(LocalMessageBus::new());
        spawn_echo(bus.clone(), "echo").await;

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    let reply = bus.request("echo", format!("{i}").into_bytes()).await.unwrap();
                    assert_eq!(reply, format!("echo:{i}").into_bytes());
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_request_without_responders() {
        let bus = LocalMessageBus::new();
        let result = bus.request("missing", b"x".to_vec()).await;
        assert!(matches!(result, Err(BusError::NoResponders { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let bus = LocalMessageBus::new().with_request_timeout(Duration::from_millis(100));
        let _silent = bus.subscribe("silent").await.unwrap();

        let result = bus.request("silent", b"x".to_vec()).await;
        assert!(matches!(result, Err(BusError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_idle_subscriber_does_not_block_publish() {
        let bus = LocalMessageBus::new();
        let mut idle = bus.subscribe("events").await.unwrap();
        let mut active = bus.subscribe("events").await.unwrap();

        for i in 0..DEFAULT_CHANNEL_CAPACITY + 100 {
            bus.publish("events", format!("{i}").into_bytes())
                .await
                .unwrap();
            assert_eq!(active.next().await.unwrap().payload, format!("{i}").into_bytes());
        }

        // the idle subscriber kept the first buffer-full and is still subscribed
        let mut received = 0;
        while idle.rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count("events").await, 2);

        bus.publish("events", b"after".to_vec()).await.unwrap();
        assert_eq!(idle.next().await.unwrap().payload, b"after");
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let bus = LocalMessageBus::new();
        let sub = bus.subscribe("events").await.unwrap();
        assert_eq!(bus.subscriber_count("events").await, 1);

        drop(sub);
        bus.publish("events", b"x".to_vec()).await.unwrap();
        assert_eq!(bus.subscriber_count("events").await, 0);
        assert!(bus.subscribers.read().await.get("events").is_none());
    }
}
