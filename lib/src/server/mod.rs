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

//! Resource server binding.
//!
//! A [`ResourceServer`] binds an adapter and an ordered list of named
//! actions to a resource name and serves them on the message bus. Requests
//! arrive on the subject `<name>` as an [`ActionEnvelope`] and are answered
//! with a [`Reply`] on the request's reply subject.
//!
//! Dispatch for one request:
//! 1. Find the action by name (case-insensitive). Unknown actions are a bad request.
//! 2. In strict validation mode, reject a body sent to an action without a body schema.
//! 3. For actions that load their instance, load the entity for the request id;
//!    a missing record is `NotFound`.
//! 4. Call the action handler and encode its outcome.

use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::bus::{BusMessage, MessageBus};
use crate::config::JsonValidation;
use crate::entity::Entity;
use crate::error::{ResourceError, Result};
use crate::resource::{BusChangeNotifier, ChangeNotifier, ResourceAdapter};

mod action;
pub mod envelope;


pub use action::{ActionHandler, ActionRequest, InstanceAction};
pub use envelope::{ActionEnvelope, ErrorBody, Reply};

/// Everything a server needs besides its name and the bus.
pub struct ServerOptions {
    pub adapter: Arc<dyn ResourceAdapter>,
    /// Actions in registration order
    pub actions: Vec<InstanceAction>,
    pub json_validation: JsonValidation,
    /// Declared schema documents; body schema refs must name one of these when non-empty
    pub json_schemas: HashMap<String, Value>,
    /// Publishes `emit` notifications; a `BusChangeNotifier` on the server's bus when unset
    pub notifier: Option<Arc<dyn ChangeNotifier>>,
}

impl ServerOptions {
    pub fn new(adapter: Arc<dyn ResourceAdapter>) -> Self {
        Self {
            adapter,
            actions: Vec::new(),
            json_validation: JsonValidation::default(),
            json_schemas: HashMap::new(),
            notifier: None,
        }
    }

    pub fn with_action(mut self, action: InstanceAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_actions(mut self, actions: impl IntoIterator<Item = InstanceAction>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn with_json_validation(mut self, json_validation: JsonValidation) -> Self {
        self.json_validation = json_validation;
        self
    }

    pub fn with_json_schemas(mut self, json_schemas: HashMap<String, Value>) -> Self {
        self.json_schemas = json_schemas;
        self
    }

    /// Share a notifier with the adapter so both publish the same way.
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

struct Dispatcher {
    name: String,
    adapter: Arc<dyn ResourceAdapter>,
    actions: Vec<InstanceAction>,
    json_validation: JsonValidation,
}

impl Dispatcher {
    fn find(&self, action: &str) -> Option<&InstanceAction> {
        self.actions
            .iter()
            .find(|candidate| candidate.name().eq_ignore_ascii_case(action))
    }

    async fn dispatch(&self, envelope: ActionEnvelope) -> Result<Value> {
        let ActionEnvelope { action, id, body } = envelope;

        let Some(action) = self.find(&action) else {
            return Err(ResourceError::bad_request(format!(
                "unknown action '{action}' for resource '{}'",
                self.name
            )));
        };

        if self.json_validation == JsonValidation::Strict
            && body.is_some()
            && action.body_schema().is_none()
        {
            return Err(ResourceError::bad_request(format!(
                "action '{}' of resource '{}' does not accept a body",
                action.name(),
                self.name
            )));
        }

        let id = id.filter(|id| !id.is_empty());
        let instance = match &id {
            Some(id) if action.loads_instance() => Some(
                self.adapter
                    .load(id)
                    .await?
                    .ok_or_else(|| ResourceError::not_found(&self.name, id))?,
            ),
            _ => None,
        };

        action
            .handler()
            .handle(ActionRequest { id, instance, body })
            .await
    }

    async fn handle_message(&self, bus: &dyn MessageBus, message: BusMessage) {
        let result = match serde_json::from_slice::<ActionEnvelope>(&message.payload) {
            Ok(envelope) => {
                let action = envelope.action.clone();
                debug!(
                    "[{}] Dispatching action '{action}' (id: {:?})",
                    self.name, envelope.id
                );
                let result = self.dispatch(envelope).await;
                if let Err(e) = &result {
                    if e.is_client_error() {
                        debug!("[{}] Action '{action}' rejected: {e}", self.name);
                    } else {
                        error!("[{}] Action '{action}' failed: {e}", self.name);
                    }
                }
                result
            }
            Err(e) => {
                debug!("[{}] Discarding undecodable request: {e}", self.name);
                Err(ResourceError::bad_request(format!("invalid request: {e}")))
            }
        };

        let Some(reply_subject) = message.reply else {
            debug!("[{}] Request without reply subject, dropping reply", self.name);
            return;
        };

        let payload = match serde_json::to_vec(&Reply::from_result(result)) {
            Ok(payload) => payload,
            Err(e) => {
                error!("[{}] Failed to encode reply: {e}", self.name);
                return;
            }
        };

        if let Err(e) = bus.publish(&reply_subject, payload).await {
            warn!(
                "[{}] Failed to publish reply to '{reply_subject}': {e}",
                self.name
            );
        }
    }
}

/// Serves one resource's actions on the message bus.
pub struct ResourceServer {
    name: String,
    bus: Arc<dyn MessageBus>,
    dispatcher: Arc<Dispatcher>,
    notifier: Arc<dyn ChangeNotifier>,
    started: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ResourceServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceServer")
            .field("name", &self.name)
            .field("actions", &self.action_names())
            .field("started", &self.is_running())
            .finish()
    }
}

impl ResourceServer {
    /// Create a server for `name`. Nothing is subscribed until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidConfig` if the name is empty, two actions
    /// share a name, or an action refers to a body schema that is not declared.
    pub fn new(
        bus: Arc<dyn MessageBus>,
        name: impl Into<String>,
        options: ServerOptions,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ResourceError::invalid_config("resource name is required"));
        }

        let mut seen = HashSet::new();
        for action in &options.actions {
            if !seen.insert(action.name().to_ascii_uppercase()) {
                return Err(ResourceError::invalid_config(format!(
                    "resource '{name}': duplicate action '{}'",
                    action.name()
                )));
            }
            if let Some(schema) = action.body_schema() {
                if !options.json_schemas.is_empty() && !options.json_schemas.contains_key(schema)
                {
                    return Err(ResourceError::invalid_config(format!(
                        "resource '{name}': action '{}' refers to undeclared schema '{schema}'",
                        action.name()
                    )));
                }
            }
        }

        let notifier = options
            .notifier
            .unwrap_or_else(|| Arc::new(BusChangeNotifier::new(bus.clone())));

        Ok(Self {
            notifier,
            dispatcher: Arc::new(Dispatcher {
                name: name.clone(),
                adapter: options.adapter,
                actions: options.actions,
                json_validation: options.json_validation,
            }),
            name,
            bus,
            started: AtomicBool::new(false),
            listener: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the registered actions, in registration order.
    pub fn action_names(&self) -> Vec<&str> {
        self.dispatcher.actions.iter().map(|a| a.name()).collect()
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Subscribe to the resource subject and begin serving requests.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidState` if the server is already running,
    /// or the bus error if the subscription cannot be created.
    pub async fn start(&self) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ResourceError::invalid_state(format!(
                "resource '{}' is already started",
                self.name
            )));
        }

        let mut subscription = match self.bus.subscribe(&self.name).await {
            Ok(subscription) => subscription,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let bus = self.bus.clone();
        let dispatcher = self.dispatcher.clone();
        let handle = tokio::spawn(async move {
            while let Some(message) = subscription.next().await {
                let bus = bus.clone();
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.handle_message(bus.as_ref(), message).await;
                });
            }
            debug!("[{}] Request listener exited", dispatcher.name);
        });

        *self.listener.lock().await = Some(handle);
        info!("[{}] Listening for requests", self.name);
        Ok(())
    }

    /// Stop listening. Requests already being handled run to completion.
    pub async fn stop(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
            let _ = handle.await;
            info!("[{}] Stopped listening for requests", self.name);
        }
        self.started.store(false, Ordering::SeqCst);
    }

    /// Dispatch an envelope directly, without going through the bus.
    pub async fn dispatch(&self, envelope: ActionEnvelope) -> Result<Value> {
        self.dispatcher.dispatch(envelope).await
    }

    /// Publish a change notification for `entity` through the server's notifier.
    pub async fn emit(&self, entity: &Entity) -> Result<()> {
        self.notifier
            .notify(&self.name, &self.dispatcher.adapter.serialize(entity))
            .await
            .map_err(|source| ResourceError::Notification {
                resource: self.name.clone(),
                id: entity.id().unwrap_or_default().to_string(),
                source,
            })
    }
}
