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

//! Bus client for a resource served by a `ResourceServer`.

use log::debug;
use serde_json::Value;
use std::sync::Arc;

use crate::bus::{BusError, MessageBus, Subscription};
use crate::entity::Entity;
use crate::error::{ResourceError, Result};
use crate::resource::change_subject;
use crate::server::{ActionEnvelope, Reply};

/// Sends action requests to one resource and decodes the replies.
///
/// Error replies come back as `ResourceError::Remote` with the status the
/// server reported.
#[derive(Clone)]
pub struct ResourceClient {
    bus: Arc<dyn MessageBus>,
    resource: String,
}

impl ResourceClient {
    pub fn new(bus: Arc<dyn MessageBus>, resource: impl Into<String>) -> Self {
        Self {
            bus,
            resource: resource.into(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Send any action and return the result value.
    pub async fn call(&self, envelope: ActionEnvelope) -> Result<Value> {
        debug!(
            "Calling '{}' on resource '{}'",
            envelope.action, self.resource
        );
        let payload = serde_json::to_vec(&envelope).map_err(BusError::from)?;
        let reply = self.bus.request(&self.resource, payload).await?;
        let reply: Reply = serde_json::from_slice(&reply).map_err(BusError::from)?;
        reply.into_result()
    }

    pub async fn get(&self, id: &str) -> Result<Entity> {
        let value = self.call(ActionEnvelope::new("GET").with_id(id)).await?;
        into_entity(value)
    }

    pub async fn put(&self, id: &str, body: Value) -> Result<Entity> {
        let value = self
            .call(ActionEnvelope::new("PUT").with_id(id).with_body(body))
            .await?;
        into_entity(value)
    }

    pub async fn patch(&self, id: &str, changes: Value) -> Result<Entity> {
        let value = self
            .call(ActionEnvelope::new("PATCH").with_id(id).with_body(changes))
            .await?;
        into_entity(value)
    }

    pub async fn delete(&self, id: &str) -> Result<Value> {
        self.call(ActionEnvelope::new("DELETE").with_id(id)).await
    }

    /// Subscribe to the change notifications of the resource.
    pub async fn subscribe_changes(&self) -> Result<Subscription> {
        Ok(self.bus.subscribe(&change_subject(&self.resource)).await?)
    }
}

fn into_entity(value: Value) -> Result<Entity> {
    Entity::try_from(value).map_err(|other| {
        ResourceError::Internal(anyhow::anyhow!(
            "expected an entity object in reply, got {other}"
        ))
    })
}
