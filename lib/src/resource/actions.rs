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

//! Default CRUD actions.
//!
//! | Action | Loads instance | Body | Reply |
//! |--------|----------------|------|-------|
//! | GET    | yes | none | stored entity |
//! | PUT    | no  | required, object | stored entity |
//! | PATCH  | yes | required change-set | merged and stored entity |
//! | DELETE | no  | none | `{"result": "OK"}` |

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::adapter::ResourceAdapter;
use crate::entity::Entity;
use crate::error::{ResourceError, Result};
use crate::server::{ActionHandler, ActionRequest, InstanceAction};

pub const GET: &str = "GET";
pub const PUT: &str = "PUT";
pub const PATCH: &str = "PATCH";
pub const DELETE: &str = "DELETE";

/// Build GET, PUT, PATCH and DELETE for an adapter.
///
/// `body_schema` is attached to PUT and PATCH.
pub fn default_actions(
    adapter: Arc<dyn ResourceAdapter>,
    body_schema: Option<String>,
) -> Vec<InstanceAction> {
    vec![
        InstanceAction::new(GET, Arc::new(GetAction(adapter.clone()))),
        InstanceAction::new(PUT, Arc::new(PutAction(adapter.clone())))
            .with_load_instance(false)
            .with_body_schema(body_schema.clone()),
        InstanceAction::new(PATCH, Arc::new(PatchAction(adapter.clone())))
            .with_body_schema(body_schema),
        InstanceAction::new(DELETE, Arc::new(DeleteAction(adapter))).with_load_instance(false),
    ]
}

fn require_id(request: &ActionRequest) -> Result<&str> {
    request
        .id
        .as_deref()
        .ok_or_else(|| ResourceError::bad_request("id is required"))
}

fn require_body(body: Option<Value>) -> Result<Value> {
    body.ok_or_else(|| ResourceError::bad_request("request body is required"))
}

struct GetAction(Arc<dyn ResourceAdapter>);

#[async_trait]
impl ActionHandler for GetAction {
    async fn handle(&self, request: ActionRequest) -> Result<Value> {
        require_id(&request)?;
        match &request.instance {
            Some(instance) => Ok(self.0.serialize(instance)),
            None => Err(ResourceError::not_found(
                self.0.resource_name(),
                request.id.unwrap_or_default(),
            )),
        }
    }
}

struct PutAction(Arc<dyn ResourceAdapter>);

#[async_trait]
impl ActionHandler for PutAction {
    async fn handle(&self, request: ActionRequest) -> Result<Value> {
        let id = require_id(&request)?;
        let body = Entity::try_from(require_body(request.body.clone())?)
            .map_err(|_| ResourceError::bad_request("request body must be a JSON object"))?;

        let stored = self.0.upsert(id, &body).await?;
        Ok(self.0.serialize(&stored))
    }
}

struct PatchAction(Arc<dyn ResourceAdapter>);

#[async_trait]
impl ActionHandler for PatchAction {
    async fn handle(&self, request: ActionRequest) -> Result<Value> {
        let id = require_id(&request)?;
        let changes = require_body(request.body.clone())?;
        let Value::Object(changes) = changes else {
            return Err(ResourceError::bad_request("change-set must be a JSON object"));
        };

        let mut instance = request
            .instance
            .clone()
            .ok_or_else(|| ResourceError::not_found(self.0.resource_name(), id))?;
        instance.merge(&changes);

        let stored = self.0.upsert(id, &instance).await?;
        Ok(self.0.serialize(&stored))
    }
}

struct DeleteAction(Arc<dyn ResourceAdapter>);

#[async_trait]
impl ActionHandler for DeleteAction {
    async fn handle(&self, request: ActionRequest) -> Result<Value> {
        let id = require_id(&request)?;
        let ack = self.0.delete(id).await?;
        Ok(serde_json::to_value(ack).map_err(anyhow::Error::from)?)
    }
}
