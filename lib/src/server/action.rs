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

//! Named actions a resource server dispatches to.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::Result;

/// What an action handler receives for one request.
#[derive(Debug, Clone, Default)]
pub struct ActionRequest {
    /// Entity id from the request, `None` when absent or empty
    pub id: Option<String>,
    /// The stored entity, for actions that load one and requests with an id
    pub instance: Option<Entity>,
    /// Request body or change-set
    pub body: Option<Value>,
}

/// Trait implemented by every action of a resource.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handle one request and produce the reply value.
    async fn handle(&self, request: ActionRequest) -> Result<Value>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(ActionRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn handle(&self, request: ActionRequest) -> Result<Value> {
        (self.0)(request).await
    }
}

/// An action bound to a name, plus how the server prepares its requests.
///
/// By default the server loads the stored entity before calling the handler
/// (`load_instance`); actions that do not need it, such as a full replace or
/// a delete, turn that off.
///
/// # Example
///
/// ```ignore
/// let touch = InstanceAction::from_fn("TOUCH", |request| async move {
///     let instance = request.instance.ok_or_else(|| ResourceError::bad_request("id is required"))?;
///     Ok(json!({"touched": instance.id()}))
/// });
/// ```
#[derive(Clone)]
pub struct InstanceAction {
    name: String,
    handler: Arc<dyn ActionHandler>,
    load_instance: bool,
    body_schema: Option<String>,
}

impl std::fmt::Debug for InstanceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceAction")
            .field("name", &self.name)
            .field("load_instance", &self.load_instance)
            .field("body_schema", &self.body_schema)
            .finish()
    }
}

impl InstanceAction {
    pub fn new(name: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
            load_instance: true,
            body_schema: None,
        }
    }

    /// Build an action from an async closure.
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ActionRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::new(name, Arc::new(FnHandler(f)))
    }

    pub fn with_load_instance(mut self, load_instance: bool) -> Self {
        self.load_instance = load_instance;
        self
    }

    pub fn with_body_schema(mut self, body_schema: Option<String>) -> Self {
        self.body_schema = body_schema;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loads_instance(&self) -> bool {
        self.load_instance
    }

    pub fn body_schema(&self) -> Option<&str> {
        self.body_schema.as_deref()
    }

    pub fn handler(&self) -> &Arc<dyn ActionHandler> {
        &self.handler
    }
}
