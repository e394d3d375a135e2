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
use serde_json::Value;
use std::sync::Arc;

use crate::bus::{BusResult, MessageBus};

/// Subject change notifications of a resource are published to.
pub fn change_subject(resource: &str) -> String {
    format!("{resource}.changed")
}

/// Publishes the state of an entity after it was written.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify(&self, resource: &str, entity: &Value) -> BusResult<()>;
}

/// Publishes change notifications as JSON on `<resource>.changed`.
pub struct BusChangeNotifier {
    bus: Arc<dyn MessageBus>,
}

impl BusChangeNotifier {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl ChangeNotifier for BusChangeNotifier {
    async fn notify(&self, resource: &str, entity: &Value) -> BusResult<()> {
        let payload = serde_json::to_vec(entity)?;
        self.bus.publish(&change_subject(resource), payload).await
    }
}
