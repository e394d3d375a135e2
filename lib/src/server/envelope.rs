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

//! JSON envelopes exchanged with a resource server.
//!
//! ```text
//! request:  {"action": "PATCH", "id": "u1", "body": {"name": "Bob"}}
//! success:  {"result": {"id": "u1", "name": "Bob"}}
//! failure:  {"error": {"status": 404, "message": "user 'u1' not found"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ResourceError, Result};

/// Inbound request for one action of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ActionEnvelope {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            id: None,
            body: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Error details carried by a failure reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

/// Reply to an [`ActionEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply {
    Result(Value),
    Error(ErrorBody),
}

impl Reply {
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Reply::Result(value),
            Err(e) => Reply::from_error(&e),
        }
    }

    pub fn from_error(error: &ResourceError) -> Self {
        Reply::Error(ErrorBody {
            status: error.status_code(),
            message: error.to_string(),
        })
    }

    /// Turn an error reply into `ResourceError::Remote`.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Reply::Result(value) => Ok(value),
            Reply::Error(ErrorBody { status, message }) => {
                Err(ResourceError::Remote { status, message })
            }
        }
    }
}
