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

//! Error types for kvres-lib operations.
//!
//! Public APIs return `crate::error::Result<T>` with a structured
//! `ResourceError`. Each variant maps onto a request-level status class via
//! [`ResourceError::status_code`], which is what the resource server puts in
//! an error reply.
//!
//! # Example
//!
//! ```ignore
//! use kvres_lib::error::ResourceError;
//!
//! match client.get("u1").await {
//!     Err(ResourceError::Remote { status: 404, .. }) => println!("no such user"),
//!     Err(e) => return Err(e),
//!     Ok(user) => println!("{user}"),
//! }
//! ```

use thiserror::Error;

use crate::bus::BusError;
use crate::state_store::StoreError;

/// Main error type for resource operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No record is stored for the requested id.
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// Resource name
        resource: String,
        /// Requested entity id
        id: String,
    },

    /// The request is missing a required part or has the wrong shape.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Description of what is wrong with the request
        message: String,
    },

    /// A stored record could not be decoded into an entity.
    #[error("Malformed record at '{key}': {reason}")]
    MalformedRecord {
        /// Storage key of the record
        key: String,
        /// Decoder error
        reason: String,
    },

    /// The key-value store failed. Never retried by the adapter.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The message bus failed while serving or sending a request.
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// The record was written but its change notification could not be published.
    #[error("Change notification for {resource} '{id}' failed: {source}")]
    Notification {
        /// Resource name
        resource: String,
        /// Id of the written entity
        id: String,
        /// Underlying bus failure
        #[source]
        source: BusError,
    },

    /// Invalid resource or plugin configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error
        message: String,
    },

    /// Operation is not valid in the current state.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the state error
        message: String,
    },

    /// Error reply received from a remote resource server.
    #[error("Remote error {status}: {message}")]
    Remote {
        /// Status class reported by the server
        status: u16,
        /// Message reported by the server
        message: String,
    },

    /// Internal error - wraps underlying errors while preserving the error chain.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ResourceError {
    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a bad request error.
    ///
    /// # Example
    /// ```ignore
    /// ResourceError::bad_request("request body is required")
    /// ```
    pub fn bad_request(message: impl Into<String>) -> Self {
        ResourceError::BadRequest {
            message: message.into(),
        }
    }

    /// Create a malformed record error.
    pub fn malformed_record(key: impl Into<String>, reason: impl ToString) -> Self {
        ResourceError::MalformedRecord {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ResourceError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        ResourceError::InvalidState {
            message: message.into(),
        }
    }

    /// Status class used when this error is sent back as a reply.
    ///
    /// 400 for bad requests, 404 for missing records, the remote status for
    /// relayed replies and 500 for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            ResourceError::BadRequest { .. } => 400,
            ResourceError::NotFound { .. } => 404,
            ResourceError::Remote { status, .. } => *status,
            _ => 500,
        }
    }

    /// Whether the error is the caller's fault (4xx class).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Result type for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;
