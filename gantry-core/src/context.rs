// Per-request execution context shared by all pipeline stages

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const PRINCIPAL_KEY: &str = "principal";

/// Append-only, request-scoped metadata slot.
///
/// Stages communicate across the pipeline by attaching named values here,
/// e.g. a guard attaching the authenticated principal. Entries can be added
/// and read but never removed; a value written by an earlier stage stays
/// visible to every later stage and to the handler for the same request.
#[derive(Default)]
pub struct Metadata {
    entries: RwLock<HashMap<String, Value>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a value under a well-known key.
    ///
    /// Re-inserting an existing key replaces its value.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.entries.write().insert(key.into(), value);
    }

    /// Read a value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the slot is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metadata")
            .field("count", &self.entries.read().len())
            .finish()
    }
}

/// Authenticated caller attached to a request by a guard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    /// Stable identifier of the caller
    pub subject: String,
    /// Roles granted to the caller
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }

    /// Check whether the caller holds a role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Per-request context carrying the raw inbound data and the metadata slot.
///
/// Created once per dispatch and destroyed when the request completes. The
/// context is exclusively owned by its request; only the read-only stage
/// configuration is shared between requests.
#[derive(Debug)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub params: HashMap<String, String>,
    pub body: Vec<u8>,
    pub request_id: String,
    metadata: Metadata,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            params: HashMap::new(),
            body: Vec::new(),
            request_id: uuid::Uuid::new_v4().to_string(),
            metadata: Metadata::new(),
        }
    }

    /// Add a raw named parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replace the raw parameter map.
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Set the raw request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Get a raw parameter by name.
    pub fn param(&self, name: &str) -> Option<&String> {
        self.params.get(name)
    }

    /// The metadata slot for cross-stage communication.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Attach the authenticated principal.
    pub fn set_principal(&self, principal: &Principal) {
        if let Ok(value) = serde_json::to_value(principal) {
            self.metadata.insert(PRINCIPAL_KEY, value);
        }
    }

    /// Read the authenticated principal, if one was attached.
    pub fn principal(&self) -> Option<Principal> {
        self.metadata
            .get(PRINCIPAL_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
    }
}
