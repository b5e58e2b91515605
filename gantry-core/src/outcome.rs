// Outcome types handed to the response sink

use crate::error::{Error, ErrorKind};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Response metadata emitted alongside a success payload.
///
/// The transport layer owns wire encoding; it reads headers and cookies
/// from here and the status from the outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMeta {
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
}

impl ResponseMeta {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The value threaded through the interceptor chain: the handler's payload
/// plus the response metadata accumulated so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub payload: Value,
    pub meta: ResponseMeta,
}

impl Reply {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            meta: ResponseMeta::new(),
        }
    }

    /// An empty reply with a null payload.
    pub fn empty() -> Self {
        Self::new(Value::Null)
    }

    /// Build a reply from any serializable value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, Error> {
        let payload =
            serde_json::to_value(value).map_err(|e| Error::Internal(e.to_string()))?;
        Ok(Self::new(payload))
    }

    /// Transform the payload, keeping the metadata.
    pub fn map_payload(mut self, f: impl FnOnce(Value) -> Value) -> Self {
        self.payload = f(self.payload);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.cookies.insert(name.into(), value.into());
        self
    }
}

/// The single result produced per dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler produced a value; payload and metadata go to the sink.
    Success { payload: Value, meta: ResponseMeta },
    /// A stage failed; the exception filter chain produced this mapping.
    Failure {
        kind: ErrorKind,
        detail: Value,
        status: u16,
    },
}

impl Outcome {
    pub fn failure(kind: ErrorKind, detail: Value, status: u16) -> Self {
        Outcome::Failure {
            kind,
            detail,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    /// Status hint for the sink; successes report 200.
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Success { .. } => 200,
            Outcome::Failure { status, .. } => *status,
        }
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Outcome::Success {
            payload: reply.payload,
            meta: reply.meta,
        }
    }
}
