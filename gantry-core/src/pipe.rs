// Pipes for per-parameter transformation and validation

use crate::error::{Error, FieldViolation, ValidationFailure};
use async_trait::async_trait;
use serde_json::Value;

/// Describes the handler parameter a pipe is transforming.
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Declared parameter name, used in violation reports
    pub name: String,
    /// Expected shape of the transformed value
    pub expects: Expects,
}

impl ParamMeta {
    pub fn new(name: impl Into<String>, expects: Expects) -> Self {
        Self {
            name: name.into(),
            expects,
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, Expects::Any)
    }
}

/// Expected shape of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expects {
    #[default]
    Any,
    Integer,
    Number,
    Text,
    Object,
}

/// Pipe trait for transforming extracted inputs before they reach the
/// handler. Pipes bound to the same parameter run in registration order,
/// each receiving the previous pipe's output.
#[async_trait]
pub trait Pipe: Send + Sync {
    async fn transform(&self, value: Value, meta: &ParamMeta) -> Result<Value, Error>;
}

/// Parses an integer-representable input into a JSON integer.
pub struct ParseIntPipe;

#[async_trait]
impl Pipe for ParseIntPipe {
    async fn transform(&self, value: Value, meta: &ParamMeta) -> Result<Value, Error> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
            Value::String(raw) => match raw.trim().parse::<i64>() {
                Ok(parsed) => Ok(Value::from(parsed)),
                Err(_) => Err(Error::Validation(ValidationFailure::of(
                    FieldViolation::new(&meta.name, "expected an integer")
                        .with_constraint("is_integer")
                        .with_value(raw),
                ))),
            },
            other => Err(Error::Validation(ValidationFailure::of(
                FieldViolation::new(&meta.name, "expected an integer")
                    .with_constraint("is_integer")
                    .with_value(other.to_string()),
            ))),
        }
    }
}

/// Substitutes a configured value when the input is missing or null.
pub struct DefaultValuePipe {
    default: Value,
}

impl DefaultValuePipe {
    pub fn new(default: Value) -> Self {
        Self { default }
    }
}

#[async_trait]
impl Pipe for DefaultValuePipe {
    async fn transform(&self, value: Value, _meta: &ParamMeta) -> Result<Value, Error> {
        if value.is_null() {
            Ok(self.default.clone())
        } else {
            Ok(value)
        }
    }
}

/// Trims surrounding whitespace from string input; other values pass
/// through untouched.
pub struct TrimPipe;

#[async_trait]
impl Pipe for TrimPipe {
    async fn transform(&self, value: Value, _meta: &ParamMeta) -> Result<Value, Error> {
        match value {
            Value::String(s) => Ok(Value::String(s.trim().to_string())),
            other => Ok(other),
        }
    }
}
