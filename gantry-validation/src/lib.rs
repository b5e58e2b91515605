//! Schema validation for Gantry handlers
//!
//! Declarative payload schemas checked before a handler runs: required
//! fields, primitive types, string and numeric constraints, defaults, and
//! stripping of undeclared fields. Failures carry the full list of
//! field-level violations.
//!
//! # Examples
//!
//! ## Declaring and validating a schema
//!
//! ```
//! use gantry_validation::{Field, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .field(Field::text("name").required().min_length(1))
//!     .field(Field::integer("age").min(0.0))
//!     .field(Field::text("color").default_value(json!("tabby")));
//!
//! // Defaults are applied and undeclared fields are stripped
//! let normalized = schema
//!     .validate(&json!({"name": "Tom", "age": 3, "owner": "ignored"}))
//!     .unwrap();
//! assert_eq!(normalized, json!({"name": "Tom", "age": 3, "color": "tabby"}));
//!
//! // Violations are collected per field
//! let failure = schema.validate(&json!({"age": -1})).unwrap_err();
//! assert_eq!(failure.violations.len(), 2);
//! ```
//!
//! ## Using the pipe
//!
//! Bind a [`SchemaPipe`] to a body parameter and the dispatcher hands the
//! handler the normalized payload, or routes the violations through the
//! exception filter chain.

mod errors;
mod pipe;
mod schema;

pub use errors::*;
pub use pipe::*;
pub use schema::*;
