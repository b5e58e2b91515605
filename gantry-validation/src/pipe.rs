// Schema validation pipe

use crate::schema::Schema;
use async_trait::async_trait;
use gantry_core::{Error, ParamMeta, Pipe};
use serde_json::Value;
use std::sync::Arc;

/// Pipe that validates and normalizes a payload against a declared schema.
///
/// On success the handler receives the normalized value, which may differ
/// from the input: defaults applied, undeclared fields stripped. On failure
/// the collected violations travel with the validation error.
pub struct SchemaPipe {
    schema: Arc<Schema>,
}

impl SchemaPipe {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    /// Build from an already-shared schema.
    pub fn shared(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

#[async_trait]
impl Pipe for SchemaPipe {
    async fn transform(&self, value: Value, _meta: &ParamMeta) -> Result<Value, Error> {
        self.schema.validate(&value).map_err(Error::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use gantry_core::Expects;
    use serde_json::json;

    fn pipe() -> SchemaPipe {
        SchemaPipe::new(
            Schema::object()
                .field(Field::text("name").required())
                .field(Field::text("color").default_value(json!("tabby"))),
        )
    }

    #[tokio::test]
    async fn test_schema_pipe_normalizes() {
        let meta = ParamMeta::new("body", Expects::Object);
        let value = pipe()
            .transform(json!({"name": "Tom", "extra": true}), &meta)
            .await
            .unwrap();
        assert_eq!(value, json!({"name": "Tom", "color": "tabby"}));
    }

    #[tokio::test]
    async fn test_schema_pipe_rejects_with_violations() {
        let meta = ParamMeta::new("body", Expects::Object);
        let err = pipe().transform(json!({}), &meta).await.unwrap_err();

        match err {
            Error::Validation(failure) => {
                assert_eq!(failure.violations.len(), 1);
                assert_eq!(failure.violations[0].field, "name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
