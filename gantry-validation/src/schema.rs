// Declarative payload schemas

use crate::errors::Violations;
use gantry_core::{FieldViolation, ValidationFailure};
use regex::Regex;
use serde_json::{Map, Value};

/// Expected primitive type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Number,
    Boolean,
}

/// One declared field with its constraints.
#[derive(Debug)]
pub struct Field {
    name: String,
    field_type: FieldType,
    required: bool,
    default: Option<Value>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Field {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            min_length: None,
            max_length: None,
            pattern: None,
            min: None,
            max: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Reject payloads where this field is missing or null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value substituted when the field is missing or null.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Minimum string length in characters.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Maximum string length in characters.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Pattern the string value must match.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Inclusive numeric lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive numeric upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Check a present value, recording at most one violation per field.
    fn check(&self, value: &Value, violations: &mut Violations) -> Option<Value> {
        match self.field_type {
            FieldType::Text => {
                let Some(s) = value.as_str() else {
                    violations.add(&self.name, "expected a string", "is_string");
                    return None;
                };
                let length = s.chars().count();
                if let Some(min) = self.min_length
                    && length < min
                {
                    violations.add(
                        &self.name,
                        format!("must be at least {min} characters"),
                        "min_length",
                    );
                    return None;
                }
                if let Some(max) = self.max_length
                    && length > max
                {
                    violations.add(
                        &self.name,
                        format!("must be at most {max} characters"),
                        "max_length",
                    );
                    return None;
                }
                if let Some(pattern) = &self.pattern
                    && !pattern.is_match(s)
                {
                    violations.add(&self.name, "does not match the expected pattern", "pattern");
                    return None;
                }
                Some(Value::String(s.to_string()))
            }
            FieldType::Integer => {
                if !(value.is_i64() || value.is_u64()) {
                    violations.add(&self.name, "expected an integer", "is_integer");
                    return None;
                }
                self.check_bounds(value, violations)
            }
            FieldType::Number => {
                if value.as_f64().is_none() {
                    violations.add(&self.name, "expected a number", "is_number");
                    return None;
                }
                self.check_bounds(value, violations)
            }
            FieldType::Boolean => {
                if !value.is_boolean() {
                    violations.add(&self.name, "expected a boolean", "is_boolean");
                    return None;
                }
                Some(value.clone())
            }
        }
    }

    fn check_bounds(&self, value: &Value, violations: &mut Violations) -> Option<Value> {
        let n = value.as_f64()?;
        if let Some(min) = self.min
            && n < min
        {
            violations.add(&self.name, format!("must be at least {min}"), "min");
            return None;
        }
        if let Some(max) = self.max
            && n > max
        {
            violations.add(&self.name, format!("must be at most {max}"), "max");
            return None;
        }
        Some(value.clone())
    }
}

/// Declared shape of an object payload.
///
/// Validation normalizes: declared fields are copied through their checks,
/// defaults fill missing optionals, and undeclared fields are stripped.
#[derive(Debug, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn object() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate a payload, returning the normalized value or the collected
    /// field-level violations.
    pub fn validate(&self, payload: &Value) -> Result<Value, ValidationFailure> {
        let object = payload.as_object().ok_or_else(|| {
            ValidationFailure::of(
                FieldViolation::new("$", "expected an object").with_constraint("is_object"),
            )
        })?;

        let mut violations = Violations::new();
        let mut normalized = Map::new();

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if let Some(default) = &field.default {
                        normalized.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        violations.add(&field.name, "is required", "required");
                    }
                }
                Some(value) => {
                    if let Some(checked) = field.check(value, &mut violations) {
                        normalized.insert(field.name.clone(), checked);
                    }
                }
            }
        }

        violations.into_result(Value::Object(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cat_schema() -> Schema {
        Schema::object()
            .field(Field::text("name").required().min_length(1).max_length(64))
            .field(Field::integer("age").min(0.0))
            .field(Field::text("color").default_value(json!("tabby")))
    }

    #[test]
    fn test_valid_payload_is_normalized() {
        let normalized = cat_schema()
            .validate(&json!({"name": "Tom", "age": 3}))
            .unwrap();
        assert_eq!(normalized, json!({"name": "Tom", "age": 3, "color": "tabby"}));
    }

    #[test]
    fn test_undeclared_fields_are_stripped() {
        let normalized = cat_schema()
            .validate(&json!({"name": "Tom", "claws": "sharp"}))
            .unwrap();
        assert!(normalized.get("claws").is_none());
    }

    #[test]
    fn test_missing_required_field() {
        let failure = cat_schema().validate(&json!({})).unwrap_err();
        assert_eq!(failure.violations.len(), 1);
        assert_eq!(failure.violations[0].field, "name");
        assert_eq!(failure.violations[0].constraint, "required");
    }

    #[test]
    fn test_violations_collected_across_fields() {
        let failure = cat_schema()
            .validate(&json!({"name": "", "age": -2}))
            .unwrap_err();
        assert_eq!(failure.violations.len(), 2);
        assert_eq!(failure.violations[0].field, "name");
        assert_eq!(failure.violations[1].field, "age");
    }

    #[test]
    fn test_type_mismatches() {
        let schema = Schema::object()
            .field(Field::integer("age"))
            .field(Field::boolean("adopted"))
            .field(Field::number("weight"));

        let failure = schema
            .validate(&json!({"age": "three", "adopted": 1, "weight": "heavy"}))
            .unwrap_err();
        assert_eq!(failure.violations.len(), 3);
    }

    #[test]
    fn test_non_object_payload() {
        let failure = cat_schema().validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(failure.violations[0].constraint, "is_object");
    }

    #[test]
    fn test_pattern_constraint() {
        let schema = Schema::object().field(
            Field::text("code")
                .required()
                .pattern(Regex::new(r"^[A-Z]{3}-\d{2}$").unwrap()),
        );

        assert!(schema.validate(&json!({"code": "CAT-42"})).is_ok());

        let failure = schema.validate(&json!({"code": "nope"})).unwrap_err();
        assert_eq!(failure.violations[0].constraint, "pattern");
    }

    #[test]
    fn test_null_counts_as_missing() {
        let normalized = cat_schema()
            .validate(&json!({"name": "Tom", "color": null}))
            .unwrap();
        assert_eq!(normalized["color"], json!("tabby"));
    }
}
