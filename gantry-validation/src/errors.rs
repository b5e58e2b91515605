// Violation accumulation for schema checks

use gantry_core::{FieldViolation, ValidationFailure};
use serde_json::Value;

/// Collects field-level violations across one schema pass.
#[derive(Debug, Default)]
pub struct Violations {
    items: Vec<FieldViolation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>, constraint: &str) {
        self.items
            .push(FieldViolation::new(field, message).with_constraint(constraint));
    }

    /// Record an already-built violation
    pub fn push(&mut self, violation: FieldViolation) {
        self.items.push(violation);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve the pass: the normalized value when clean, otherwise the
    /// collected failure.
    pub fn into_result(self, value: Value) -> Result<Value, ValidationFailure> {
        if self.items.is_empty() {
            Ok(value)
        } else {
            Err(ValidationFailure {
                message: "Validation failed".to_string(),
                violations: self.items,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_pass_returns_value() {
        let violations = Violations::new();
        assert_eq!(violations.into_result(json!(1)).unwrap(), json!(1));
    }

    #[test]
    fn test_dirty_pass_returns_failure() {
        let mut violations = Violations::new();
        violations.add("name", "is required", "required");
        violations.add("age", "expected an integer", "is_integer");

        let failure = violations.into_result(json!({})).unwrap_err();
        assert_eq!(failure.violations.len(), 2);
        assert_eq!(failure.violations[0].field, "name");
        assert_eq!(failure.violations[1].constraint, "is_integer");
    }
}
