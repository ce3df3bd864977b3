use super::super::error::NodeError;
use super::json_equals;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use std::fmt;

/// Choice list shared by `anyOf(...)` and `notAnyOf(...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceMatcher {
    choices: Vec<Value>,
}

impl ChoiceMatcher {
    pub fn new(choices: Vec<Value>) -> Result<Self, String> {
        if choices.is_empty() {
            return Err("at least one choice is required".to_string());
        }
        Ok(Self { choices })
    }

    pub fn choices(&self) -> &[Value] {
        &self.choices
    }

    /// True if `target` equals one of the choices.
    pub fn contains(&self, target: &Value) -> bool {
        self.choices.iter().any(|choice| json_equals(choice, target))
    }

    /// Uniformly pick one choice. Only meaningful for `anyOf`.
    pub(crate) fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        self.choices
            .choose(rng)
            .cloned()
            .ok_or_else(|| NodeError::Unsatisfiable {
                kind: "anyOf",
                reason: "empty choice list".to_string(),
            })
    }
}

impl fmt::Display for ChoiceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, choice) in self.choices.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{choice}")?;
        }
        Ok(())
    }
}
