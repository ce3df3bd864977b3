use super::super::error::NodeError;
use super::super::node::{Comparable, Mockable};
use super::stringify;
use rand::Rng;
use regex::Regex;
use serde_json::Value;

/// Repetition cap for unbounded quantifiers (`*`, `+`, `{n,}`) when generating.
const MAX_REPEAT: u32 = 8;

/// `regex(pattern)`: the stringified target must match the whole pattern.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: String,
    anchored: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let anchored = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { pattern, anchored })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Pattern without leading `^` / trailing `$`, which the generator
    /// would otherwise treat as literal assertions.
    fn generator_source(&self) -> &str {
        let mut source = self.pattern.as_str();
        if let Some(rest) = source.strip_prefix('^') {
            source = rest;
        }
        if source.ends_with('$') && !source.ends_with("\\$") {
            source = &source[..source.len() - 1];
        }
        source
    }
}

impl PartialEq for RegexMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Comparable for RegexMatcher {
    fn compare(&self, target: &Value) -> bool {
        stringify(target).is_some_and(|s| self.anchored.is_match(&s))
    }
}

impl Mockable for RegexMatcher {
    fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        let generator = rand_regex::Regex::compile(self.generator_source(), MAX_REPEAT)
            .map_err(|e| NodeError::Generation {
                kind: "regex",
                reason: e.to_string(),
            })?;
        let generated: String = rng.sample(&generator);
        Ok(Value::String(generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_length_match() {
        let m = RegexMatcher::new("/hello/[a-z]*").unwrap();
        assert!(m.compare(&json!("/hello/apple")));
        assert!(!m.compare(&json!("/hello/APPLE")));
        assert!(!m.compare(&json!("x/hello/apple")));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_group() {
        let m = RegexMatcher::new("GET|POST").unwrap();
        assert!(m.compare(&json!("POST")));
        assert!(!m.compare(&json!("GETX")));
    }

    #[test]
    fn test_non_string_targets_are_stringified() {
        let m = RegexMatcher::new(r"\d{3}").unwrap();
        assert!(m.compare(&json!(123)));
        assert!(!m.compare(&json!(null)));
    }

    #[test]
    fn test_mock_output_matches() {
        let m = RegexMatcher::new(r"^[A-Z]{2}-\d{4}$").unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let v = m.mock_with(&mut rng).unwrap();
            assert!(m.compare(&v), "{v}");
        }
    }

    #[test]
    fn test_generator_source_strips_anchors_only() {
        assert_eq!(RegexMatcher::new("^ab$").unwrap().generator_source(), "ab");
        assert_eq!(RegexMatcher::new(r"ab\$").unwrap().generator_source(), r"ab\$");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RegexMatcher::new("(").is_err());
    }
}
