use serde_json::Value;

/// Which side of a dual value is selected during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Consumer side: used when serving synthetic responses.
    #[default]
    Stub,
    /// Producer side: used when verifying a live server.
    Test,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Stub => "stub",
            Mode::Test => "test",
        }
    }
}

/// Runtime context for Evaluate.
///
/// The document is the JSON value JSONPath extraction runs against, usually
/// `{"req": {...}}` built from an HTTP request.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    document: Value,
    mode: Mode,
}

impl EvaluationContext {
    pub fn new(document: Value, mode: Mode) -> Self {
        Self { document, mode }
    }

    pub fn stub(document: Value) -> Self {
        Self::new(document, Mode::Stub)
    }

    pub fn test(document: Value) -> Self {
        Self::new(document, Mode::Test)
    }

    /// A context with an empty document.
    pub fn empty(mode: Mode) -> Self {
        Self::new(Value::Object(serde_json::Map::new()), mode)
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::empty(Mode::Stub)
    }
}
