use super::context::{EvaluationContext, Mode};
use super::node::{Evaluable, ValueNode};

/// How a dual value picks its branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualKind {
    /// `value(...)`: branch chosen by the context mode.
    Value,
    /// `stubValue(...)`: always the stub branch.
    StubOnly,
    /// `testValue(...)`: always the test branch.
    TestOnly,
}

impl DualKind {
    pub fn name(&self) -> &'static str {
        match self {
            DualKind::Value => "value",
            DualKind::StubOnly => "stubValue",
            DualKind::TestOnly => "testValue",
        }
    }
}

/// A value with separate consumer (stub) and producer (test) branches.
#[derive(Debug, Clone, PartialEq)]
pub struct DualValue {
    kind: DualKind,
    stub: Option<Box<ValueNode>>,
    test: Option<Box<ValueNode>>,
}

impl DualValue {
    pub fn new(stub: Option<ValueNode>, test: Option<ValueNode>) -> Self {
        Self {
            kind: DualKind::Value,
            stub: stub.map(Box::new),
            test: test.map(Box::new),
        }
    }

    pub fn stub_only(stub: Option<ValueNode>, test: Option<ValueNode>) -> Self {
        Self::new(stub, test).with_kind(DualKind::StubOnly)
    }

    pub fn test_only(stub: Option<ValueNode>, test: Option<ValueNode>) -> Self {
        Self::new(stub, test).with_kind(DualKind::TestOnly)
    }

    pub fn with_kind(mut self, kind: DualKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> DualKind {
        self.kind
    }

    pub fn stub(&self) -> Option<&ValueNode> {
        self.stub.as_deref()
    }

    pub fn test(&self) -> Option<&ValueNode> {
        self.test.as_deref()
    }

    /// Branch picked under `mode`.
    pub fn selected(&self, mode: Mode) -> Option<&ValueNode> {
        match (self.kind, mode) {
            (DualKind::StubOnly, _) | (DualKind::Value, Mode::Stub) => self.stub(),
            (DualKind::TestOnly, _) | (DualKind::Value, Mode::Test) => self.test(),
        }
    }

    /// Branch used when the value is compared or mocked without evaluation.
    pub fn default_branch(&self) -> Option<&ValueNode> {
        self.selected(Mode::default())
    }

    pub fn branches(&self) -> impl Iterator<Item = &ValueNode> {
        self.stub().into_iter().chain(self.test())
    }
}

impl Evaluable for DualValue {
    fn evaluate(&self, ctx: &EvaluationContext) -> ValueNode {
        self.selected(ctx.mode())
            .map(|branch| branch.evaluate(ctx))
            .unwrap_or(ValueNode::Constant(serde_json::Value::Null))
    }
}
