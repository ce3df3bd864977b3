use super::super::error::NodeError;
use super::super::node::{Comparable, Mockable};
use super::MAX_ATTEMPTS;
use rand::Rng;
use serde_json::{Map, Number, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Float,
}

impl NumberKind {
    pub fn name(&self) -> &'static str {
        match self {
            NumberKind::Integer => "integer",
            NumberKind::Float => "float",
        }
    }
}

/// Declared numeric bounds. The original `Number` is kept for printing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub gt: Option<Number>,
    pub gte: Option<Number>,
    pub lt: Option<Number>,
    pub lte: Option<Number>,
}

impl Bounds {
    fn get(n: &Option<Number>) -> Option<f64> {
        n.as_ref().and_then(Number::as_f64)
    }

    pub fn gt(&self) -> Option<f64> {
        Self::get(&self.gt)
    }

    pub fn gte(&self) -> Option<f64> {
        Self::get(&self.gte)
    }

    pub fn lt(&self) -> Option<f64> {
        Self::get(&self.lt)
    }

    pub fn lte(&self) -> Option<f64> {
        Self::get(&self.lte)
    }

    pub fn contains(&self, v: f64) -> bool {
        self.gt().map_or(true, |b| v > b)
            && self.gte().map_or(true, |b| v >= b)
            && self.lt().map_or(true, |b| v < b)
            && self.lte().map_or(true, |b| v <= b)
    }

    fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (key, bound) in [
            ("gt", &self.gt),
            ("gte", &self.gte),
            ("lt", &self.lt),
            ("lte", &self.lte),
        ] {
            if let Some(n) = bound {
                out.insert(key.to_string(), Value::Number(n.clone()));
            }
        }
        Value::Object(out)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Fill in a missing side of the range from the declared one.
fn default_range(min: Option<f64>, max: Option<f64>) -> (f64, f64) {
    match (min, max) {
        (Some(min), Some(max)) => (min, max),
        (None, Some(max)) => (if max > 0.0 { 0.0 } else { max - 100.0 }, max),
        (Some(min), None) => (min, if min < 0.0 { 0.0 } else { min + 100.0 }),
        (None, None) => (0.0, 100.0),
    }
}

fn tightest(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

/// `integer({...})` / `float({...})`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberMatcher {
    kind: NumberKind,
    bounds: Bounds,
}

impl NumberMatcher {
    pub fn new(kind: NumberKind, bounds: Bounds) -> Self {
        Self { kind, bounds }
    }

    pub fn integer(bounds: Bounds) -> Self {
        Self::new(NumberKind::Integer, bounds)
    }

    pub fn float(bounds: Bounds) -> Self {
        Self::new(NumberKind::Float, bounds)
    }

    /// Integer matcher over the inclusive range `[lo, hi]`.
    pub fn integer_between(lo: i64, hi: i64) -> Self {
        Self::integer(Bounds {
            gte: Some(lo.into()),
            lte: Some(hi.into()),
            ..Default::default()
        })
    }

    pub fn kind(&self) -> NumberKind {
        self.kind
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn unsatisfiable(&self, lo: f64, hi: f64) -> NodeError {
        NodeError::Unsatisfiable {
            kind: self.kind.name(),
            reason: format!("empty range [{lo}, {hi}] for bounds {}", self.bounds),
        }
    }

    fn mock_integer<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        let b = &self.bounds;
        let lo = tightest(b.gt().map(|v| v.floor() + 1.0), b.gte().map(f64::ceil), f64::max);
        let hi = tightest(b.lt().map(|v| v.ceil() - 1.0), b.lte().map(f64::floor), f64::min);
        let (lo, hi) = default_range(lo, hi);
        let (lo, hi) = (lo.ceil(), hi.floor());
        if lo > hi || lo < i64::MIN as f64 || hi > i64::MAX as f64 {
            return Err(self.unsatisfiable(lo, hi));
        }
        Ok(Value::from(rng.gen_range(lo as i64..=hi as i64)))
    }

    fn mock_float<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        let b = &self.bounds;
        let lo = tightest(b.gt(), b.gte(), f64::max);
        let hi = tightest(b.lt(), b.lte(), f64::min);
        let (lo, hi) = default_range(lo, hi);
        if lo > hi {
            return Err(self.unsatisfiable(lo, hi));
        }

        let mut candidate = None;
        if lo == hi {
            candidate = Some(lo).filter(|v| b.contains(*v));
        } else {
            // `hi - lo` overflows for ranges wider than f64::MAX.
            let wide = !(hi - lo).is_finite();
            for _ in 0..MAX_ATTEMPTS {
                let v = if wide {
                    let t: f64 = rng.gen();
                    lo * (1.0 - t) + hi * t
                } else {
                    rng.gen_range(lo..hi)
                };
                if b.contains(v) {
                    candidate = Some(v);
                    break;
                }
            }
            if candidate.is_none() {
                let mid = lo / 2.0 + hi / 2.0;
                candidate = Some(mid).filter(|v| b.contains(*v));
            }
        }

        candidate
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.unsatisfiable(lo, hi))
    }
}

impl Comparable for NumberMatcher {
    fn compare(&self, target: &Value) -> bool {
        let Some(v) = target.as_f64() else {
            return false;
        };
        if self.kind == NumberKind::Integer && v.fract() != 0.0 {
            return false;
        }
        self.bounds.contains(v)
    }
}

impl Mockable for NumberMatcher {
    fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        match self.kind {
            NumberKind::Integer => self.mock_integer(rng),
            NumberKind::Float => self.mock_float(rng),
        }
    }
}
