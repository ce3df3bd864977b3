use super::super::error::NodeError;
use super::super::node::{Comparable, Mockable};
use super::stringify;
use super::MAX_ATTEMPTS;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rand::Rng;
use serde_json::{Map, Value};
use std::fmt::Write;

/// Generation window for `date(...)` mocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateKind {
    #[default]
    Recent,
    Past,
    Future,
    Between,
}

impl DateKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recent" => Some(DateKind::Recent),
            "past" => Some(DateKind::Past),
            "future" => Some(DateKind::Future),
            "between" => Some(DateKind::Between),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DateKind::Recent => "recent",
            DateKind::Past => "past",
            DateKind::Future => "future",
            DateKind::Between => "between",
        }
    }
}

/// `date({format, type, from, to})`.
///
/// `format` accepts moment-style tokens (`YYYY-MM-DD HH:mm:ss`) or a strftime
/// string containing `%`. Without a format, values are ISO-8601.
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatcher {
    format: Option<String>,
    strftime: Option<String>,
    kind: Option<DateKind>,
    from: Option<String>,
    to: Option<String>,
    from_bound: Option<NaiveDateTime>,
    to_bound: Option<NaiveDateTime>,
}

impl DateMatcher {
    pub fn new(
        format: Option<String>,
        kind: Option<DateKind>,
        from: Option<String>,
        to: Option<String>,
    ) -> Result<Self, String> {
        let strftime = format.as_deref().map(to_strftime);
        if let Some(fmt) = &strftime {
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(format!("invalid date format {:?}", format.unwrap_or_default()));
            }
        }
        let bound = |raw: &Option<String>, name: &str| -> Result<Option<NaiveDateTime>, String> {
            match raw {
                None => Ok(None),
                Some(s) => parse_iso8601(s)
                    .or_else(|| strftime.as_deref().and_then(|f| parse_with(s, f)))
                    .map(Some)
                    .ok_or_else(|| format!("unparsable `{name}` date {s:?}")),
            }
        };
        let from_bound = bound(&from, "from")?;
        let to_bound = bound(&to, "to")?;
        if kind == Some(DateKind::Between) && (from_bound.is_none() || to_bound.is_none()) {
            return Err("date type \"between\" requires both `from` and `to`".to_string());
        }
        if let (Some(lo), Some(hi)) = (from_bound, to_bound) {
            if lo > hi {
                return Err(format!("date `from` {lo} is after `to` {hi}"));
            }
        }
        Ok(Self {
            format,
            strftime,
            kind,
            from,
            to,
            from_bound,
            to_bound,
        })
    }

    /// Options object as written in the script, for printing.
    pub fn options_json(&self) -> Value {
        let mut out = Map::new();
        if let Some(format) = &self.format {
            out.insert("format".into(), Value::String(format.clone()));
        }
        if let Some(kind) = self.kind {
            out.insert("type".into(), Value::String(kind.name().into()));
        }
        if let Some(from) = &self.from {
            out.insert("from".into(), Value::String(from.clone()));
        }
        if let Some(to) = &self.to {
            out.insert("to".into(), Value::String(to.clone()));
        }
        Value::Object(out)
    }

    fn parse(&self, s: &str) -> Option<NaiveDateTime> {
        match &self.strftime {
            Some(fmt) => parse_with(s, fmt),
            None => parse_iso8601(s),
        }
    }

    fn in_bounds(&self, t: NaiveDateTime) -> bool {
        self.from_bound.map_or(true, |lo| t >= lo) && self.to_bound.map_or(true, |hi| t <= hi)
    }

    fn format(&self, t: NaiveDateTime) -> Result<String, NodeError> {
        let utc = Utc.from_utc_datetime(&t);
        match &self.strftime {
            None => Ok(utc.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Some(fmt) => {
                let mut out = String::new();
                write!(out, "{}", utc.format_with_items(StrftimeItems::new(fmt))).map_err(|_| {
                    NodeError::Generation {
                        kind: "date",
                        reason: format!("cannot render with format {fmt:?}"),
                    }
                })?;
                Ok(out)
            }
        }
    }

    fn window(&self) -> (NaiveDateTime, NaiveDateTime) {
        let now = Utc::now().naive_utc();
        // Bounds without a type generate between them.
        let kind = match self.kind {
            Some(kind) => kind,
            None if self.from_bound.is_some() || self.to_bound.is_some() => DateKind::Between,
            None => DateKind::Recent,
        };
        let (lo, hi) = match kind {
            DateKind::Recent => (now - Duration::days(1), now),
            DateKind::Past => (now - Duration::days(365), now - Duration::seconds(1)),
            DateKind::Future => (now + Duration::seconds(1), now + Duration::days(365)),
            DateKind::Between => match (self.from_bound, self.to_bound) {
                (Some(lo), Some(hi)) => (lo, hi),
                (Some(lo), None) => (lo, lo + Duration::days(365)),
                (None, Some(hi)) => (hi - Duration::days(365), hi),
                (None, None) => (now, now),
            },
        };
        let lo = self.from_bound.map_or(lo, |b| lo.max(b));
        let hi = self.to_bound.map_or(hi, |b| hi.min(b));
        (lo, hi)
    }
}

impl Comparable for DateMatcher {
    fn compare(&self, target: &Value) -> bool {
        stringify(target)
            .and_then(|s| self.parse(&s))
            .is_some_and(|t| self.in_bounds(t))
    }
}

impl Mockable for DateMatcher {
    fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        let (lo, hi) = self.window();
        if lo > hi {
            return Err(NodeError::Unsatisfiable {
                kind: "date",
                reason: format!("window {lo} .. {hi} is empty"),
            });
        }
        let span = (hi - lo).num_milliseconds();
        for _ in 0..MAX_ATTEMPTS {
            let t = lo + Duration::milliseconds(rng.gen_range(0..=span));
            let rendered = self.format(t)?;
            // Coarse formats can round a sample outside the bounds.
            if self.parse(&rendered).is_some_and(|p| self.in_bounds(p)) {
                return Ok(Value::String(rendered));
            }
        }
        Err(NodeError::Unsatisfiable {
            kind: "date",
            reason: "no rendered date falls within from/to".to_string(),
        })
    }
}

fn parse_with(s: &str, fmt: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_str(s, fmt)
        .map(|t| t.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_iso8601(s: &str) -> Option<NaiveDateTime> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Moment-style tokens, longest first.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("SSS", "%3f"),
    ("A", "%p"),
    ("a", "%P"),
    ("ZZ", "%z"),
    ("Z", "%:z"),
    ("X", "%s"),
];

/// Translate a moment-style format to strftime. Strings already containing
/// `%` are taken as strftime.
pub(crate) fn to_strftime(format: &str) -> String {
    if format.contains('%') {
        return format.to_string();
    }
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;
    'outer: while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}
