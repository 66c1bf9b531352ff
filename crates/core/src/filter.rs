//! Filter model and the marker mini-language parser
//!
//! A filter is an ordered map of `field -> value`. String values carry
//! an optional leading marker selecting the comparison:
//!
//! | marker | meaning                                   |
//! |--------|-------------------------------------------|
//! | `^`    | regex / prefix match on the remainder     |
//! | `<`    | upper bound (≤, or typed via `:d` / `:n`) |
//! | `>`    | lower bound (≥, or typed via `:d` / `:n`) |
//! | `!`    | negated equality                          |
//! | none   | positive equality                         |
//!
//! Numbers compile to a closed range on the same literal (exact match
//! without a dedicated equality operator), booleans to positive
//! equality, arrays to an implicit AND of their elements compiled
//! independently, and anything else degrades to a stringified equality
//! clause.
//!
//! Parsing is a dedicated step producing tagged terms; the compiler in
//! the search crate only renders them. Raw strings are never
//! re-inspected downstream.

use serde_json::Value;
use std::collections::BTreeMap;

/// A declarative filter: field path -> operator-tagged value
///
/// A `BTreeMap` keeps field iteration in sorted order, which makes
/// compilation deterministic.
pub type Filter = BTreeMap<String, Value>;

/// Which side of a range a marker selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// `>` — lower bound
    Lower,
    /// `<` — upper bound
    Upper,
}

/// Type hint following a range marker (`<:d...`, `>:n...`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeHint {
    /// No hint: plain inclusive bound on the literal
    Bare,
    /// `:d` — compare as a date, strict bound
    Date,
    /// `:n` — compare numerically, strict bound
    Numeric,
    /// Unrecognized hint character; rendered as a bare strict bound
    Unknown,
}

/// One parsed filter term
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    /// Positive equality on a literal
    Equals(String),
    /// Negated equality (exclude clause)
    NotEquals(String),
    /// Regex / prefix match
    Regex(String),
    /// Range bound with an optional type hint
    Range {
        /// Which side of the range
        bound: RangeBound,
        /// How to compare the literal
        hint: RangeHint,
        /// The comparison literal
        literal: String,
    },
    /// Exact numeric match, expressed as a closed range on one literal
    NumberEquals(String),
}

/// Render a JSON number the way the compiler interpolates it
///
/// Integers render as-is; floats are truncated toward zero. Whole-number
/// JSON floats like `10.0` therefore render as `10`, which keeps them
/// comparable with integer-valued fields.
pub fn render_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        (n.as_f64().unwrap_or(0.0) as i64).to_string()
    }
}

fn strip_quotes(s: &str) -> String {
    s.replace('"', "")
}

fn parse_marker(s: &str) -> FilterTerm {
    let mut chars = s.chars();
    match chars.next() {
        Some('^') => FilterTerm::Regex(chars.as_str().to_string()),
        Some(marker @ ('<' | '>')) => {
            let bound = if marker == '<' {
                RangeBound::Upper
            } else {
                RangeBound::Lower
            };
            let rest = chars.as_str();
            if let Some(hinted) = rest.strip_prefix(':') {
                let mut hint_chars = hinted.chars();
                let hint = match hint_chars.next() {
                    Some('d') | Some('D') => RangeHint::Date,
                    Some('n') | Some('N') => RangeHint::Numeric,
                    _ => RangeHint::Unknown,
                };
                FilterTerm::Range {
                    bound,
                    hint,
                    literal: strip_quotes(hint_chars.as_str().trim()),
                }
            } else {
                FilterTerm::Range {
                    bound,
                    hint: RangeHint::Bare,
                    literal: rest.to_string(),
                }
            }
        }
        Some('!') => FilterTerm::NotEquals(chars.as_str().to_string()),
        _ => FilterTerm::Equals(s.to_string()),
    }
}

impl FilterTerm {
    /// Parse a filter value into its terms
    ///
    /// Returns the terms plus a degraded flag. The flag is set when the
    /// value had no defined encoding (null, object, nested array) and
    /// fell back to a stringified equality clause; the caller logs it.
    /// Parsing is total: every value yields at least one term.
    pub fn parse(value: &Value) -> (Vec<FilterTerm>, bool) {
        match value {
            Value::Number(n) => (vec![FilterTerm::NumberEquals(render_number(n))], false),
            Value::Bool(b) => (vec![FilterTerm::Equals(b.to_string())], false),
            Value::String(s) => (vec![parse_marker(s)], false),
            Value::Array(items) => {
                let mut terms = Vec::with_capacity(items.len());
                let mut degraded = false;
                for item in items {
                    let (mut t, d) = FilterTerm::parse(item);
                    terms.append(&mut t);
                    degraded |= d;
                }
                if terms.is_empty() {
                    // An empty array still compiles: match-everything AND
                    (terms, false)
                } else {
                    (terms, degraded)
                }
            }
            other => (vec![FilterTerm::Equals(stringify(other))], true),
        }
    }
}

fn stringify(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
