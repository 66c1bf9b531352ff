//! Query-string parsing and clause evaluation
//!
//! The parser consumes exactly the grammar the filter compiler emits
//! (see [`crate::query`]). A query is a whitespace-separated list of
//! clauses, each `+field:predicate` (must) or `-field:predicate`
//! (must-not). Phrase and date literals are quoted and may contain
//! spaces, so parsing is character-wise rather than a split on
//! whitespace.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use docstore_core::error::{Error, Result};
use docstore_core::filter::render_number;
use serde_json::Value;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::tokenizer::{phrase_occurrences, tokenize};

/// Flattened document fields: field path -> scalar values
///
/// Array fields contribute one entry per element under the same path.
pub type FieldMap = BTreeMap<String, Vec<Value>>;

/// Whether a clause must or must not match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// `+` — the document must match this clause
    Must,
    /// `-` — the document must not match this clause
    MustNot,
}

/// Comparison operator of a range clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `>` strict lower bound
    Gt,
    /// `>=` inclusive lower bound
    Gte,
    /// `<` strict upper bound
    Lt,
    /// `<=` inclusive upper bound
    Lte,
}

/// What a clause tests against a field value
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Bare term: token match or exact scalar equality
    Term(String),
    /// Quoted phrase: consecutive token run or exact scalar equality
    Phrase(String),
    /// `/re/` — regex over the raw field text
    Regex(regex::Regex),
    /// Range comparison
    Cmp {
        /// Operator
        op: CmpOp,
        /// Right-hand literal
        literal: String,
        /// Literal was quoted: compare as dates
        dated: bool,
    },
}

/// One parsed query clause
#[derive(Debug, Clone)]
pub struct Clause {
    /// Must or must-not
    pub occur: Occur,
    /// Field path (`bucket`, `data.name`, ...)
    pub field: String,
    /// The test
    pub predicate: Predicate,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a compiled query string into clauses
///
/// Returns `InvalidArgument` for malformed input: a clause without a
/// field separator, an unterminated quote or regex, or a regex that
/// fails to compile.
pub fn parse_query(query: &str) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    let mut chars = query.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            return Ok(clauses);
        }
        let occur = match chars.peek() {
            Some('+') => {
                chars.next();
                Occur::Must
            }
            Some('-') => {
                chars.next();
                Occur::MustNot
            }
            _ => Occur::Must,
        };
        let field = take_field(&mut chars)?;
        let predicate = parse_predicate(&mut chars)?;
        clauses.push(Clause {
            occur,
            field,
            predicate,
        });
    }
}

fn take_field(chars: &mut Peekable<Chars>) -> Result<String> {
    let mut field = String::new();
    for c in chars.by_ref() {
        if c == ':' {
            if field.is_empty() {
                return Err(Error::InvalidArgument("clause has empty field".to_string()));
            }
            return Ok(field);
        }
        if c.is_whitespace() {
            break;
        }
        field.push(c);
    }
    Err(Error::InvalidArgument(format!(
        "clause {field:?} has no field separator"
    )))
}

fn parse_predicate(chars: &mut Peekable<Chars>) -> Result<Predicate> {
    match chars.peek() {
        Some('"') => {
            chars.next();
            Ok(Predicate::Phrase(take_until(chars, '"')?))
        }
        Some('/') => {
            chars.next();
            let pattern = take_until(chars, '/')?;
            let re = regex::Regex::new(&pattern)
                .map_err(|e| Error::InvalidArgument(format!("bad regex clause: {e}")))?;
            Ok(Predicate::Regex(re))
        }
        Some('<') | Some('>') => {
            let strict_op = if chars.next() == Some('<') {
                CmpOp::Lt
            } else {
                CmpOp::Gt
            };
            let op = if chars.peek() == Some(&'=') {
                chars.next();
                match strict_op {
                    CmpOp::Lt => CmpOp::Lte,
                    _ => CmpOp::Gte,
                }
            } else {
                strict_op
            };
            if chars.peek() == Some(&'"') {
                chars.next();
                let literal = take_until(chars, '"')?;
                Ok(Predicate::Cmp {
                    op,
                    literal,
                    dated: true,
                })
            } else {
                Ok(Predicate::Cmp {
                    op,
                    literal: take_bare(chars),
                    dated: false,
                })
            }
        }
        _ => Ok(Predicate::Term(take_bare(chars))),
    }
}

fn take_until(chars: &mut Peekable<Chars>, end: char) -> Result<String> {
    let mut out = String::new();
    for c in chars.by_ref() {
        if c == end {
            return Ok(out);
        }
        out.push(c);
    }
    Err(Error::InvalidArgument(format!(
        "unterminated {end:?} literal"
    )))
}

fn take_bare(chars: &mut Peekable<Chars>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.peek() {
        if c.is_whitespace() {
            break;
        }
        out.push(*c);
        chars.next();
    }
    out
}

// ============================================================================
// Evaluation
// ============================================================================

/// Render a scalar the way compiled literals render it
///
/// Numbers go through the same integer-truncating formatting the
/// compiler uses, which keeps equality on numeric fields consistent
/// with the compiled closed-range literals.
pub fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => render_number(n),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn cmp_holds<T: PartialOrd>(op: CmpOp, left: T, right: T) -> bool {
    match op {
        CmpOp::Gt => left > right,
        CmpOp::Gte => left >= right,
        CmpOp::Lt => left < right,
        CmpOp::Lte => left <= right,
    }
}

impl Predicate {
    fn matches_value(&self, v: &Value) -> bool {
        match self {
            Predicate::Term(lit) | Predicate::Phrase(lit) => text_match(lit, v),
            Predicate::Regex(re) => re.is_match(&scalar_text(v)),
            Predicate::Cmp { op, literal, dated } => {
                if *dated {
                    match (parse_date(literal), parse_date(scalar_text(v).as_str())) {
                        (Some(bound), Some(val)) => cmp_holds(*op, val, bound),
                        _ => false,
                    }
                } else if let (Some(val), Ok(bound)) = (numeric(v), literal.parse::<f64>()) {
                    cmp_holds(*op, val, bound)
                } else {
                    cmp_holds(*op, scalar_text(v).as_str(), literal.as_str())
                }
            }
        }
    }

    fn strength(&self, v: &Value) -> f32 {
        match self {
            Predicate::Term(lit) | Predicate::Phrase(lit) => {
                let phrase = tokenize(lit);
                let occurrences = phrase_occurrences(&tokenize(&scalar_text(v)), &phrase);
                (occurrences as f32).max(1.0)
            }
            _ => 1.0,
        }
    }
}

fn text_match(lit: &str, v: &Value) -> bool {
    let text = scalar_text(v);
    let phrase = tokenize(lit);
    if phrase.is_empty() {
        return text == lit;
    }
    text == lit || phrase_occurrences(&tokenize(&text), &phrase) > 0
}

impl Clause {
    /// True when any value under this clause's field matches
    pub fn matches(&self, fields: &FieldMap) -> bool {
        fields
            .get(&self.field)
            .map(|values| values.iter().any(|v| self.predicate.matches_value(v)))
            .unwrap_or(false)
    }

    fn strength(&self, fields: &FieldMap) -> f32 {
        fields
            .get(&self.field)
            .map(|values| {
                values
                    .iter()
                    .filter(|v| self.predicate.matches_value(v))
                    .map(|v| self.predicate.strength(v))
                    .sum()
            })
            .unwrap_or(0.0)
    }
}

/// Evaluate all clauses against a document's fields
///
/// Returns the relevance score when the document matches (every must
/// clause matched, no must-not clause matched), `None` otherwise.
/// Term and phrase clauses contribute their occurrence counts; range,
/// regex and scope clauses contribute a constant, so equal-structure
/// matches score equally and the id tie-break decides their order.
pub fn evaluate(clauses: &[Clause], fields: &FieldMap) -> Option<f32> {
    let mut score = 0.0;
    for clause in clauses {
        let matched = clause.matches(fields);
        match clause.occur {
            Occur::Must => {
                if !matched {
                    return None;
                }
                score += clause.strength(fields).max(1.0);
            }
            Occur::MustNot => {
                if matched {
                    return None;
                }
            }
        }
    }
    Some(score)
}
