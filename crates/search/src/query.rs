//! Filter compiler
//!
//! [`compile_query`] maps a declarative filter into one query string for
//! the index engine. The function is total: unparseable values degrade
//! to a stringified equality clause and are logged, never returned as
//! errors. It is deterministic: fields are visited in sorted order, so
//! the same `(table, filter)` always compiles to byte-identical output.
//!
//! Clause grammar (space-separated; `+` must, `-` must-not):
//!
//! ```text
//! +bucket:<table>                      scope clause, always first
//! +data.f:>=N +data.f:<=N              numeric equality as closed range
//! +data.f:"lit"                        equality (quotes stripped, capped)
//! -data.f:"lit"                        negated equality
//! +data.f:/re/                         regex / prefix match (capped)
//! +data.f:<=lit   +data.f:>=lit        bare range bounds
//! +data.f:<"lit"  +data.f:>"lit"       date-hinted bounds (strict)
//! +data.f:<lit    +data.f:>lit         numeric/unknown-hint bounds (strict)
//! ```
//!
//! Quotes inside literals are stripped rather than escaped. This is a
//! documented lossy simplification: a literal cannot smuggle clause
//! structure into the query, but quoted text loses its quotes.

use docstore_core::filter::{Filter, FilterTerm, RangeBound, RangeHint};
use tracing::warn;

/// Longest literal interpolated into an equality or regex clause
pub const MAX_LITERAL_LEN: usize = 100;

/// Compile `filter` into a query string scoped to `table`
///
/// An empty filter compiles to just the scope clause, matching every
/// document in the table.
pub fn compile_query(table: &str, filter: &Filter) -> String {
    let mut query = format!("+bucket:{table}");
    for (field, value) in filter {
        let (terms, degraded) = FilterTerm::parse(value);
        if degraded {
            warn!(table, field, %value, "filter value was not parsed, defaulting to raw text");
        }
        for term in &terms {
            query.push(' ');
            render_term(&mut query, field, term);
        }
    }
    query
}

fn render_term(out: &mut String, field: &str, term: &FilterTerm) {
    match term {
        FilterTerm::NumberEquals(lit) => {
            out.push_str(&format!("+data.{field}:>={lit} +data.{field}:<={lit}"));
        }
        FilterTerm::Equals(lit) => {
            out.push_str(&format!("+data.{field}:\"{}\"", clean(lit)));
        }
        FilterTerm::NotEquals(lit) => {
            out.push_str(&format!("-data.{field}:\"{}\"", clean(lit)));
        }
        FilterTerm::Regex(lit) => {
            out.push_str(&format!("+data.{field}:/{}/", cap(lit)));
        }
        FilterTerm::Range {
            bound,
            hint,
            literal,
        } => {
            let marker = match bound {
                RangeBound::Lower => '>',
                RangeBound::Upper => '<',
            };
            match hint {
                RangeHint::Bare => {
                    out.push_str(&format!("+data.{field}:{marker}={literal}"));
                }
                RangeHint::Date => {
                    out.push_str(&format!("+data.{field}:{marker}\"{}\"", clean(literal)));
                }
                RangeHint::Numeric => {
                    out.push_str(&format!("+data.{field}:{marker}{literal}"));
                }
                RangeHint::Unknown => {
                    out.push_str(&format!("+data.{field}:{marker}{literal}"));
                }
            }
        }
    }
}

fn cap(lit: &str) -> &str {
    match lit.char_indices().nth(MAX_LITERAL_LEN) {
        Some((idx, _)) => &lit[..idx],
        None => lit,
    }
}

fn clean(lit: &str) -> String {
    cap(lit).replace('"', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(pairs: &[(&str, serde_json::Value)]) -> Filter {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_filter_is_scope_clause_only() {
        assert_eq!(compile_query("data", &Filter::new()), "+bucket:data");
    }

    #[test]
    fn test_compile_is_deterministic() {
        let f = filter(&[("b", json!("x")), ("a", json!(1)), ("c", json!(">5"))]);
        let first = compile_query("data", &f);
        let second = compile_query("data", &f);
        assert_eq!(first, second);
        // Sorted field order, not insertion order
        assert_eq!(
            first,
            "+bucket:data +data.a:>=1 +data.a:<=1 +data.b:\"x\" +data.c:>=5"
        );
    }

    #[test]
    fn test_numeric_equality_is_closed_range() {
        let f = filter(&[("count", json!(11))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.count:>=11 +data.count:<=11"
        );
    }

    #[test]
    fn test_float_truncates() {
        let f = filter(&[("count", json!(10.0))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.count:>=10 +data.count:<=10"
        );
    }

    #[test]
    fn test_string_equality_quoted() {
        let f = filter(&[("name", json!("tony emoekpere"))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.name:\"tony emoekpere\""
        );
    }

    #[test]
    fn test_negation() {
        let f = filter(&[("status", json!("!archived"))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data -data.status:\"archived\""
        );
    }

    #[test]
    fn test_regex_clause() {
        let f = filter(&[("name", json!("^tony"))]);
        assert_eq!(compile_query("data", &f), "+bucket:data +data.name:/tony/");
    }

    #[test]
    fn test_bare_bounds_are_inclusive() {
        let f = filter(&[("count", json!("<10")), ("score", json!(">2"))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.count:<=10 +data.score:>=2"
        );
    }

    #[test]
    fn test_date_hint_is_strict_and_quoted() {
        let f = filter(&[("created", json!("<:d2024-01-01T00:00:00Z"))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.created:<\"2024-01-01T00:00:00Z\""
        );
    }

    #[test]
    fn test_numeric_hint_is_strict() {
        let f = filter(&[("count", json!(">:n42"))]);
        assert_eq!(compile_query("data", &f), "+bucket:data +data.count:>42");
    }

    #[test]
    fn test_unknown_hint_renders_strict_bare_bound() {
        let f = filter(&[("count", json!(">:x5"))]);
        assert_eq!(compile_query("data", &f), "+bucket:data +data.count:>5");
    }

    #[test]
    fn test_bool_equality() {
        let f = filter(&[("active", json!(true))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.active:\"true\""
        );
    }

    #[test]
    fn test_array_is_implicit_and() {
        let f = filter(&[("tags", json!(["^a-", "!b"]))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.tags:/a-/ -data.tags:\"b\""
        );
    }

    #[test]
    fn test_quotes_stripped_not_escaped() {
        let f = filter(&[("name", json!("say \"hi\""))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.name:\"say hi\""
        );
    }

    #[test]
    fn test_literal_capped_at_100_chars() {
        let long = "x".repeat(150);
        let f = filter(&[("name", json!(long))]);
        let q = compile_query("data", &f);
        assert_eq!(q, format!("+bucket:data +data.name:\"{}\"", "x".repeat(100)));
    }

    #[test]
    fn test_unsupported_value_degrades_to_equality() {
        let f = filter(&[("meta", json!({"a": 1}))]);
        let q = compile_query("data", &f);
        assert!(q.starts_with("+bucket:data +data.meta:\""));
    }

    #[test]
    fn test_nested_field_path() {
        let f = filter(&[("address.city", json!("lagos"))]);
        assert_eq!(
            compile_query("data", &f),
            "+bucket:data +data.address.city:\"lagos\""
        );
    }
}
