//! Facet aggregation over query matches
//!
//! Facets are computed over every match, before the limit/offset window
//! is applied. Term facets report the top-N most frequent field values;
//! range facets count numeric values falling into named half-open
//! buckets (`min <= v < max`).

use docstore_core::search_types::{
    FacetResult, Facets, NumericRange, RangeCount, RangeFacet, TermCount, TermFacet,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::expr::{scalar_text, FieldMap};

/// Accumulates facet counts while the index walks its matches
pub struct FacetAccumulator<'a> {
    term: Vec<TermAcc<'a>>,
    range: Vec<RangeAcc<'a>>,
}

struct TermAcc<'a> {
    request: &'a TermFacet,
    counts: HashMap<String, u64>,
    total: u64,
    missing: u64,
}

struct RangeAcc<'a> {
    request: &'a RangeFacet,
    counts: Vec<u64>,
    total: u64,
    missing: u64,
}

impl<'a> FacetAccumulator<'a> {
    /// Build an accumulator for the requested facets
    pub fn new(facets: &'a Facets) -> Self {
        FacetAccumulator {
            term: facets
                .top
                .iter()
                .map(|request| TermAcc {
                    request,
                    counts: HashMap::new(),
                    total: 0,
                    missing: 0,
                })
                .collect(),
            range: facets
                .range
                .iter()
                .map(|request| RangeAcc {
                    request,
                    counts: vec![0; request.ranges.len()],
                    total: 0,
                    missing: 0,
                })
                .collect(),
        }
    }

    /// Feed one matching document's fields into every facet
    pub fn observe(&mut self, fields: &FieldMap) {
        for acc in &mut self.term {
            match fields.get(&acc.request.field) {
                Some(values) if !values.is_empty() => {
                    for v in values {
                        *acc.counts.entry(scalar_text(v)).or_insert(0) += 1;
                        acc.total += 1;
                    }
                }
                _ => acc.missing += 1,
            }
        }
        for acc in &mut self.range {
            match fields.get(&acc.request.field) {
                Some(values) if !values.is_empty() => {
                    for v in values {
                        acc.total += 1;
                        if let Some(n) = numeric_value(v) {
                            for (slot, range) in acc.counts.iter_mut().zip(&acc.request.ranges) {
                                if in_range(n, range) {
                                    *slot += 1;
                                }
                            }
                        }
                    }
                }
                _ => acc.missing += 1,
            }
        }
    }

    /// Finish aggregation, producing results in request order
    pub fn finish(self) -> Vec<FacetResult> {
        let mut results = Vec::with_capacity(self.term.len() + self.range.len());
        for acc in self.term {
            let mut terms: Vec<TermCount> = acc
                .counts
                .into_iter()
                .map(|(term, count)| TermCount { term, count })
                .collect();
            // Most frequent first; term order breaks count ties
            terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
            terms.truncate(acc.request.count);
            results.push(FacetResult {
                name: acc.request.name.clone(),
                field: acc.request.field.clone(),
                total: acc.total,
                missing: acc.missing,
                terms,
                ranges: Vec::new(),
            });
        }
        for acc in self.range {
            let ranges = acc
                .request
                .ranges
                .iter()
                .zip(acc.counts)
                .map(|(range, count)| RangeCount {
                    name: range.name.clone(),
                    count,
                })
                .collect();
            results.push(FacetResult {
                name: acc.request.name.clone(),
                field: acc.request.field.clone(),
                total: acc.total,
                missing: acc.missing,
                terms: Vec::new(),
                ranges,
            });
        }
        results
    }
}

fn numeric_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn in_range(v: f64, range: &NumericRange) -> bool {
    range.min.map(|min| v >= min).unwrap_or(true) && range.max.map(|max| v < max).unwrap_or(true)
}
