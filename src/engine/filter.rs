//! MikroDB - Filter Engine
//! Evaluates composable predicates over decoded values.

use std::cmp::Ordering;

use regex::Regex;

use crate::types::{Comparator, Record, SortKey, Value};

/// Leaf comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Like,
    Between,
    Regex,
    Contains,
    ContainsAll,
    ContainsAny,
    Size,
}

/// What a single field path is matched against.
#[derive(Debug, Clone)]
pub enum FieldMatch {
    /// A bare value: matched with strict equality.
    Equals(Value),
    /// `{operator, value}`.
    Condition(Operator, Value),
    /// A nested expression evaluated against the field's sub-value.
    Nested(Box<FilterExpr>),
}

/// A composable filter expression: a conjunction of field conditions,
/// optionally combined with a disjunction of sub-expressions carried under
/// the special `$or` key.
#[derive(Debug, Clone, Default)]
pub struct FilterExpr {
    pub fields: Vec<(String, FieldMatch)>,
    pub or: Vec<FilterExpr>,
}

impl FilterExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, path: impl Into<String>, field_match: FieldMatch) -> Self {
        self.fields.push((path.into(), field_match));
        self
    }

    pub fn with_or(mut self, branches: Vec<FilterExpr>) -> Self {
        self.or = branches;
        self
    }

    /// Evaluate this expression against `value`.
    pub fn matches(&self, value: &Value) -> bool {
        let fields_match = self
            .fields
            .iter()
            .all(|(path, field_match)| evaluate_field(value, path, field_match));

        let or_match = self.or.is_empty() || self.or.iter().any(|branch| branch.matches(value));

        fields_match && or_match
    }
}

fn evaluate_field(value: &Value, path: &str, field_match: &FieldMatch) -> bool {
    // Missing or null nested fields short-circuit to false: `get_path`
    // already returns `None` whenever an intermediate segment isn't an
    // object (including when it's `Null`).
    let Some(actual) = value.get_path(path) else {
        return false;
    };

    match field_match {
        FieldMatch::Equals(expected) => actual == expected,
        FieldMatch::Condition(op, expected) => evaluate_operator(actual, *op, expected),
        FieldMatch::Nested(sub_expr) => sub_expr.matches(actual),
    }
}

fn evaluate_operator(actual: &Value, op: Operator, expected: &Value) -> bool {
    match op {
        Operator::Eq => actual == expected,
        Operator::Neq => actual != expected,
        Operator::Gt => actual.partial_compare(expected) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            actual.partial_compare(expected),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        Operator::Lt => actual.partial_compare(expected) == Some(Ordering::Less),
        Operator::Lte => matches!(
            actual.partial_compare(expected),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        Operator::In => match expected {
            Value::Arr(items) => items.contains(actual),
            _ => false,
        },
        Operator::Nin => match expected {
            Value::Arr(items) => !items.contains(actual),
            _ => false,
        },
        Operator::Like => match (actual, expected) {
            (Value::Str(a), Value::Str(b)) => a.to_lowercase().contains(&b.to_lowercase()),
            _ => false,
        },
        Operator::Between => match expected {
            Value::Arr(bounds) if bounds.len() == 2 => {
                let above_lo = matches!(
                    actual.partial_compare(&bounds[0]),
                    Some(Ordering::Greater) | Some(Ordering::Equal)
                );
                let below_hi = matches!(
                    actual.partial_compare(&bounds[1]),
                    Some(Ordering::Less) | Some(Ordering::Equal)
                );
                above_lo && below_hi
            }
            _ => false,
        },
        Operator::Regex => match (actual, expected) {
            (Value::Str(a), Value::Str(pattern)) => {
                Regex::new(pattern).map(|re| re.is_match(a)).unwrap_or(false)
            }
            _ => false,
        },
        Operator::Contains => match actual {
            Value::Arr(items) => items.contains(expected),
            _ => false,
        },
        Operator::ContainsAll => match (actual, expected) {
            (Value::Arr(items), Value::Arr(required)) => {
                required.iter().all(|r| items.contains(r))
            }
            _ => false,
        },
        Operator::ContainsAny => match (actual, expected) {
            (Value::Arr(items), Value::Arr(required)) => {
                required.iter().any(|r| items.contains(r))
            }
            _ => false,
        },
        Operator::Size => match actual {
            Value::Arr(items) => {
                Value::I32(items.len() as i32).partial_compare(expected) == Some(Ordering::Equal)
            }
            _ => false,
        },
    }
}

/// Query options accompanying a filtered `get`: filter, sort, and a
/// `[offset, offset+limit)` slice applied in that order.
#[derive(Default)]
pub struct QueryOptions {
    pub filter: Option<FilterExpr>,
    pub sort_key: Option<SortKey>,
    pub comparator: Option<Comparator>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Run `pairs` through filter, sort, and offset/limit slicing.
pub fn apply_query(
    mut pairs: Vec<(String, Record)>,
    options: &QueryOptions,
) -> Vec<(String, Record)> {
    if let Some(filter) = &options.filter {
        pairs.retain(|(_, record)| filter.matches(&record.value));
    }

    if let Some(comparator) = &options.comparator {
        pairs.sort_by(|a, b| comparator(a, b));
    } else if let Some(sort_key) = &options.sort_key {
        pairs.sort_by(|(_, a), (_, b)| {
            let ordering = match (a.value.get_path(&sort_key.field), b.value.get_path(&sort_key.field)) {
                (Some(av), Some(bv)) => av.partial_compare(bv).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if sort_key.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    let offset = options.offset.unwrap_or(0);
    if offset >= pairs.len() {
        return Vec::new();
    }
    let end = match options.limit {
        Some(limit) => (offset + limit).min(pairs.len()),
        None => pairs.len(),
    };
    pairs[offset..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    fn record_with(value: Value) -> Record {
        Record {
            value,
            version: 1,
            timestamp: 0,
            expiration: None,
        }
    }

    fn obj(fields: Vec<(&str, Value)>) -> Value {
        Value::Obj(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn between_operator_is_inclusive() {
        let expr = FilterExpr::new().with_field(
            "age",
            FieldMatch::Condition(Operator::Between, Value::Arr(vec![Value::I32(24), Value::I32(26)])),
        );

        assert!(expr.matches(&obj(vec![("age", Value::I32(25))])));
        assert!(expr.matches(&obj(vec![("age", Value::I32(24))])));
        assert!(expr.matches(&obj(vec![("age", Value::I32(26))])));
        assert!(!expr.matches(&obj(vec![("age", Value::I32(30))])));
    }

    #[test]
    fn or_combines_branches_disjunctively() {
        let expr = FilterExpr::new().with_or(vec![
            FilterExpr::new().with_field("role", FieldMatch::Equals(Value::Str("admin".to_string()))),
            FilterExpr::new().with_field(
                "profile.location.country",
                FieldMatch::Equals(Value::Str("Canada".to_string())),
            ),
        ]);

        let admin = obj(vec![("role", Value::Str("admin".to_string()))]);
        let canadian = obj(vec![(
            "profile",
            obj(vec![("location", obj(vec![("country", Value::Str("Canada".to_string()))]))]),
        )]);
        let neither = obj(vec![("role", Value::Str("user".to_string()))]);

        assert!(expr.matches(&admin));
        assert!(expr.matches(&canadian));
        assert!(!expr.matches(&neither));
    }

    #[test]
    fn missing_field_short_circuits_false() {
        let expr = FilterExpr::new().with_field("missing.path", FieldMatch::Equals(Value::I32(1)));
        assert!(!expr.matches(&obj(vec![("age", Value::I32(1))])));
    }

    #[test]
    fn like_is_case_insensitive_substring() {
        let expr =
            FilterExpr::new().with_field("name", FieldMatch::Condition(Operator::Like, Value::Str("ANE".to_string())));
        assert!(expr.matches(&obj(vec![("name", Value::Str("Jane".to_string()))])));
        assert!(!expr.matches(&obj(vec![("name", Value::Str("Bob".to_string()))])));
    }

    #[test]
    fn invalid_regex_pattern_yields_false() {
        let expr = FilterExpr::new().with_field("name", FieldMatch::Condition(Operator::Regex, Value::Str("(".to_string())));
        assert!(!expr.matches(&obj(vec![("name", Value::Str("Jane".to_string()))])));
    }

    #[test]
    fn contains_all_with_empty_list_is_true() {
        let expr = FilterExpr::new().with_field(
            "tags",
            FieldMatch::Condition(Operator::ContainsAll, Value::Arr(vec![])),
        );
        assert!(expr.matches(&obj(vec![("tags", Value::Arr(vec![Value::Str("a".to_string())]))])));
    }

    #[test]
    fn apply_query_filters_sorts_and_slices() {
        let pairs = vec![
            ("a".to_string(), record_with(obj(vec![("age", Value::I32(30))]))),
            ("b".to_string(), record_with(obj(vec![("age", Value::I32(20))]))),
            ("c".to_string(), record_with(obj(vec![("age", Value::I32(25))]))),
        ];

        let options = QueryOptions {
            filter: None,
            sort_key: Some(SortKey {
                field: "age".to_string(),
                descending: false,
            }),
            comparator: None,
            limit: Some(2),
            offset: Some(0),
        };

        let result = apply_query(pairs, &options);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, "b");
        assert_eq!(result[1].0, "c");
    }

    #[test]
    fn apply_query_between_filter_returns_exact_match() {
        let pairs = vec![
            ("young".to_string(), record_with(obj(vec![("age", Value::I32(25))]))),
            ("old".to_string(), record_with(obj(vec![("age", Value::I32(30))]))),
        ];
        let options = QueryOptions {
            filter: Some(FilterExpr::new().with_field(
                "age",
                FieldMatch::Condition(Operator::Between, Value::Arr(vec![Value::I32(24), Value::I32(26)])),
            )),
            ..QueryOptions::new()
        };
        let result = apply_query(pairs, &options);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "young");
    }
}
