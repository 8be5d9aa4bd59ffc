//! MikroDB - Core Type Definitions
//! Defines the value grammar, the record envelope, and the small
//! query/option types shared across the engine.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Maximum encodable key length (bytes), per the binary table format.
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

/// A table's name; also its on-disk file name.
pub type TableName = String;

/// The dynamically-typed value grammar stored in every record.
///
/// Mirrors the tagged sum type from the design notes:
/// `Null | Bool | I32 | F64 | Str | Arr[Value] | Obj[(Str,Value)] | Date(i64)`.
/// `Obj` is a `Vec` of pairs rather than a map so insertion order is
/// preserved on the rare occasion a caller depends on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    F64(f64),
    Str(String),
    Arr(Vec<Value>),
    Obj(Vec<(String, Value)>),
    /// Milliseconds since the Unix epoch.
    Date(i64),
}

impl Value {
    /// Navigate a dot-separated field path (`a.b.c`) into this value.
    /// Returns `None` if any segment is missing or the value isn't an object.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            match current {
                Value::Obj(fields) => {
                    current = &fields.iter().find(|(k, _)| k == segment)?.1;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Best-effort total order used by `gt`/`gte`/`lt`/`lte` and sorting.
    /// Numbers compare numerically; strings compare lexically; everything
    /// else (including cross-type comparisons) is incomparable.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => Some(a.cmp(b)),
            (Value::F64(a), Value::F64(b)) => a.partial_cmp(b),
            (Value::I32(a), Value::F64(b)) => (*a as f64).partial_cmp(b),
            (Value::F64(a), Value::I32(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Coerce an arbitrary value to its string representation, used by the
    /// codec to accept values the grammar doesn't otherwise model.
    pub fn coerce_to_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::I32(i) => i.to_string(),
            Value::F64(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::Date(d) => d.to_string(),
            Value::Arr(_) | Value::Obj(_) => {
                serde_json::to_string(&self.to_json()).unwrap_or_default()
            }
        }
    }

    /// Convert to a `serde_json::Value`, used for the WAL's `<jsonValue>`
    /// field and for `dump()` snapshots. `Date` has no native JSON type, so
    /// it is encoded as a single-key object `{"$date": millis}`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::I32(i) => J::Number((*i).into()),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(J::Number)
                .unwrap_or(J::Null),
            Value::Str(s) => J::String(s.clone()),
            Value::Arr(items) => J::Array(items.iter().map(Value::to_json).collect()),
            Value::Obj(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_json());
                }
                J::Object(map)
            }
            Value::Date(ms) => {
                let mut map = serde_json::Map::with_capacity(1);
                map.insert("$date".to_string(), serde_json::Number::from(*ms).into());
                J::Object(map)
            }
        }
    }

    /// Inverse of [`Value::to_json`]. Integers outside `i32` range become
    /// `F64`, matching the binary codec's own rule.
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(*b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(i32_val) => Value::I32(i32_val),
                        Err(_) => Value::F64(i as f64),
                    }
                } else {
                    Value::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            J::String(s) => Value::Str(s.clone()),
            J::Array(items) => Value::Arr(items.iter().map(Value::from_json).collect()),
            J::Object(map) => {
                if map.len() == 1 {
                    if let Some(J::Number(n)) = map.get("$date") {
                        if let Some(ms) = n.as_i64() {
                            return Value::Date(ms);
                        }
                    }
                }
                Value::Obj(
                    map.iter()
                        .map(|(k, v)| (k.clone(), Value::from_json(v)))
                        .collect(),
                )
            }
        }
    }
}

/// The unit of storage under a key inside a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub value: Value,
    /// Monotonically increasing, starting at 1 on first write.
    pub version: u32,
    /// Epoch-millisecond wall clock of the last write.
    pub timestamp: u64,
    /// Epoch-millisecond absolute deadline, or `None` if it never expires.
    pub expiration: Option<u64>,
}

impl Record {
    /// Returns true if `expiration` is set and has already passed as of `now_ms`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        matches!(self.expiration, Some(deadline) if deadline <= now_ms)
    }
}

/// A single write request handed to [`crate::MikroDb::write`].
#[derive(Debug, Clone)]
pub struct WriteOp {
    pub table: TableName,
    pub key: String,
    pub value: Value,
    /// Optimistic-concurrency token: the write only applies if the
    /// record's current version equals this value.
    pub expected_version: Option<u32>,
    pub expiration: Option<u64>,
}

impl WriteOp {
    pub fn new(table: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            value,
            expected_version: None,
            expiration: None,
        }
    }

    pub fn with_expected_version(mut self, version: u32) -> Self {
        self.expected_version = Some(version);
        self
    }

    pub fn with_expiration(mut self, expiration_ms: u64) -> Self {
        self.expiration = Some(expiration_ms);
        self
    }
}

/// Options accompanying a batch [`crate::MikroDb::write`] call.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Upper bound on the number of writes dispatched per slice within a batch.
    pub concurrency_limit: usize,
    /// Force a full flush (WAL then writes) immediately after this call,
    /// in addition to the unconditional post-batch flush every write runs.
    pub flush_immediately: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: 8,
            flush_immediately: false,
        }
    }
}

/// A caller-supplied ordering over `(key, record)` pairs, used by
/// `QueryOptions::comparator`.
pub type Comparator = Box<dyn Fn(&(String, Record), &(String, Record)) -> Ordering + Send + Sync>;

/// Convenience sort specification for the common single-field case
/// (this is what the out-of-scope HTTP surface is expected to build from
/// a query string).
#[derive(Debug, Clone)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

/// The full set of `(key, record)` pairs resident for a table, as a map.
pub type TableData = HashMap<String, Record>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_path_navigates_nested_objects() {
        let value = Value::Obj(vec![(
            "profile".to_string(),
            Value::Obj(vec![(
                "location".to_string(),
                Value::Obj(vec![("country".to_string(), Value::Str("Canada".to_string()))]),
            )]),
        )]);
        assert_eq!(
            value.get_path("profile.location.country"),
            Some(&Value::Str("Canada".to_string()))
        );
        assert_eq!(value.get_path("profile.missing.country"), None);
    }

    #[test]
    fn partial_compare_numbers_cross_type() {
        assert_eq!(
            Value::I32(5).partial_compare(&Value::F64(5.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(Value::Str("a".into()).partial_compare(&Value::I32(1)), None);
    }

    #[test]
    fn json_roundtrip_preserves_date() {
        let value = Value::Date(1_700_000_000_000);
        let json = value.to_json();
        assert_eq!(Value::from_json(&json), value);
    }

    #[test]
    fn json_roundtrip_object_and_array() {
        let value = Value::Obj(vec![
            ("n".to_string(), Value::I32(42)),
            ("a".to_string(), Value::Arr(vec![Value::Bool(true), Value::Null])),
        ]);
        let json = value.to_json();
        assert_eq!(Value::from_json(&json), value);
    }

    #[test]
    fn large_integer_becomes_f64() {
        let json: serde_json::Value = serde_json::from_str("9999999999").unwrap();
        assert_eq!(Value::from_json(&json), Value::F64(9_999_999_999.0));
    }
}
