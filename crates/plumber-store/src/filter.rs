//! Document filters.
//!
//! A [`Filter`] is a conjunction of [`Clause`]s. An empty filter matches
//! every document.
//!
//! Caller filters address a stored object as the envelope
//! `{"_id": <id>, "data": <payload>}`: `data` is the whole payload and
//! `data.a.b` a path into it. Field predicates follow document-database
//! rules, so equality against an array also matches when the array contains
//! the value.
//!
//! [`Clause::Payload`] is the exact whole-payload equality used for dedup.
//! Payload equality is `serde_json::Value` equality. Objects are
//! `BTreeMap`-backed, so key order never affects a match; array order does.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use plumber_types::DocumentId;

use crate::document::Document;
use crate::error::FilterError;

/// Key that addresses the generated document id in a JSON filter.
pub const ID_KEY: &str = "_id";
/// Key that addresses the payload in a JSON filter.
pub const DATA_KEY: &str = "data";

/// A comparison applied to the value found at a payload path.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Exists(bool),
}

impl Predicate {
    /// Evaluate against the value at the path, `None` if the path is absent.
    ///
    /// An absent field equals `null`, so `Eq(Null)` matches it and
    /// `Ne(Null)` does not. An array matches a comparison if the array
    /// itself or any of its elements does. Ordering predicates never match
    /// an absent field or values of different kinds.
    pub fn test(&self, found: Option<&Value>) -> bool {
        match self {
            Self::Eq(expected) => equals(found, expected),
            Self::Ne(expected) => !equals(found, expected),
            Self::Gt(bound) => ordered(found, bound, |o| o == Ordering::Greater),
            Self::Gte(bound) => ordered(found, bound, |o| o != Ordering::Less),
            Self::Lt(bound) => ordered(found, bound, |o| o == Ordering::Less),
            Self::Lte(bound) => ordered(found, bound, |o| o != Ordering::Greater),
            Self::In(options) => options.iter().any(|option| equals(found, option)),
            Self::Exists(wanted) => found.is_some() == *wanted,
        }
    }
}

/// The value itself, then its elements if it is an array.
fn candidates(value: &Value) -> impl Iterator<Item = &Value> {
    let elements: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    };
    std::iter::once(value).chain(elements)
}

fn equals(found: Option<&Value>, expected: &Value) -> bool {
    match found {
        Some(value) => candidates(value).any(|candidate| candidate == expected),
        None => expected.is_null(),
    }
}

fn ordered(found: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    found.is_some_and(|value| {
        candidates(value).any(|candidate| compare(candidate, bound).is_some_and(&accept))
    })
}

fn compare(found: &Value, bound: &Value) -> Option<Ordering> {
    match (found, bound) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                Some(a.cmp(&b))
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                Some(a.cmp(&b))
            } else {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// One condition a document must satisfy.
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    /// The generated document id equals this id.
    Id(DocumentId),
    /// The `consumed` flag has this value.
    Consumed(bool),
    /// The document was inserted strictly after this instant.
    InsertedAfter(DateTime<Utc>),
    /// The whole payload is exactly this value. Arrays must match as a whole.
    Payload(Value),
    /// The payload value at `path` satisfies `predicate`. The empty path is
    /// the whole payload.
    Field { path: Vec<String>, predicate: Predicate },
    /// A top-level envelope field other than `_id` and `data`. Documents
    /// never carry one, so `predicate` is tested against an absent value.
    Envelope { key: String, predicate: Predicate },
}

impl Clause {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Id(id) => doc.id == *id,
            Self::Consumed(consumed) => doc.consumed == *consumed,
            Self::InsertedAfter(at) => doc.inserted_at > *at,
            Self::Payload(payload) => doc.payload == *payload,
            Self::Field { path, predicate } => predicate.test(resolve(&doc.payload, path)),
            Self::Envelope { predicate, .. } => predicate.test(None),
        }
    }
}

/// Follow `path` into `value`. Array elements are addressed by index.
fn resolve<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// A conjunction of clauses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// The empty filter, which matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match documents whose whole payload is exactly `payload`.
    pub fn payload_eq(payload: Value) -> Self {
        Self::new().with(Clause::Payload(payload))
    }

    pub fn with(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn id(self, id: DocumentId) -> Self {
        self.with(Clause::Id(id))
    }

    pub fn consumed(self, consumed: bool) -> Self {
        self.with(Clause::Consumed(consumed))
    }

    pub fn inserted_after(self, at: DateTime<Utc>) -> Self {
        self.with(Clause::InsertedAfter(at))
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|clause| clause.matches(doc))
    }

    /// Parse a caller-supplied JSON filter object.
    ///
    /// - `"_id": "<uuid>"` matches the generated id.
    /// - `"data": v` matches the payload; `"data.a.b": v` matches the
    ///   payload value at path `a` → `b`.
    /// - Any other top-level key names a field stored objects do not have.
    /// - A value whose keys all start with `$` is an operator object:
    ///   `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$exists`.
    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        let object = value.as_object().ok_or(FilterError::NotAnObject)?;
        let mut filter = Self::new();

        for (key, condition) in object {
            if key == ID_KEY {
                let raw = condition
                    .as_str()
                    .ok_or_else(|| FilterError::InvalidId(condition.to_string()))?;
                let id: DocumentId = raw
                    .parse()
                    .map_err(|_| FilterError::InvalidId(raw.to_string()))?;
                filter = filter.id(id);
                continue;
            }

            let path = parse_path(key)?;
            for predicate in parse_condition(condition)? {
                let clause = match &path {
                    Some(path) => Clause::Field {
                        path: path.clone(),
                        predicate,
                    },
                    None => Clause::Envelope {
                        key: key.clone(),
                        predicate,
                    },
                };
                filter = filter.with(clause);
            }
        }

        Ok(filter)
    }
}

/// Split a dotted key. `Some(path)` is a path into the payload, `None` a
/// top-level key outside `data`.
fn parse_path(key: &str) -> Result<Option<Vec<String>>, FilterError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(FilterError::EmptyPath(key.to_string()));
    }
    match segments.split_first() {
        Some((first, rest)) if *first == DATA_KEY => {
            Ok(Some(rest.iter().map(|s| s.to_string()).collect()))
        }
        _ => Ok(None),
    }
}

fn parse_condition(condition: &Value) -> Result<Vec<Predicate>, FilterError> {
    match operator_object(condition) {
        Some(operators) => operators
            .iter()
            .map(|(op, operand)| parse_operator(op, operand))
            .collect(),
        None => Ok(vec![Predicate::Eq(condition.clone())]),
    }
}

fn operator_object(condition: &Value) -> Option<&Map<String, Value>> {
    let map = condition.as_object()?;
    if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) {
        Some(map)
    } else {
        None
    }
}

fn parse_operator(op: &str, operand: &Value) -> Result<Predicate, FilterError> {
    let predicate = match op {
        "$eq" => Predicate::Eq(operand.clone()),
        "$ne" => Predicate::Ne(operand.clone()),
        "$gt" => Predicate::Gt(operand.clone()),
        "$gte" => Predicate::Gte(operand.clone()),
        "$lt" => Predicate::Lt(operand.clone()),
        "$lte" => Predicate::Lte(operand.clone()),
        "$in" => match operand {
            Value::Array(options) => Predicate::In(options.clone()),
            _ => {
                return Err(FilterError::OperandType {
                    op: op.to_string(),
                    expected: "an array",
                })
            }
        },
        "$exists" => match operand {
            Value::Bool(wanted) => Predicate::Exists(*wanted),
            _ => {
                return Err(FilterError::OperandType {
                    op: op.to_string(),
                    expected: "a boolean",
                })
            }
        },
        other => return Err(FilterError::UnknownOperator(other.to_string())),
    };
    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(payload: Value) -> Document {
        Document::new(payload, Utc::now())
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&doc(json!(null))));
        assert_eq!(Filter::from_json(&json!({})).unwrap(), Filter::new());
    }

    #[test]
    fn payload_equality_ignores_key_order() {
        let stored: Value = serde_json::from_str(r#"{"a": 1, "b": {"x": true, "y": [1, 2]}}"#).unwrap();
        let query: Value = serde_json::from_str(r#"{"b": {"y": [1, 2], "x": true}, "a": 1}"#).unwrap();
        assert!(Filter::payload_eq(query).matches(&doc(stored)));
    }

    #[test]
    fn payload_equality_respects_array_order() {
        let filter = Filter::payload_eq(json!([1, 2]));
        assert!(!filter.matches(&doc(json!([2, 1]))));
    }

    #[test]
    fn integer_and_float_are_different_payloads() {
        let filter = Filter::payload_eq(json!(1));
        assert!(!filter.matches(&doc(json!(1.0))));
    }

    #[test]
    fn consumed_and_inserted_after_clauses() {
        let mut d = doc(json!("x"));
        let before = d.inserted_at - chrono::Duration::seconds(1);
        assert!(Filter::new().consumed(false).matches(&d));
        d.consumed = true;
        assert!(!Filter::new().consumed(false).matches(&d));
        assert!(Filter::new().inserted_after(before).matches(&d));
        assert!(!Filter::new().inserted_after(d.inserted_at).matches(&d));
    }

    #[test]
    fn from_json_field_paths() {
        let d = doc(json!({"user": {"name": "ada", "tags": ["x", "y"]}}));
        let hit = Filter::from_json(&json!({"data.user.name": "ada"})).unwrap();
        let miss = Filter::from_json(&json!({"data.user.name": "bob"})).unwrap();
        let index = Filter::from_json(&json!({"data.user.tags.1": "y"})).unwrap();
        assert!(hit.matches(&d));
        assert!(!miss.matches(&d));
        assert!(index.matches(&d));
    }

    #[test]
    fn from_json_whole_payload() {
        let d = doc(json!("plain text"));
        let filter = Filter::from_json(&json!({"data": "plain text"})).unwrap();
        assert!(filter.matches(&d));

        let d = doc(json!({"kind": "b", "n": 1}));
        let reordered = Filter::from_json(&json!({"data": {"n": 1, "kind": "b"}})).unwrap();
        assert!(reordered.matches(&d));
    }

    #[test]
    fn keys_outside_data_are_absent_fields() {
        let d = doc(json!({"kind": "b"}));
        assert!(!Filter::from_json(&json!({"kind": "b"})).unwrap().matches(&d));
        assert!(Filter::from_json(&json!({"kind": null})).unwrap().matches(&d));
        assert!(Filter::from_json(&json!({"kind": {"$exists": false}})).unwrap().matches(&d));
    }

    #[test]
    fn equality_matches_array_elements() {
        let d = doc(json!({"tags": ["x", "y"], "scores": [3, 9]}));
        let cases = [
            (json!({"data.tags": "y"}), true),
            (json!({"data.tags": "z"}), false),
            (json!({"data.tags": ["x", "y"]}), true),
            (json!({"data.tags": ["y", "x"]}), false),
            (json!({"data.tags": {"$ne": "x"}}), false),
            (json!({"data.tags": {"$in": ["z", "x"]}}), true),
            (json!({"data.scores": {"$gt": 8}}), true),
            (json!({"data.scores": {"$lt": 3}}), false),
        ];
        for (raw, expected) in cases {
            let filter = Filter::from_json(&raw).unwrap();
            assert_eq!(filter.matches(&d), expected, "filter {raw}");
        }
    }

    #[test]
    fn payload_clause_is_exact() {
        let d = doc(json!(["a", "b"]));
        assert!(!Filter::payload_eq(json!("a")).matches(&d));
        assert!(Filter::payload_eq(json!(["a", "b"])).matches(&d));
        assert!(Filter::from_json(&json!({"data": "a"})).unwrap().matches(&d));
    }

    #[test]
    fn from_json_id() {
        let d = doc(json!({}));
        let filter = Filter::from_json(&json!({"_id": d.id.to_string()})).unwrap();
        assert!(filter.matches(&d));
        assert!(!filter.matches(&doc(json!({}))));
    }

    #[test]
    fn from_json_rejects_bad_id() {
        assert!(matches!(
            Filter::from_json(&json!({"_id": "nope"})),
            Err(FilterError::InvalidId(_))
        ));
        assert!(matches!(
            Filter::from_json(&json!({"_id": 42})),
            Err(FilterError::InvalidId(_))
        ));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert_eq!(Filter::from_json(&json!([1])), Err(FilterError::NotAnObject));
        assert_eq!(Filter::from_json(&json!("x")), Err(FilterError::NotAnObject));
    }

    #[test]
    fn from_json_rejects_empty_path_segments() {
        assert!(matches!(
            Filter::from_json(&json!({"data..b": 1})),
            Err(FilterError::EmptyPath(_))
        ));
    }

    #[test]
    fn operators() {
        let d = doc(json!({"n": 5, "s": "m"}));
        let cases = [
            (json!({"data.n": {"$gt": 4}}), true),
            (json!({"data.n": {"$gt": 5}}), false),
            (json!({"data.n": {"$gte": 5, "$lte": 5}}), true),
            (json!({"data.n": {"$lt": 5.5}}), true),
            (json!({"data.n": {"$ne": 5}}), false),
            (json!({"data.n": {"$in": [1, 5]}}), true),
            (json!({"data.s": {"$gt": "a"}}), true),
            (json!({"data.s": {"$gt": 1}}), false),
            (json!({"data.missing": {"$exists": false}}), true),
            (json!({"data.n": {"$exists": false}}), false),
            (json!({"data.missing": null}), true),
        ];
        for (raw, expected) in cases {
            let filter = Filter::from_json(&raw).unwrap();
            assert_eq!(filter.matches(&d), expected, "filter {raw}");
        }
    }

    #[test]
    fn nested_object_without_operators_is_equality() {
        let d = doc(json!({"meta": {"k": 1}}));
        let filter = Filter::from_json(&json!({"data.meta": {"k": 1}})).unwrap();
        assert!(filter.matches(&d));
    }

    #[test]
    fn operator_errors() {
        assert_eq!(
            Filter::from_json(&json!({"n": {"$regex": "x"}})),
            Err(FilterError::UnknownOperator("$regex".into()))
        );
        assert!(matches!(
            Filter::from_json(&json!({"n": {"$in": 3}})),
            Err(FilterError::OperandType { .. })
        ));
        assert!(matches!(
            Filter::from_json(&json!({"n": {"$exists": "yes"}})),
            Err(FilterError::OperandType { .. })
        ));
    }

    proptest::proptest! {
        #[test]
        fn integer_range_operators_agree_with_rust(n in -1000i64..1000, bound in -1000i64..1000) {
            let d = doc(json!({"n": n}));
            let gt = Filter::from_json(&json!({"data.n": {"$gt": bound}})).unwrap();
            let lte = Filter::from_json(&json!({"data.n": {"$lte": bound}})).unwrap();
            proptest::prop_assert_eq!(gt.matches(&d), n > bound);
            proptest::prop_assert_eq!(lte.matches(&d), n <= bound);
        }
    }
}
