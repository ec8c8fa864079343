use serde_json::{Map, Value};

use super::table::Row;

/// Conjunction of equality predicates. An empty filter matches every row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the predicate `field == value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every predicate holds for the row
    pub fn matches(&self, row: &Row) -> bool {
        self.0.iter().all(|(field, expected)| {
            row.get(field)
                .is_some_and(|actual| strict_eq(actual, expected))
        })
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// JSON strict equality. Numbers compare by value so `1` equals `1.0`
pub(crate) fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&row(json!({}))));
        assert!(Filter::new().matches(&row(json!({"id": 1}))));
    }

    #[test]
    fn requires_all_fields() {
        let filter = Filter::new().eq("conversaId", 1).eq("lida", false);

        assert!(filter.matches(&row(json!({"conversaId": 1, "lida": false, "id": 4}))));
        assert!(!filter.matches(&row(json!({"conversaId": 1, "lida": true}))));
        assert!(!filter.matches(&row(json!({"conversaId": 2, "lida": false}))));
        assert!(!filter.matches(&row(json!({"conversaId": 1}))));
    }

    #[test]
    fn strict_equality() {
        let row = row(json!({"n": 1, "s": "1", "f": 2.0}));

        assert!(Filter::new().eq("n", 1.0).matches(&row));
        assert!(Filter::new().eq("f", 2).matches(&row));
        assert!(!Filter::new().eq("s", 1).matches(&row));
        assert!(!Filter::new().eq("n", "1").matches(&row));
    }

    #[test]
    fn large_unsigned_ids_stay_distinct() {
        let row = row(json!({"id": u64::MAX}));

        assert!(Filter::new().eq("id", u64::MAX).matches(&row));
        assert!(!Filter::new().eq("id", u64::MAX - 1).matches(&row));
    }

    #[test]
    fn missing_field_is_not_null() {
        let filter = Filter::new().eq("usuarioId", Value::Null);

        assert!(!filter.matches(&row(json!({"id": 1}))));
        assert!(filter.matches(&row(json!({"id": 1, "usuarioId": null}))));
    }
}
