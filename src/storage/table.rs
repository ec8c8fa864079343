use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{filter::strict_eq, schema::FieldDef, Filter};
use crate::{Error, Result};

/// A stored record, keyed by field name
pub type Row = Map<String, Value>;

/// Field every row receives on insert
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    schema: Vec<FieldDef>,
    data: Vec<Row>,
    next_id: u64,
}

impl Table {
    pub fn new(schema: Vec<FieldDef>) -> Self {
        Self {
            schema,
            data: Vec::new(),
            next_id: 1,
        }
    }

    pub fn schema(&self) -> &[FieldDef] {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.data
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn select(&self, filter: &Filter) -> Vec<Row> {
        self.data
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect()
    }

    /// Assigns the next id and appends the record.
    ///
    /// Returns the name of the violated key field on failure, in which case
    /// neither the rows nor the id counter change.
    pub(crate) fn insert(&mut self, mut record: Row) -> std::result::Result<Row, String> {
        record.insert(ID_FIELD.to_string(), Value::from(self.next_id));

        for field in self.key_fields() {
            let taken = self
                .data
                .iter()
                .any(|row| same_value(row.get(field), record.get(field)));
            if taken {
                return Err(field.to_string());
            }
        }

        self.next_id += 1;
        self.data.push(record.clone());
        Ok(record)
    }

    /// Shallow merges `patch` into every matching row, returning how many
    /// rows were touched. Nothing changes when the result would break a key.
    ///
    /// Row ids are assigned on insert only, an `id` in the patch is ignored.
    pub(crate) fn update(&mut self, patch: &Row, filter: &Filter) -> std::result::Result<usize, String> {
        let mut candidate = self.data.clone();
        let mut touched = Vec::new();

        for (index, row) in candidate.iter_mut().enumerate() {
            if filter.matches(row) {
                for (field, value) in patch.iter().filter(|(f, _)| *f != ID_FIELD) {
                    row.insert(field.clone(), value.clone());
                }
                touched.push(index);
            }
        }

        for field in self
            .key_fields()
            .filter(|f| *f != ID_FIELD && patch.contains_key(*f))
        {
            for &index in &touched {
                let value = candidate[index].get(field);
                let clash = candidate
                    .iter()
                    .enumerate()
                    .any(|(other, row)| other != index && same_value(row.get(field), value));
                if clash {
                    return Err(field.to_string());
                }
            }
        }

        if !touched.is_empty() {
            self.data = candidate;
        }
        Ok(touched.len())
    }

    /// Removes every row matching all predicates of the filter
    pub(crate) fn delete(&mut self, filter: &Filter) -> usize {
        let before = self.data.len();
        self.data.retain(|row| !filter.matches(row));
        before - self.data.len()
    }

    pub(crate) fn truncate(&mut self) {
        self.data.clear();
        self.next_id = 1;
    }

    fn key_fields(&self) -> impl Iterator<Item = &str> {
        self.schema
            .iter()
            .filter(|f| f.is_key())
            .map(|f| f.name.as_str())
    }
}

/// Two absent values count as equal
fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => strict_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Converts a typed record into a row
pub fn to_row<T: Serialize>(record: &T) -> Result<Row> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(Error::Serialization(serde::ser::Error::custom(format!(
            "expected an object record, got `{other}`"
        )))),
    }
}

/// Converts a row back into a typed record
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
