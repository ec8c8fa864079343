use serde_json::{Deserializer, Map, Value};

use super::{Database, Filter, KeyValueStore, Row};
use crate::{Error, Result};

/// Database commands/statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert { table: String, record: Row },
    Select { table: String, filter: Filter },
    SelectOne { table: String, filter: Filter },
    Update { table: String, patch: Row, filter: Filter },
    Delete { table: String, filter: Filter },
    Truncate { table: String },
    Count { table: String, filter: Filter },
}

impl Statement {
    pub const KEYWORDS: [&'static str; 7] = [
        "insert",
        "select",
        "select-one",
        "update",
        "delete",
        "truncate",
        "count",
    ];

    /// Runs the statement, returning the text to print
    pub fn execute<S: KeyValueStore>(&self, db: &mut Database<S>) -> Result<String> {
        match self {
            Self::Insert { table, record } => {
                let inserted = db.insert(table, record.clone())?;
                Ok(Value::Object(inserted).to_string())
            }
            Self::Select { table, filter } => {
                let rows = db.select(table, filter)?;
                Ok(rows
                    .into_iter()
                    .map(|row| Value::Object(row).to_string())
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Self::SelectOne { table, filter } => Ok(match db.select_one(table, filter)? {
                Some(row) => Value::Object(row).to_string(),
                None => "null".to_string(),
            }),
            Self::Update {
                table,
                patch,
                filter,
            } => Ok(format!("updated: {}", db.update(table, patch, filter)?)),
            Self::Delete { table, filter } => {
                Ok(format!("deleted: {}", db.delete(table, filter)?))
            }
            Self::Truncate { table } => {
                db.truncate(table)?;
                Ok(format!("truncated {table}"))
            }
            Self::Count { table, filter } => Ok(db.count(table, filter)?.to_string()),
        }
    }
}

impl TryFrom<&str> for Statement {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        let (keyword, rest) = split_word(input);
        let (table, rest) = split_word(rest);
        if table.is_empty() {
            return Err(Error::InvalidCommand(format!("`{keyword}` needs a table name")));
        }
        let table = table.to_string();
        let mut objects = parse_objects(rest)?.into_iter();

        let statement = match (keyword, objects.len()) {
            ("insert", 1) => Self::Insert {
                table,
                record: objects.next().unwrap_or_default(),
            },
            ("select", 0 | 1) => Self::Select {
                table,
                filter: objects.next().unwrap_or_default().into(),
            },
            ("select-one", 0 | 1) => Self::SelectOne {
                table,
                filter: objects.next().unwrap_or_default().into(),
            },
            ("update", 2) => Self::Update {
                table,
                patch: objects.next().unwrap_or_default(),
                filter: objects.next().unwrap_or_default().into(),
            },
            ("delete", 1) => Self::Delete {
                table,
                filter: objects.next().unwrap_or_default().into(),
            },
            ("truncate", 0) => Self::Truncate { table },
            ("count", 0 | 1) => Self::Count {
                table,
                filter: objects.next().unwrap_or_default().into(),
            },
            (keyword, count) => {
                return Err(Error::InvalidCommand(format!(
                    "`{keyword}` does not take {count} JSON object(s)"
                )))
            }
        };

        Ok(statement)
    }
}

/// Splits off the first whitespace separated word
pub(crate) fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

/// Parses a run of JSON objects, e.g. `{"a": 1} {"b": 2}`
pub(crate) fn parse_objects(input: &str) -> Result<Vec<Map<String, Value>>> {
    Deserializer::from_str(input)
        .into_iter::<Map<String, Value>>()
        .map(|object| object.map_err(Error::from))
        .collect()
}
