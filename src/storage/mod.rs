pub mod database;
pub mod filter;
pub mod kv;
pub mod schema;
pub mod statement;
pub mod table;

pub use database::{Database, Document, TableDef};
pub use filter::Filter;
pub use kv::{FileStore, MemoryStore};
pub use schema::{FieldDef, FieldType};
pub use statement::Statement;
pub use table::{Row, Table};

use crate::Result;

/// Persistent string key-value storage the database document lives in
pub trait KeyValueStore {
    /// Retrieves a stored value, `None` when the key was never set
    ///
    /// # Params
    ///
    /// - `key`: Storage key to read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value, replacing any previous one
    ///
    /// # Params
    ///
    /// - `key`: Storage key to write.
    /// - `value`: Serialized content to store.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// Removes a stored value. Removing a missing key is not an error
    ///
    /// # Params
    ///
    /// - `key`: Storage key to remove.
    fn remove(&mut self, key: &str) -> Result<()>;
}
