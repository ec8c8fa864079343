mod error;

pub mod app;
pub mod repl;
pub mod storage;

pub use error::{Error, Result};
pub use repl::*;
pub use storage::{Database, FileStore, Filter, KeyValueStore, MemoryStore, Row, Table};
