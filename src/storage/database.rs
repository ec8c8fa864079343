use std::collections::BTreeMap;

use log::{debug, error, info};

use super::{schema::FieldDef, table::Table, Filter, KeyValueStore, Row};
use crate::{Error, Result};

/// Storage key holding the serialized document
pub const TABLES_KEY: &str = "tables";

/// Every table, by name. This is the unit of persistence
pub type Document = BTreeMap<String, Table>;

/// A table created when the database initializes
#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: String,
    pub schema: Vec<FieldDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, schema: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// SQL-like tables emulated on a single document in a key-value store.
///
/// Each operation reads the whole document, changes it in memory and writes
/// all of it back.
pub struct Database<S: KeyValueStore> {
    store: S,
    catalog: Vec<TableDef>,
}

impl<S: KeyValueStore> Database<S> {
    /// Opens the database, creating any catalog table that does not exist yet
    pub fn open(store: S, catalog: Vec<TableDef>) -> Result<Self> {
        let mut db = Self { store, catalog };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&mut self) -> Result<()> {
        for def in self.catalog.clone() {
            if self.get_table(&def.name)?.is_none() {
                debug!("creating table {}", def.name);
                self.create_table(&def.name, def.schema)?;
            }
        }
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn load(&self) -> Result<Document> {
        match self.store.get(TABLES_KEY)? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Document::new()),
        }
    }

    fn save(&mut self, document: &Document) -> Result<()> {
        let content = serde_json::to_string(document)?;
        self.store.set(TABLES_KEY, content)
    }

    fn table_mut<'a>(document: &'a mut Document, name: &str) -> Result<&'a mut Table> {
        document.get_mut(name).ok_or_else(|| not_found(name))
    }

    /// Registers a table, replacing any existing one of the same name
    pub fn create_table(&mut self, name: &str, schema: Vec<FieldDef>) -> Result<()> {
        let mut document = self.load()?;
        document.insert(name.to_string(), Table::new(schema));
        self.save(&document)
    }

    pub fn get_table(&self, name: &str) -> Result<Option<Table>> {
        Ok(self.load()?.remove(name))
    }

    /// Inserts a record, returning it with its assigned `id`
    pub fn insert(&mut self, table: &str, record: Row) -> Result<Row> {
        let mut document = self.load()?;
        let inserted = Self::table_mut(&mut document, table)?
            .insert(record)
            .map_err(|field| unique_violation(table, field))?;

        self.save(&document)?;
        Ok(inserted)
    }

    /// Rows matching the filter, in insertion order
    pub fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>> {
        let document = self.load()?;
        let table = document.get(table).ok_or_else(|| not_found(table))?;
        Ok(table.select(filter))
    }

    pub fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        Ok(self.select(table, filter)?.into_iter().next())
    }

    /// Merges `patch` into every matching row. Returns whether any row matched
    pub fn update(&mut self, table: &str, patch: &Row, filter: &Filter) -> Result<bool> {
        let mut document = self.load()?;
        let updated = Self::table_mut(&mut document, table)?
            .update(patch, filter)
            .map_err(|field| unique_violation(table, field))?;

        if updated > 0 {
            self.save(&document)?;
        }
        Ok(updated > 0)
    }

    /// Removes every matching row. Returns whether any row was removed
    pub fn delete(&mut self, table: &str, filter: &Filter) -> Result<bool> {
        let mut document = self.load()?;
        let removed = Self::table_mut(&mut document, table)?.delete(filter);

        if removed > 0 {
            self.save(&document)?;
        }
        Ok(removed > 0)
    }

    /// Empties a table and restarts its ids at 1
    pub fn truncate(&mut self, table: &str) -> Result<()> {
        let mut document = self.load()?;
        Self::table_mut(&mut document, table)?.truncate();
        self.save(&document)
    }

    pub fn count(&self, table: &str, filter: &Filter) -> Result<usize> {
        Ok(self.select(table, filter)?.len())
    }

    /// Drops the whole document and recreates the catalog tables
    pub fn reset(&mut self) -> Result<()> {
        info!("resetting database");
        self.store.remove(TABLES_KEY)?;
        self.initialize()
    }

    /// The full document, for inspection
    pub fn tables(&self) -> Result<Document> {
        self.load()
    }
}

fn not_found(table: &str) -> Error {
    error!("table {table} does not exist");
    Error::TableNotFound(table.to_string())
}

fn unique_violation(table: &str, field: String) -> Error {
    error!("{field} already exists in {table}");
    Error::UniqueViolation {
        table: table.to_string(),
        field,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::{FieldType, FileStore, MemoryStore};
    use serde_json::{json, Value};

    fn catalog() -> Vec<TableDef> {
        vec![
            TableDef::new(
                "usuarios",
                vec![
                    FieldDef::new("id", FieldType::Number).primary(),
                    FieldDef::new("email", FieldType::String).unique(),
                ],
            ),
            TableDef::new(
                "conversas",
                vec![
                    FieldDef::new("id", FieldType::Number).primary(),
                    FieldDef::new("usuarioId1", FieldType::Number),
                    FieldDef::new("usuarioId2", FieldType::Number),
                    FieldDef::new("naoLidas1", FieldType::Number),
                    FieldDef::new("naoLidas2", FieldType::Number),
                ],
            ),
            TableDef::new(
                "mensagens",
                vec![
                    FieldDef::new("id", FieldType::Number).primary(),
                    FieldDef::new("conversaId", FieldType::Number),
                    FieldDef::new("conteudo", FieldType::String),
                ],
            ),
        ]
    }

    fn db() -> Database<MemoryStore> {
        Database::open(MemoryStore::new(), catalog()).unwrap()
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn creates_catalog_tables() {
        let db = db();
        let tables = db.tables().unwrap();

        assert_eq!(
            tables.keys().collect::<Vec<_>>(),
            vec!["conversas", "mensagens", "usuarios"]
        );
        for table in tables.values() {
            assert!(table.rows().is_empty());
            assert_eq!(table.next_id(), 1);
        }
    }

    #[test]
    fn open_keeps_existing_tables() {
        let mut db = db();
        db.insert("usuarios", row(json!({"email": "a"}))).unwrap();

        let store = db.store().clone();
        let db = Database::open(store, catalog()).unwrap();
        assert_eq!(db.count("usuarios", &Filter::new()).unwrap(), 1);
    }

    #[test]
    fn create_table_overwrites() {
        let mut db = db();
        db.insert("usuarios", row(json!({"email": "a"}))).unwrap();

        db.create_table("usuarios", vec![]).unwrap();
        let table = db.get_table("usuarios").unwrap().unwrap();
        assert!(table.rows().is_empty());
        assert!(table.schema().is_empty());
        assert!(db.get_table("anuncios").unwrap().is_none());
    }

    #[test]
    fn unknown_table() {
        let mut db = db();
        let filter = Filter::new().eq("id", 1);

        assert!(matches!(
            db.insert("anuncios", Row::new()),
            Err(Error::TableNotFound(name)) if name == "anuncios"
        ));
        assert!(matches!(db.select("anuncios", &filter), Err(Error::TableNotFound(_))));
        assert!(matches!(db.select_one("anuncios", &filter), Err(Error::TableNotFound(_))));
        assert!(matches!(
            db.update("anuncios", &Row::new(), &filter),
            Err(Error::TableNotFound(_))
        ));
        assert!(matches!(db.delete("anuncios", &filter), Err(Error::TableNotFound(_))));
        assert!(matches!(db.truncate("anuncios"), Err(Error::TableNotFound(_))));
        assert!(matches!(db.count("anuncios", &filter), Err(Error::TableNotFound(_))));
    }

    #[test]
    fn duplicate_insert_leaves_count() {
        let mut db = db();
        db.insert("usuarios", row(json!({"email": "a@mail.com"}))).unwrap();

        let result = db.insert("usuarios", row(json!({"email": "a@mail.com"})));
        assert!(matches!(
            result,
            Err(Error::UniqueViolation { ref table, ref field }) if table == "usuarios" && field == "email"
        ));
        assert_eq!(db.count("usuarios", &Filter::new()).unwrap(), 1);

        let next = db.insert("usuarios", row(json!({"email": "b@mail.com"}))).unwrap();
        assert_eq!(next["id"], json!(2));
    }

    #[test]
    fn select_filters_conjunctively() {
        let mut db = db();
        for (c, text) in [(1, "a"), (2, "b"), (1, "c"), (1, "a")] {
            db.insert("mensagens", row(json!({"conversaId": c, "conteudo": text})))
                .unwrap();
        }

        let all = db.select("mensagens", &Filter::new()).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(
            all.iter().map(|r| r["id"].clone()).collect::<Vec<_>>(),
            vec![json!(1), json!(2), json!(3), json!(4)]
        );

        let first = db
            .select("mensagens", &Filter::new().eq("conversaId", 1))
            .unwrap();
        assert_eq!(first.len(), 3);

        let both = db
            .select(
                "mensagens",
                &Filter::new().eq("conversaId", 1).eq("conteudo", "a"),
            )
            .unwrap();
        assert_eq!(
            both.iter().map(|r| r["id"].clone()).collect::<Vec<_>>(),
            vec![json!(1), json!(4)]
        );

        let one = db
            .select_one("mensagens", &Filter::new().eq("conteudo", "c"))
            .unwrap()
            .unwrap();
        assert_eq!(one["id"], json!(3));
        assert!(db
            .select_one("mensagens", &Filter::new().eq("conteudo", "z"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn update_and_delete_report_matches() {
        let mut db = db();
        db.insert("mensagens", row(json!({"conversaId": 1, "conteudo": "a"})))
            .unwrap();
        db.insert("mensagens", row(json!({"conversaId": 2, "conteudo": "b"})))
            .unwrap();

        assert!(!db
            .update("mensagens", &row(json!({"conteudo": "x"})), &Filter::new().eq("id", 9))
            .unwrap());
        assert!(db
            .update("mensagens", &row(json!({"conteudo": "x"})), &Filter::new().eq("id", 2))
            .unwrap());
        assert_eq!(
            db.select_one("mensagens", &Filter::new().eq("id", 2))
                .unwrap()
                .unwrap(),
            row(json!({"id": 2, "conversaId": 2, "conteudo": "x"}))
        );

        // Regression: rows matching only one of the fields stay
        assert!(!db
            .delete("mensagens", &Filter::new().eq("conversaId", 1).eq("conteudo", "x"))
            .unwrap());
        assert_eq!(db.count("mensagens", &Filter::new()).unwrap(), 2);

        assert!(db
            .delete("mensagens", &Filter::new().eq("conversaId", 2).eq("conteudo", "x"))
            .unwrap());
        assert_eq!(db.count("mensagens", &Filter::new()).unwrap(), 1);
    }

    #[test]
    fn update_rejects_duplicate_unique_value() {
        let mut db = db();
        db.insert("usuarios", row(json!({"email": "a"}))).unwrap();
        db.insert("usuarios", row(json!({"email": "b"}))).unwrap();

        let result = db.update(
            "usuarios",
            &row(json!({"email": "a"})),
            &Filter::new().eq("id", 2),
        );
        assert!(matches!(result, Err(Error::UniqueViolation { .. })));
        assert_eq!(
            db.count("usuarios", &Filter::new().eq("email", "b")).unwrap(),
            1
        );
    }

    #[test]
    fn truncate_restarts_ids() {
        let mut db = db();
        db.insert("usuarios", row(json!({"email": "a"}))).unwrap();
        db.insert("usuarios", row(json!({"email": "b"}))).unwrap();

        db.truncate("usuarios").unwrap();
        assert_eq!(db.count("usuarios", &Filter::new()).unwrap(), 0);

        let inserted = db.insert("usuarios", row(json!({"email": "c"}))).unwrap();
        assert_eq!(inserted["id"], json!(1));
    }

    #[test]
    fn reset_recreates_catalog() {
        let mut db = db();
        db.insert("usuarios", row(json!({"email": "a"}))).unwrap();
        db.insert("mensagens", row(json!({"conteudo": "oi"}))).unwrap();
        db.create_table("extra", vec![]).unwrap();

        db.reset().unwrap();

        let tables = db.tables().unwrap();
        assert_eq!(tables.len(), catalog().len());
        assert!(!tables.contains_key("extra"));
        for table in tables.values() {
            assert!(table.rows().is_empty());
            assert_eq!(table.next_id(), 1);
        }
    }

    #[test]
    fn document_layout() {
        let mut db = db();
        db.insert("usuarios", row(json!({"email": "a"}))).unwrap();

        let stored: Value =
            serde_json::from_str(&db.store().get(TABLES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            stored["usuarios"],
            json!({
                "schema": [
                    {"name": "id", "type": "number", "primary": true},
                    {"name": "email", "type": "string", "unique": true}
                ],
                "data": [{"email": "a", "id": 1}],
                "nextId": 2
            })
        );
    }

    #[test]
    fn persists_through_file_store() {
        let dir = assert_fs::TempDir::new().unwrap();

        let mut db = Database::open(FileStore::open(dir.path()).unwrap(), catalog()).unwrap();
        db.insert("usuarios", row(json!({"email": "a"}))).unwrap();
        db.insert("usuarios", row(json!({"email": "b"}))).unwrap();
        drop(db);

        let mut db = Database::open(FileStore::open(dir.path()).unwrap(), catalog()).unwrap();
        assert_eq!(db.count("usuarios", &Filter::new()).unwrap(), 2);
        let inserted = db.insert("usuarios", row(json!({"email": "c"}))).unwrap();
        assert_eq!(inserted["id"], json!(3));
    }

    #[test]
    fn conversation_scenario() {
        let mut db = db();
        let a = db.insert("usuarios", row(json!({"email": "a"}))).unwrap();
        let b = db.insert("usuarios", row(json!({"email": "b"}))).unwrap();
        assert_eq!((a["id"].clone(), b["id"].clone()), (json!(1), json!(2)));

        let conversation = db
            .insert(
                "conversas",
                row(json!({"usuarioId1": 1, "usuarioId2": 2, "naoLidas1": 2, "naoLidas2": 3})),
            )
            .unwrap();
        let id = conversation["id"].clone();
        for text in ["oi", "tudo bem?"] {
            db.insert("mensagens", row(json!({"conversaId": id.clone(), "conteudo": text})))
                .unwrap();
        }

        let messages = db
            .select("mensagens", &Filter::new().eq("conversaId", id.clone()))
            .unwrap();
        assert_eq!(
            messages
                .iter()
                .map(|m| m["conteudo"].as_str().unwrap())
                .collect::<Vec<_>>(),
            vec!["oi", "tudo bem?"]
        );

        // User 2 reads the conversation
        db.update(
            "conversas",
            &row(json!({"naoLidas2": 0})),
            &Filter::new().eq("id", id.clone()),
        )
        .unwrap();
        let conversation = db
            .select_one("conversas", &Filter::new().eq("id", id))
            .unwrap()
            .unwrap();
        assert_eq!(conversation["naoLidas1"], json!(2));
        assert_eq!(conversation["naoLidas2"], json!(0));
    }
}
