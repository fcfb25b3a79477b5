//! redb-based local reference cache
//!
//! One table per collection, key = document id, value = JSON. Reads are
//! served entirely offline.

mod count;
mod route;
mod user;

pub use count::CountStore;
pub use route::RouteCache;
pub use user::UserCache;

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::AppError;
use shared::models::{CollectionKind, Count, Route, User};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Routes table: key = route id, value = JSON
const ROUTES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("routes");

/// Users table: key = username, value = JSON
const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Daily counters table: key = counter key, value = JSON
const COUNTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("counts");

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::storage(format!("Reference cache: {err}"))
    }
}

/// Cached collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Routes,
    Users,
    Counts,
}

impl Collection {
    fn table(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
        match self {
            Self::Routes => ROUTES_TABLE,
            Self::Users => USERS_TABLE,
            Self::Counts => COUNTS_TABLE,
        }
    }
}

impl From<CollectionKind> for Collection {
    fn from(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::Routes => Self::Routes,
            CollectionKind::Users => Self::Users,
        }
    }
}

/// A JSON document stored under its own key
pub trait Document: Serialize + DeserializeOwned {
    fn key(&self) -> &str;
}

impl Document for Route {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Document for User {
    fn key(&self) -> &str {
        &self.username
    }
}

impl Document for Count {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Local document store for reference data
#[derive(Clone)]
pub struct ReferenceCache {
    db: Arc<Database>,
}

impl ReferenceCache {
    /// Open or create the cache file
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open a throwaway in-memory cache
    pub fn open_in_memory() -> CacheResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> CacheResult<Self> {
        // Create every collection up front
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ROUTES_TABLE)?;
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(COUNTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn routes(&self) -> RouteCache {
        RouteCache::new(self.clone())
    }

    pub fn users(&self) -> UserCache {
        UserCache::new(self.clone())
    }

    pub fn counts(&self) -> CountStore {
        CountStore::new(self.clone())
    }

    /// Insert or overwrite one document
    pub fn insert_one<T: Document>(&self, collection: Collection, doc: &T) -> CacheResult<()> {
        self.insert_many(collection, std::slice::from_ref(doc))
    }

    /// Insert or overwrite several documents in one transaction
    pub fn insert_many<T: Document>(&self, collection: Collection, docs: &[T]) -> CacheResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(collection.table())?;
            for doc in docs {
                let value = serde_json::to_vec(doc)?;
                table.insert(doc.key(), value.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All documents, in key order
    pub fn find_all<T: Document>(&self, collection: Collection) -> CacheResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(collection.table())?;

        let mut docs = Vec::with_capacity(table.len()? as usize);
        for result in table.iter()? {
            let (_, guard) = result?;
            docs.push(serde_json::from_slice(guard.value())?);
        }
        Ok(docs)
    }

    /// Look a document up by key
    pub fn get<T: Document>(&self, collection: Collection, key: &str) -> CacheResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(collection.table())?;

        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// First document (in key order) matching the predicate
    pub fn find_first<T, F>(&self, collection: Collection, pred: F) -> CacheResult<Option<T>>
    where
        T: Document,
        F: Fn(&T) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(collection.table())?;

        for result in table.iter()? {
            let (_, guard) = result?;
            let doc: T = serde_json::from_slice(guard.value())?;
            if pred(&doc) {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    /// Delete every document matching the predicate, returning how many went
    pub fn delete_where<T, F>(&self, collection: Collection, pred: F) -> CacheResult<usize>
    where
        T: Document,
        F: Fn(&T) -> bool,
    {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(collection.table())?;

            let mut doomed = Vec::new();
            for result in table.iter()? {
                let (key, guard) = result?;
                let doc: T = serde_json::from_slice(guard.value())?;
                if pred(&doc) {
                    doomed.push(key.value().to_string());
                }
            }
            for key in &doomed {
                table.remove(key.as_str())?;
            }
            doomed.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Clear the collection and load `docs` in a single write transaction.
    ///
    /// Readers see either the previous set or the new one, never a blend and
    /// never the empty gap in between.
    pub fn replace_all<T: Document>(&self, collection: Collection, docs: &[T]) -> CacheResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(collection.table())?;
            table.retain(|_, _| false)?;
            for doc in docs {
                let value = serde_json::to_vec(doc)?;
                table.insert(doc.key(), value.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: Collection) -> CacheResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(collection.table())?;
        Ok(table.len()?)
    }
}
