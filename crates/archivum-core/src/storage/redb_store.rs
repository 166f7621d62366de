//! Redb-backed index store.
//!
//! Uses [redb](https://github.com/cberner/redb) - a pure Rust, ACID-compliant,
//! embedded B-tree database.
//!
//! # Tables
//!
//! - `fulltext`: DocId (u64) -> text (UTF-8)
//! - `vectors`: DocId (u64) -> `Vec<f32>` (raw bytes, native byte order)

use super::{IndexStore, StoreError};
use crate::index::DocId;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const FULLTEXT_TABLE: TableDefinition<u64, &str> = TableDefinition::new("fulltext");
const VECTORS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("vectors");

fn db_err<E: std::fmt::Display>(context: &str) -> impl Fn(E) -> StoreError + '_ {
    move |e| StoreError::DatabaseError(format!("{}: {}", context, e))
}

/// Durable index store in a single redb file.
///
/// # Example
///
/// ```ignore
/// use archivum_core::storage::RedbIndexStore;
///
/// let store = RedbIndexStore::open("./data/semantic_index.redb")?;
/// store.upsert(DocId::from_u64(1), "Invoice from Acme Corp", &blob).await?;
/// ```
pub struct RedbIndexStore {
    db: Arc<Database>,
}

impl RedbIndexStore {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates both tables if they don't exist. Calling this on an existing
    /// index leaves its contents untouched.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref())
            .map_err(|e| StoreError::IoError(format!("Failed to open database: {}", e)))?;

        let write_txn = db
            .begin_write()
            .map_err(db_err("Failed to begin write transaction"))?;
        write_txn
            .open_table(FULLTEXT_TABLE)
            .map_err(db_err("Failed to create fulltext table"))?;
        write_txn
            .open_table(VECTORS_TABLE)
            .map_err(db_err("Failed to create vectors table"))?;
        write_txn
            .commit()
            .map_err(db_err("Failed to commit table creation"))?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait::async_trait]
impl IndexStore for RedbIndexStore {
    async fn upsert(&self, id: DocId, text: &str, vector: &[u8]) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(db_err("Failed to begin write transaction"))?;

        // Both inserts share one transaction; dropping it without commit aborts both.
        {
            let mut fulltext = write_txn
                .open_table(FULLTEXT_TABLE)
                .map_err(db_err("Failed to open fulltext table"))?;
            fulltext
                .insert(id.as_u64(), text)
                .map_err(db_err("Failed to insert text"))?;

            let mut vectors = write_txn
                .open_table(VECTORS_TABLE)
                .map_err(db_err("Failed to open vectors table"))?;
            vectors
                .insert(id.as_u64(), vector)
                .map_err(db_err("Failed to insert vector"))?;
        }

        write_txn
            .commit()
            .map_err(db_err("Failed to commit document"))?;
        Ok(())
    }

    async fn get_text(&self, id: DocId) -> Result<Option<String>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(db_err("Failed to begin read transaction"))?;
        let table = read_txn
            .open_table(FULLTEXT_TABLE)
            .map_err(db_err("Failed to open fulltext table"))?;

        let text = table
            .get(id.as_u64())
            .map_err(db_err("Failed to get text"))?
            .map(|guard| guard.value().to_string());
        Ok(text)
    }

    async fn load_all_vectors(&self) -> Result<Vec<(DocId, Vec<u8>)>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(db_err("Failed to begin read transaction"))?;
        let table = read_txn
            .open_table(VECTORS_TABLE)
            .map_err(db_err("Failed to open vectors table"))?;

        let mut vectors = Vec::new();
        let iter = table
            .iter()
            .map_err(db_err("Failed to iterate vectors"))?;
        for entry in iter {
            let (key, value) = entry.map_err(db_err("Failed to read vector entry"))?;
            vectors.push((DocId::from_u64(key.value()), value.value().to_vec()));
        }
        Ok(vectors)
    }

    async fn document_count(&self) -> Result<usize, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(db_err("Failed to begin read transaction"))?;
        let table = read_txn
            .open_table(VECTORS_TABLE)
            .map_err(db_err("Failed to open vectors table"))?;
        let count = table
            .len()
            .map_err(db_err("Failed to count vectors"))?;
        Ok(count as usize)
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(db_err("Failed to begin write transaction"))?;

        // Drop and recreate inside one transaction so a failed clear leaves
        // the previous contents intact.
        write_txn
            .delete_table(FULLTEXT_TABLE)
            .map_err(db_err("Failed to delete fulltext table"))?;
        write_txn
            .delete_table(VECTORS_TABLE)
            .map_err(db_err("Failed to delete vectors table"))?;
        write_txn
            .open_table(FULLTEXT_TABLE)
            .map_err(db_err("Failed to recreate fulltext table"))?;
        write_txn
            .open_table(VECTORS_TABLE)
            .map_err(db_err("Failed to recreate vectors table"))?;

        write_txn
            .commit()
            .map_err(db_err("Failed to commit clear"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{decode_vector, encode_vector};
    use tempfile::TempDir;

    fn create_test_store() -> (RedbIndexStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.redb");
        let store = RedbIndexStore::open(&db_path).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_upsert_and_get_text() {
        let (store, _temp) = create_test_store();
        let id = DocId::from_u64(1);

        assert!(store.get_text(id).await.unwrap().is_none());

        store
            .upsert(id, "Invoice from Acme Corp", &encode_vector(&[1.0, 0.0]))
            .await
            .unwrap();
        assert_eq!(
            store.get_text(id).await.unwrap().as_deref(),
            Some("Invoice from Acme Corp")
        );

        store
            .upsert(id, "Credit note", &encode_vector(&[0.0, 1.0]))
            .await
            .unwrap();
        assert_eq!(store.get_text(id).await.unwrap().as_deref(), Some("Credit note"));
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_all_vectors_in_id_order() {
        let (store, _temp) = create_test_store();
        for id in [3u64, 1, 2] {
            store
                .upsert(DocId::from_u64(id), "doc", &encode_vector(&[id as f32]))
                .await
                .unwrap();
        }

        let all = store.load_all_vectors().await.unwrap();
        let ids: Vec<u64> = all.iter().map(|(id, _)| id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(decode_vector(&all[2].1).unwrap(), vec![3.0]);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (store, _temp) = create_test_store();
        store
            .upsert(DocId::from_u64(7), "to be cleared", &encode_vector(&[1.0]))
            .await
            .unwrap();

        store.clear_all().await.unwrap();

        assert_eq!(store.document_count().await.unwrap(), 0);
        assert!(store.load_all_vectors().await.unwrap().is_empty());
        assert!(store.get_text(DocId::from_u64(7)).await.unwrap().is_none());

        // Store stays usable after a clear
        store
            .upsert(DocId::from_u64(8), "after clear", &encode_vector(&[1.0]))
            .await
            .unwrap();
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persistence_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("persist.redb");
        let blob = encode_vector(&[0.6, 0.8, 0.0]);

        {
            let store = RedbIndexStore::open(&db_path).unwrap();
            store
                .upsert(DocId::from_u64(42), "Persisted", &blob)
                .await
                .unwrap();
        }

        {
            let store = RedbIndexStore::open(&db_path).unwrap();
            let all = store.load_all_vectors().await.unwrap();
            assert_eq!(all, vec![(DocId::from_u64(42), blob.clone())]);
            assert_eq!(
                store.get_text(DocId::from_u64(42)).await.unwrap().as_deref(),
                Some("Persisted")
            );
        }
    }
}
