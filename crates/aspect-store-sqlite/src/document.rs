//! [`SqliteDocumentStore`] — the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use aspect_core::{
  StoreError,
  index::IndexSpec,
  store::{Document, DocumentStore},
};

use crate::{
  Result,
  encode::{check_name, create_collection_sql, create_index_sql, decode_document, find_sql},
  schema::DOCUMENT_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document database backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Once
/// [`close`](Self::close) has run, every clone fails with
/// [`StoreError::Unavailable`].
#[derive(Clone)]
pub struct SqliteDocumentStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDocumentStore {
  /// Open (or create) a document database at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory database — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DOCUMENT_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Shut the connection down for every clone of this handle.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<()> {
    let table_sql = create_collection_sql(collection)?;
    let index_sql = create_index_sql(collection, index)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(&table_sql, [])?;
        tx.execute(&index_sql, [])?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn index_names(&self, collection: &str) -> Result<Vec<String>> {
    let collection = check_name(collection)?.to_owned();

    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM sqlite_master
           WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL
           ORDER BY name",
        )?;
        let names = stmt
          .query_map(rusqlite::params![collection], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn insert_document(&self, collection: &str, document: &Document) -> Result<()> {
    let table_sql = create_collection_sql(collection)?;
    let insert_sql = format!("INSERT INTO \"{collection}\" (body) VALUES (?1)");
    let body = serde_json::to_string(document)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(&table_sql, [])?;
        conn.execute(&insert_sql, rusqlite::params![body])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_documents(&self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
    let (sql, params) = find_sql(collection, filter)?;
    let collection = collection.to_owned();

    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?
          .exists(rusqlite::params![collection])?;
        if !exists {
          return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(&sql)?;
        let bodies = stmt
          .query_map(rusqlite::params_from_iter(params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(bodies)
      })
      .await?;

    bodies.iter().map(|b| decode_document(b)).collect()
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteDocumentStore {
  async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> Result<(), StoreError> {
    Ok(self.create_index(collection, index).await?)
  }

  async fn list_indexes(&self, collection: &str) -> Result<Vec<String>, StoreError> {
    Ok(self.index_names(collection).await?)
  }

  async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
    Ok(self.insert_document(collection, &document).await?)
  }

  async fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>, StoreError> {
    Ok(self.find_documents(collection, filter).await?)
  }
}
