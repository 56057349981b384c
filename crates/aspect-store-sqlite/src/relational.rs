//! [`SqliteRelationalStore`] — the relational system of record.
//!
//! Holds the `alf_qname` dictionary that tag handles point into and the
//! `alf_node_aspects` association table that dual-write mirrors into.

use std::path::Path;

use aspect_core::{
  StoreError,
  qname::QNameRegistry,
  record::{NodeId, QName, TagId},
  store::AspectMirror,
};

use crate::{Result, schema::RELATIONAL_SCHEMA};

/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteRelationalStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteRelationalStore {
  /// Open (or create) the relational store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
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
        conn.execute_batch(RELATIONAL_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Return the handle for `qname`, creating the row on first use.
  pub async fn intern_qname(&self, qname: &QName) -> Result<TagId> {
    let qname = qname.as_str().to_owned();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO alf_qname (qname) VALUES (?1)",
          rusqlite::params![qname],
        )?;
        let id: i64 = conn.query_row(
          "SELECT id FROM alf_qname WHERE qname = ?1",
          rusqlite::params![qname],
          |r| r.get(0),
        )?;
        Ok(id)
      })
      .await?;
    Ok(TagId(id))
  }

  /// Every registered qualified name, by handle.
  pub async fn load_qnames(&self) -> Result<Vec<(TagId, QName)>> {
    let rows: Vec<(i64, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, qname FROM alf_qname ORDER BY id")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().map(|(id, q)| (TagId(id), QName::from(q))).collect())
  }

  /// Fill `registry` with every stored name. Returns how many were loaded.
  pub async fn load_into(&self, registry: &QNameRegistry) -> Result<usize> {
    let qnames = self.load_qnames().await?;
    let count = qnames.len();
    for (id, qname) in qnames {
      registry.register(id, qname);
    }
    tracing::debug!(count, "loaded qualified names");
    Ok(count)
  }

  /// Tag handles associated with `node_id`, in ascending order.
  pub async fn node_aspects(&self, node_id: NodeId) -> Result<Vec<TagId>> {
    let ids: Vec<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT qname_id FROM alf_node_aspects WHERE node_id = ?1 ORDER BY qname_id",
        )?;
        let ids = stmt
          .query_map(rusqlite::params![node_id.0], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
      })
      .await?;

    Ok(ids.into_iter().map(TagId).collect())
  }

  async fn insert_node_aspect(&self, node_id: NodeId, tag_id: TagId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alf_node_aspects (node_id, qname_id) VALUES (?1, ?2)",
          rusqlite::params![node_id.0, tag_id.0],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl AspectMirror for SqliteRelationalStore {
  async fn insert_association(&self, node_id: NodeId, tag_id: TagId) -> Result<(), StoreError> {
    Ok(self.insert_node_aspect(node_id, tag_id).await?)
  }
}
