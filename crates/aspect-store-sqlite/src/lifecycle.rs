//! Explicit startup and shutdown of the primary store connection.
//!
//! The host calls [`ConnectionLifecycleManager::open`] from its startup
//! sequence and [`ConnectionLifecycleManager::close`] from its shutdown
//! sequence. A handle returned by `open` is connected and has every aspect
//! index in place.

use std::path::Path;

use aspect_core::index::bootstrap_indexes;

use crate::{Error, Result, SqliteDocumentStore};

/// Owns the primary store handle between `open` and `close`.
#[derive(Default)]
pub struct ConnectionLifecycleManager {
  store: Option<SqliteDocumentStore>,
}

impl ConnectionLifecycleManager {
  pub fn new() -> Self { Self::default() }

  /// Connect to the document database at `path` and bootstrap its indexes.
  ///
  /// An existing connection is shut down first; failing to do so cleanly is
  /// logged and otherwise ignored. Failing to connect is returned.
  pub async fn open(&mut self, path: impl AsRef<Path>) -> Result<SqliteDocumentStore> {
    self.close().await;
    let path = path.as_ref();
    let store = SqliteDocumentStore::open(path).await?;
    tracing::info!(path = %path.display(), "created document store connection");
    self.install(store).await
  }

  /// As [`open`](Self::open), against a fresh in-memory database.
  pub async fn open_in_memory(&mut self) -> Result<SqliteDocumentStore> {
    self.close().await;
    let store = SqliteDocumentStore::open_in_memory().await?;
    tracing::info!("created in-memory document store connection");
    self.install(store).await
  }

  async fn install(&mut self, store: SqliteDocumentStore) -> Result<SqliteDocumentStore> {
    bootstrap_indexes(&store).await.map_err(Error::Bootstrap)?;
    self.store = Some(store.clone());
    Ok(store)
  }

  /// The open handle, if any.
  pub fn handle(&self) -> Option<&SqliteDocumentStore> { self.store.as_ref() }

  pub fn is_open(&self) -> bool { self.store.is_some() }

  /// Shut the connection down. Handles given out by `open` become
  /// unavailable. Does nothing when no connection is open.
  pub async fn close(&mut self) {
    let Some(store) = self.store.take() else {
      return;
    };
    tracing::info!("shutting down document store connection");
    if let Err(e) = store.close().await {
      tracing::error!(error = %e, "failed to shut document store connection cleanly");
    }
  }
}
