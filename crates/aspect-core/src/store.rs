//! Capability traits supplied by the host environment.
//!
//! Storage backends (e.g. `aspect-store-sqlite`) implement [`DocumentStore`]
//! and [`AspectMirror`]. The writers in [`crate::writer`] depend on these
//! abstractions, never on a concrete backend.

use std::future::Future;

use crate::{
  error::StoreError,
  index::IndexSpec,
  record::{NodeId, QName, TagId, TxnId},
};

/// A schemaless document: top-level field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

// ─── Primary store ───────────────────────────────────────────────────────────

/// The document store acting as durability authority.
///
/// Handles are shared across concurrent callers; implementations must accept
/// `insert` calls from many tasks at once.
pub trait DocumentStore: Send + Sync {
  /// Create `index` on `collection` unless an index of that name exists.
  fn ensure_index<'a>(
    &'a self,
    collection: &'a str,
    index: &'a IndexSpec,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a;

  /// Names of the indexes defined on `collection`.
  fn list_indexes<'a>(
    &'a self,
    collection: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send + 'a;

  /// Insert one document. Unique index violations are reported as
  /// [`StoreError::DuplicateKey`]; nothing is written in that case.
  fn insert<'a>(
    &'a self,
    collection: &'a str,
    document: Document,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a;

  /// Documents whose top-level fields equal every entry of `filter`.
  fn find<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Document,
  ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send + 'a;
}

// ─── Secondary store ─────────────────────────────────────────────────────────

/// The relational system of record, mirrored on a best-effort basis.
pub trait AspectMirror: Send + Sync {
  fn insert_association(
    &self,
    node_id: NodeId,
    tag_id: TagId,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + '_;
}

// ─── Environment ─────────────────────────────────────────────────────────────

/// Resolves a tag handle to its canonical qualified name.
pub trait TagResolver: Send + Sync {
  /// `None` only for handles that were never registered.
  fn resolve(&self, tag_id: TagId) -> Option<QName>;
}

/// Supplies the id of the logical transaction a write belongs to.
pub trait TransactionContext: Send + Sync {
  /// With `create_if_absent`, starts a transaction when none is active.
  fn current_transaction_id(&self, create_if_absent: bool) -> Option<TxnId>;
}

impl<T: TagResolver> TagResolver for std::sync::Arc<T> {
  fn resolve(&self, tag_id: TagId) -> Option<QName> { (**self).resolve(tag_id) }
}

impl<T: TransactionContext> TransactionContext for std::sync::Arc<T> {
  fn current_transaction_id(&self, create_if_absent: bool) -> Option<TxnId> {
    (**self).current_transaction_id(create_if_absent)
  }
}

impl<T: DocumentStore> DocumentStore for std::sync::Arc<T> {
  fn ensure_index<'a>(
    &'a self,
    collection: &'a str,
    index: &'a IndexSpec,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a {
    (**self).ensure_index(collection, index)
  }

  fn list_indexes<'a>(
    &'a self,
    collection: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send + 'a {
    (**self).list_indexes(collection)
  }

  fn insert<'a>(
    &'a self,
    collection: &'a str,
    document: Document,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a {
    (**self).insert(collection, document)
  }

  fn find<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Document,
  ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send + 'a {
    (**self).find(collection, filter)
  }
}

impl<T: AspectMirror> AspectMirror for std::sync::Arc<T> {
  fn insert_association(
    &self,
    node_id: NodeId,
    tag_id: TagId,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + '_ {
    (**self).insert_association(node_id, tag_id)
  }
}
