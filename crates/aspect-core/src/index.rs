//! Index definitions for the aspect collection and their bootstrap.

use crate::{
  error::StoreError,
  record::{COLLECTION_ASPECTS, FIELD_NODE_ID, FIELD_QNAME, FIELD_TXN_ID},
  store::DocumentStore,
};

/// A named compound index over top-level document fields, all ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
  pub name:   &'static str,
  pub fields: &'static [&'static str],
  pub unique: bool,
}

/// A node carries each aspect at most once.
pub const ASPECTS_NODE_QNAME: IndexSpec = IndexSpec {
  name:   "ASPECTS_NODE_QNAME",
  fields: &[FIELD_NODE_ID, FIELD_QNAME],
  unique: true,
};

/// Transaction-scoped lookups and replay.
pub const ASPECTS_NODE_TXN_QNAME: IndexSpec = IndexSpec {
  name:   "ASPECTS_NODE_TXN_QNAME",
  fields: &[FIELD_NODE_ID, FIELD_TXN_ID, FIELD_QNAME],
  unique: false,
};

pub const ASPECT_INDEXES: [IndexSpec; 2] = [ASPECTS_NODE_QNAME, ASPECTS_NODE_TXN_QNAME];

/// Ensure every index in [`ASPECT_INDEXES`] exists. Safe to call on every
/// startup.
pub async fn bootstrap_indexes<D: DocumentStore>(store: &D) -> Result<(), StoreError> {
  for index in &ASPECT_INDEXES {
    store.ensure_index(COLLECTION_ASPECTS, index).await?;
    tracing::debug!(
      collection = COLLECTION_ASPECTS,
      index = index.name,
      unique = index.unique,
      "ensured index"
    );
  }
  Ok(())
}
