//! Error types for `aspect-core`.

use thiserror::Error;

use crate::record::{NodeId, QName, TagId, TxnId};

/// A failure reported by a store capability.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The handle is closed or the transport failed.
  #[error("store unavailable: {0}")]
  Unavailable(String),

  /// A unique index rejected the write.
  #[error("duplicate key for index {index}")]
  DuplicateKey { index: String },

  #[error("write rejected: {0}")]
  Rejected(String),

  /// A stored document could not be decoded.
  #[error("malformed document: {0}")]
  Malformed(String),
}

/// Failure of [`record_association`](crate::writer::DualWriteAspectStore::record_association).
#[derive(Debug, Error)]
pub enum Error {
  /// The primary store refused the write. Most often the node already carries
  /// the aspect; sub-causes are kept in `source`.
  #[error(
    "failed to insert aspect: {source}\n   Node ID:    {node_id}\n   QName:      {qname}\n   Txn ID:     {txn_id}"
  )]
  ConcurrencyConflict {
    node_id: NodeId,
    qname:   QName,
    txn_id:  TxnId,
    #[source]
    source:  StoreError,
  },

  #[error("primary store connection failure: {0}")]
  ConnectionFailure(#[source] StoreError),

  /// The primary write committed but the mirrored write did not.
  #[error("secondary write of tag {tag_id} on node {node_id} failed: {source}")]
  SecondaryWriteFailure {
    node_id: NodeId,
    tag_id:  TagId,
    #[source]
    source:  StoreError,
  },

  #[error("no qualified name registered for tag {0}")]
  UnknownTag(TagId),

  #[error("no transaction available")]
  NoTransaction,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
