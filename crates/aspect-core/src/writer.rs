//! The aspect write path.
//!
//! Writes go to the primary document store first. Only when that succeeds,
//! and only when dual-write is enabled, is the association mirrored to the
//! relational store. A mirror failure is returned to the caller as
//! [`Error::SecondaryWriteFailure`] and the primary write stays in place;
//! nothing here retries or compensates.

use std::future::Future;

use crate::{
  error::{Error, Result, StoreError},
  record::{AspectRecord, COLLECTION_ASPECTS, FIELD_NODE_ID, NodeId, TagId},
  store::{AspectMirror, Document, DocumentStore, TagResolver, TransactionContext},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// The "insert node aspect" capability.
pub trait AspectWriter: Send + Sync {
  /// Associate `tag_id` with `node_id` under the transaction `txn` supplies.
  fn insert_node_aspect<'a, C: TransactionContext>(
    &'a self,
    node_id: NodeId,
    tag_id: TagId,
    txn: &'a C,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

// ─── Primary ─────────────────────────────────────────────────────────────────

/// Writes associations to the document store only.
pub struct PrimaryAspectWriter<D, R> {
  documents: D,
  resolver:  R,
}

impl<D, R> PrimaryAspectWriter<D, R>
where
  D: DocumentStore,
  R: TagResolver,
{
  pub fn new(documents: D, resolver: R) -> Self { Self { documents, resolver } }

  /// All associations recorded for `node_id`.
  pub async fn aspects_of(&self, node_id: NodeId) -> Result<Vec<AspectRecord>, StoreError> {
    let mut filter = Document::new();
    filter.insert(FIELD_NODE_ID.to_owned(), node_id.0.into());

    self
      .documents
      .find(COLLECTION_ASPECTS, &filter)
      .await?
      .into_iter()
      .map(|doc| AspectRecord::from_document(doc).map_err(|e| StoreError::Malformed(e.to_string())))
      .collect()
  }
}

impl<D, R> AspectWriter for PrimaryAspectWriter<D, R>
where
  D: DocumentStore,
  R: TagResolver,
{
  fn insert_node_aspect<'a, C: TransactionContext>(
    &'a self,
    node_id: NodeId,
    tag_id: TagId,
    txn: &'a C,
  ) -> impl Future<Output = Result<()>> + Send + 'a {
    async move {
      let txn_id = txn.current_transaction_id(true).ok_or(Error::NoTransaction)?;
      let qname = self.resolver.resolve(tag_id).ok_or(Error::UnknownTag(tag_id))?;

      let record = AspectRecord { node_id, txn_id, qname };
      match self.documents.insert(COLLECTION_ASPECTS, record.to_document()).await {
        Ok(()) => {
          tracing::debug!(%node_id, qname = %record.qname, %txn_id, "inserted aspect");
          Ok(())
        }
        Err(source @ StoreError::Unavailable(_)) => Err(Error::ConnectionFailure(source)),
        Err(source) => Err(Error::ConcurrencyConflict {
          node_id,
          qname: record.qname,
          txn_id,
          source,
        }),
      }
    }
  }
}

// ─── Dual write ──────────────────────────────────────────────────────────────

/// Wraps a primary writer and mirrors each successful write.
pub struct DualWriteAspectWriter<W, M> {
  primary: W,
  mirror:  M,
}

impl<W, M> DualWriteAspectWriter<W, M> {
  pub fn new(primary: W, mirror: M) -> Self { Self { primary, mirror } }

  pub fn primary(&self) -> &W { &self.primary }
}

impl<W, M> AspectWriter for DualWriteAspectWriter<W, M>
where
  W: AspectWriter,
  M: AspectMirror,
{
  fn insert_node_aspect<'a, C: TransactionContext>(
    &'a self,
    node_id: NodeId,
    tag_id: TagId,
    txn: &'a C,
  ) -> impl Future<Output = Result<()>> + Send + 'a {
    async move {
      self.primary.insert_node_aspect(node_id, tag_id, txn).await?;
      self
        .mirror
        .insert_association(node_id, tag_id)
        .await
        .map_err(|source| Error::SecondaryWriteFailure { node_id, tag_id, source })
    }
  }
}

// ─── Configured store ────────────────────────────────────────────────────────

enum Mode<D, R, M> {
  PrimaryOnly(PrimaryAspectWriter<D, R>),
  DualWrite(DualWriteAspectWriter<PrimaryAspectWriter<D, R>, M>),
}

/// The aspect store as the host environment sees it: a primary writer,
/// optionally wrapped for dual-write, chosen once at construction.
pub struct DualWriteAspectStore<D, R, M> {
  mode: Mode<D, R, M>,
}

impl<D, R, M> DualWriteAspectStore<D, R, M>
where
  D: DocumentStore,
  R: TagResolver,
  M: AspectMirror,
{
  /// With `dual_write_enabled` false the mirror is dropped and never called.
  pub fn new(dual_write_enabled: bool, documents: D, resolver: R, mirror: M) -> Self {
    let primary = PrimaryAspectWriter::new(documents, resolver);
    let mode = if dual_write_enabled {
      Mode::DualWrite(DualWriteAspectWriter::new(primary, mirror))
    } else {
      Mode::PrimaryOnly(primary)
    };
    Self { mode }
  }

  pub fn dual_write_enabled(&self) -> bool { matches!(self.mode, Mode::DualWrite(_)) }

  fn primary(&self) -> &PrimaryAspectWriter<D, R> {
    match &self.mode {
      Mode::PrimaryOnly(w) => w,
      Mode::DualWrite(w) => w.primary(),
    }
  }

  /// Record that `node_id` carries the aspect named by `tag_id`.
  ///
  /// Performs exactly one primary insert and, on success with dual-write
  /// enabled, exactly one secondary insert.
  pub async fn record_association<C: TransactionContext>(
    &self,
    node_id: NodeId,
    tag_id: TagId,
    txn: &C,
  ) -> Result<()> {
    self.insert_node_aspect(node_id, tag_id, txn).await
  }

  /// Associations held by the primary store for `node_id`.
  pub async fn aspects_of(&self, node_id: NodeId) -> Result<Vec<AspectRecord>, StoreError> {
    self.primary().aspects_of(node_id).await
  }
}

impl<D, R, M> AspectWriter for DualWriteAspectStore<D, R, M>
where
  D: DocumentStore,
  R: TagResolver,
  M: AspectMirror,
{
  fn insert_node_aspect<'a, C: TransactionContext>(
    &'a self,
    node_id: NodeId,
    tag_id: TagId,
    txn: &'a C,
  ) -> impl Future<Output = Result<()>> + Send + 'a {
    async move {
      match &self.mode {
        Mode::PrimaryOnly(w) => w.insert_node_aspect(node_id, tag_id, txn).await,
        Mode::DualWrite(w) => w.insert_node_aspect(node_id, tag_id, txn).await,
      }
    }
  }
}
