//! Transaction context implementations.

use std::sync::{
  Mutex, PoisonError,
  atomic::{AtomicI64, Ordering},
};

use crate::{record::TxnId, store::TransactionContext};

/// Hands out monotonically increasing transaction ids, one per write batch.
#[derive(Debug, Default)]
pub struct TransactionCounter {
  last:   AtomicI64,
  active: Mutex<Option<TxnId>>,
}

impl TransactionCounter {
  pub fn new() -> Self { Self::default() }

  /// Continue numbering after `last`, e.g. the highest id already persisted.
  pub fn starting_after(last: TxnId) -> Self {
    Self { last: AtomicI64::new(last.0), active: Mutex::new(None) }
  }

  /// Start a new transaction, replacing any active one.
  pub fn begin(&self) -> TxnId {
    let id = TxnId(self.last.fetch_add(1, Ordering::SeqCst) + 1);
    *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    id
  }

  /// End the active transaction, returning its id.
  pub fn commit(&self) -> Option<TxnId> {
    self.active.lock().unwrap_or_else(PoisonError::into_inner).take()
  }
}

impl TransactionContext for TransactionCounter {
  fn current_transaction_id(&self, create_if_absent: bool) -> Option<TxnId> {
    let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
    if active.is_none() && create_if_absent {
      *active = Some(TxnId(self.last.fetch_add(1, Ordering::SeqCst) + 1));
    }
    *active
  }
}

/// A context pinned to one caller-supplied transaction.
#[derive(Debug, Clone, Copy)]
pub struct FixedTransaction(pub TxnId);

impl TransactionContext for FixedTransaction {
  fn current_transaction_id(&self, _create_if_absent: bool) -> Option<TxnId> { Some(self.0) }
}
