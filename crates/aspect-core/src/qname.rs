//! In-process cache of tag handles and their qualified names.

use std::{
  collections::HashMap,
  sync::{PoisonError, RwLock},
};

use crate::{
  record::{QName, TagId},
  store::TagResolver,
};

#[derive(Default)]
struct Entries {
  by_id:   HashMap<TagId, QName>,
  by_name: HashMap<QName, TagId>,
  next_id: i64,
}

/// Bidirectional `TagId` ↔ [`QName`] map, usable as a [`TagResolver`].
///
/// Populated at startup from the relational store via [`register`], or
/// assigned locally with [`intern`] when no relational store is involved.
///
/// [`register`]: QNameRegistry::register
/// [`intern`]: QNameRegistry::intern
#[derive(Default)]
pub struct QNameRegistry {
  entries: RwLock<Entries>,
}

impl QNameRegistry {
  pub fn new() -> Self { Self::default() }

  /// Record a mapping assigned elsewhere. A later registration replaces any
  /// earlier mapping of either the handle or the name.
  pub fn register(&self, tag_id: TagId, qname: QName) {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(old_name) = entries.by_id.insert(tag_id, qname.clone())
      && old_name != qname
    {
      entries.by_name.remove(&old_name);
    }
    if let Some(old_id) = entries.by_name.insert(qname, tag_id)
      && old_id != tag_id
    {
      entries.by_id.remove(&old_id);
    }
    entries.next_id = entries.next_id.max(tag_id.0);
  }

  /// Return the handle for `qname`, assigning the next free one if needed.
  pub fn intern(&self, qname: &QName) -> TagId {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(id) = entries.by_name.get(qname) {
      return *id;
    }
    entries.next_id += 1;
    let id = TagId(entries.next_id);
    entries.by_id.insert(id, qname.clone());
    entries.by_name.insert(qname.clone(), id);
    id
  }

  pub fn tag_id(&self, qname: &QName) -> Option<TagId> {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.by_name.get(qname).copied()
  }

  pub fn len(&self) -> usize {
    self.entries.read().unwrap_or_else(PoisonError::into_inner).by_id.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl TagResolver for QNameRegistry {
  fn resolve(&self, tag_id: TagId) -> Option<QName> {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.by_id.get(&tag_id).cloned()
  }
}
