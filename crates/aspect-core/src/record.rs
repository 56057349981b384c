//! The association record and the identifiers it is built from.
//!
//! A node may carry a given aspect at most once; the uniqueness of
//! `(node_id, qname)` is enforced by the primary store's
//! [`ASPECTS_NODE_QNAME`](crate::index::ASPECTS_NODE_QNAME) index, never by
//! this crate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::Document;

/// Collection holding one document per node-aspect association.
pub const COLLECTION_ASPECTS: &str = "node_aspects";

pub const FIELD_NODE_ID: &str = "nodeId";
pub const FIELD_TXN_ID: &str = "txnId";
pub const FIELD_QNAME: &str = "qname";

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque node handle. Unique within the node namespace only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

/// Logical write transaction. Used for auditing and replay, not uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(pub i64);

/// Handle of a qualified name, as held by the relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl fmt::Display for TxnId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl fmt::Display for TagId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

// ─── QName ───────────────────────────────────────────────────────────────────

/// A fully-qualified aspect name in its canonical string form.
///
/// Names built with [`QName::new`] take the `{namespace}local` form; any other
/// canonical string (e.g. a prefixed `aspect:temporary`) is accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QName(String);

impl QName {
  pub fn new(namespace: &str, local_name: &str) -> Self {
    Self(format!("{{{namespace}}}{local_name}"))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Namespace URI, if the name is in `{namespace}local` form.
  pub fn namespace(&self) -> Option<&str> {
    let rest = self.0.strip_prefix('{')?;
    rest.split_once('}').map(|(ns, _)| ns)
  }

  pub fn local_name(&self) -> &str {
    match self.0.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
      Some((_, local)) => local,
      None => &self.0,
    }
  }
}

impl fmt::Display for QName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for QName {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for QName {
  fn from(s: String) -> Self { Self(s) }
}

// ─── AspectRecord ────────────────────────────────────────────────────────────

/// One node-aspect association, as persisted in [`COLLECTION_ASPECTS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRecord {
  #[serde(rename = "nodeId")]
  pub node_id: NodeId,
  #[serde(rename = "txnId")]
  pub txn_id:  TxnId,
  pub qname:   QName,
}

impl AspectRecord {
  pub fn to_document(&self) -> Document {
    let mut doc = Document::new();
    doc.insert(FIELD_NODE_ID.to_owned(), self.node_id.0.into());
    doc.insert(FIELD_TXN_ID.to_owned(), self.txn_id.0.into());
    doc.insert(FIELD_QNAME.to_owned(), self.qname.as_str().into());
    doc
  }

  pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
    serde_json::from_value(serde_json::Value::Object(doc))
  }
}
