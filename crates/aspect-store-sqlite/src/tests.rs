//! Integration tests for the SQLite stores against in-memory databases.

use std::sync::Arc;

use aspect_core::{
  DualWriteAspectStore, Error as AspectError, StoreError,
  index::{ASPECT_INDEXES, bootstrap_indexes},
  qname::QNameRegistry,
  record::{AspectRecord, COLLECTION_ASPECTS, NodeId, QName, TagId, TxnId},
  store::{AspectMirror, Document, DocumentStore},
  txn::{FixedTransaction, TransactionCounter},
};
use serde_json::json;

use crate::{ConnectionLifecycleManager, SqliteDocumentStore, SqliteRelationalStore};

async fn documents() -> SqliteDocumentStore {
  let store = SqliteDocumentStore::open_in_memory()
    .await
    .expect("in-memory document store");
  bootstrap_indexes(&store).await.expect("bootstrap");
  store
}

async fn relational() -> SqliteRelationalStore {
  SqliteRelationalStore::open_in_memory()
    .await
    .expect("in-memory relational store")
}

fn doc(value: serde_json::Value) -> Document {
  value.as_object().expect("object").clone()
}

// ─── Document store ──────────────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_is_idempotent() {
  let store = SqliteDocumentStore::open_in_memory().await.unwrap();
  bootstrap_indexes(&store).await.unwrap();
  bootstrap_indexes(&store).await.unwrap();

  let names = store.list_indexes(COLLECTION_ASPECTS).await.unwrap();
  assert_eq!(names, vec!["ASPECTS_NODE_QNAME", "ASPECTS_NODE_TXN_QNAME"]);
  assert_eq!(names.len(), ASPECT_INDEXES.len());
}

#[tokio::test]
async fn list_indexes_of_missing_collection_is_empty() {
  let store = SqliteDocumentStore::open_in_memory().await.unwrap();
  assert!(store.list_indexes(COLLECTION_ASPECTS).await.unwrap().is_empty());
}

#[tokio::test]
async fn insert_and_find() {
  let store = documents().await;
  store
    .insert(COLLECTION_ASPECTS, doc(json!({ "nodeId": 1, "txnId": 1, "qname": "a:x" })))
    .await
    .unwrap();
  store
    .insert(COLLECTION_ASPECTS, doc(json!({ "nodeId": 1, "txnId": 2, "qname": "a:y" })))
    .await
    .unwrap();
  store
    .insert(COLLECTION_ASPECTS, doc(json!({ "nodeId": 2, "txnId": 2, "qname": "a:x" })))
    .await
    .unwrap();

  let node_one = store
    .find(COLLECTION_ASPECTS, &doc(json!({ "nodeId": 1 })))
    .await
    .unwrap();
  assert_eq!(node_one.len(), 2);
  assert_eq!(node_one[0]["qname"], "a:x");
  assert_eq!(node_one[1]["qname"], "a:y");

  let in_txn = store
    .find(COLLECTION_ASPECTS, &doc(json!({ "txnId": 2, "qname": "a:x" })))
    .await
    .unwrap();
  assert_eq!(in_txn.len(), 1);
  assert_eq!(in_txn[0]["nodeId"], 2);

  let all = store.find(COLLECTION_ASPECTS, &Document::new()).await.unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn find_in_missing_collection_is_empty() {
  let store = SqliteDocumentStore::open_in_memory().await.unwrap();
  let found = store
    .find("node_properties", &doc(json!({ "nodeId": 1 })))
    .await
    .unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn unique_index_rejects_duplicate_pair() {
  let store = documents().await;
  store
    .insert(COLLECTION_ASPECTS, doc(json!({ "nodeId": 42, "txnId": 7, "qname": "a:x" })))
    .await
    .unwrap();

  let err = store
    .insert(COLLECTION_ASPECTS, doc(json!({ "nodeId": 42, "txnId": 8, "qname": "a:x" })))
    .await
    .unwrap_err();

  match err {
    StoreError::DuplicateKey { index } => assert_eq!(index, "ASPECTS_NODE_QNAME"),
    other => panic!("expected DuplicateKey, got {other:?}"),
  }
  let stored = store.find(COLLECTION_ASPECTS, &Document::new()).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0]["txnId"], 7);
}

#[tokio::test]
async fn invalid_collection_name_is_rejected() {
  let store = documents().await;
  let err = store
    .insert("bad name", doc(json!({ "nodeId": 1 })))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::Rejected(msg) if msg.contains("invalid name")));
}

// ─── Relational store ────────────────────────────────────────────────────────

#[tokio::test]
async fn intern_qname_is_stable() {
  let store = relational().await;
  let a = store.intern_qname(&"aspect:temporary".into()).await.unwrap();
  let b = store.intern_qname(&"aspect:titled".into()).await.unwrap();
  assert_ne!(a, b);
  assert_eq!(store.intern_qname(&"aspect:temporary".into()).await.unwrap(), a);

  let registry = QNameRegistry::new();
  assert_eq!(store.load_into(&registry).await.unwrap(), 2);
  assert_eq!(registry.tag_id(&"aspect:titled".into()), Some(b));
}

#[tokio::test]
async fn mirror_rejects_duplicate_and_unknown_tag() {
  let store = relational().await;
  let tag = store.intern_qname(&"aspect:temporary".into()).await.unwrap();

  store.insert_association(NodeId(1), tag).await.unwrap();
  assert!(matches!(
    store.insert_association(NodeId(1), tag).await,
    Err(StoreError::DuplicateKey { .. })
  ));
  assert!(matches!(
    store.insert_association(NodeId(1), TagId(999)).await,
    Err(StoreError::Rejected(_))
  ));
  assert_eq!(store.node_aspects(NodeId(1)).await.unwrap(), vec![tag]);
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_bootstraps_indexes() {
  let mut manager = ConnectionLifecycleManager::new();
  assert!(!manager.is_open());

  let store = manager.open_in_memory().await.unwrap();
  assert!(manager.is_open());
  assert_eq!(store.list_indexes(COLLECTION_ASPECTS).await.unwrap().len(), 2);

  manager.close().await;
}

#[tokio::test]
async fn open_failure_is_reported() {
  let mut manager = ConnectionLifecycleManager::new();
  let path = std::env::temp_dir()
    .join(format!("aspects-missing-{}", std::process::id()))
    .join("sub")
    .join("alfresco.db");

  assert!(manager.open(&path).await.is_err());
  assert!(!manager.is_open());
  assert!(manager.handle().is_none());
}

#[tokio::test]
async fn close_makes_handles_unavailable() {
  let mut manager = ConnectionLifecycleManager::new();
  let store = manager.open_in_memory().await.unwrap();

  manager.close().await;
  assert!(manager.handle().is_none());

  let err = store
    .insert(COLLECTION_ASPECTS, doc(json!({ "nodeId": 1, "txnId": 1, "qname": "a:x" })))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::Unavailable(_)));

  // A second close is a no-op.
  manager.close().await;
}

#[tokio::test]
async fn reopen_replaces_handle() {
  let mut manager = ConnectionLifecycleManager::new();
  let first = manager.open_in_memory().await.unwrap();
  let second = manager.open_in_memory().await.unwrap();

  assert!(first.list_indexes(COLLECTION_ASPECTS).await.is_err());
  assert_eq!(second.list_indexes(COLLECTION_ASPECTS).await.unwrap().len(), 2);
}

// ─── Dual write over SQLite ──────────────────────────────────────────────────

struct Harness {
  mirror: SqliteRelationalStore,
  tag:    TagId,
  store:  DualWriteAspectStore<SqliteDocumentStore, Arc<QNameRegistry>, SqliteRelationalStore>,
}

async fn harness(dual_write_enabled: bool) -> Harness {
  let mirror = relational().await;
  let registry = Arc::new(QNameRegistry::new());
  let tag = mirror.intern_qname(&"aspect:temporary".into()).await.unwrap();
  mirror.load_into(&registry).await.unwrap();

  let store = DualWriteAspectStore::new(dual_write_enabled, documents().await, registry, mirror.clone());
  Harness { mirror, tag, store }
}

#[tokio::test]
async fn happy_path() {
  let h = harness(true).await;

  h.store
    .record_association(NodeId(42), h.tag, &FixedTransaction(TxnId(7)))
    .await
    .unwrap();

  assert_eq!(h.store.aspects_of(NodeId(42)).await.unwrap(), vec![AspectRecord {
    node_id: NodeId(42),
    txn_id:  TxnId(7),
    qname:   QName::from("aspect:temporary"),
  }]);
  assert_eq!(h.mirror.node_aspects(NodeId(42)).await.unwrap(), vec![h.tag]);
}

#[tokio::test]
async fn duplicate_references_new_transaction() {
  let h = harness(true).await;
  h.store
    .record_association(NodeId(42), h.tag, &FixedTransaction(TxnId(7)))
    .await
    .unwrap();

  let err = h
    .store
    .record_association(NodeId(42), h.tag, &FixedTransaction(TxnId(8)))
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    AspectError::ConcurrencyConflict { node_id: NodeId(42), txn_id: TxnId(8), .. }
  ));
  let stored = h.store.aspects_of(NodeId(42)).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].txn_id, TxnId(7));
  assert_eq!(h.mirror.node_aspects(NodeId(42)).await.unwrap(), vec![h.tag]);
}

#[tokio::test]
async fn dual_write_disabled_leaves_mirror_unchanged() {
  let h = harness(false).await;

  h.store
    .record_association(NodeId(42), h.tag, &FixedTransaction(TxnId(7)))
    .await
    .unwrap();

  assert_eq!(h.store.aspects_of(NodeId(42)).await.unwrap().len(), 1);
  assert!(h.mirror.node_aspects(NodeId(42)).await.unwrap().is_empty());
}

#[tokio::test]
async fn mirror_divergence_is_reported() {
  let h = harness(true).await;
  // The mirror already holds the row, so only the primary write succeeds.
  h.mirror.insert_association(NodeId(3), h.tag).await.unwrap();

  let err = h
    .store
    .record_association(NodeId(3), h.tag, &FixedTransaction(TxnId(1)))
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    AspectError::SecondaryWriteFailure { source: StoreError::DuplicateKey { .. }, .. }
  ));
  assert_eq!(h.store.aspects_of(NodeId(3)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn closed_primary_is_a_connection_failure() {
  let mut manager = ConnectionLifecycleManager::new();
  let documents = manager.open_in_memory().await.unwrap();
  let mirror = relational().await;
  let registry = QNameRegistry::new();
  let tag = registry.intern(&"aspect:temporary".into());
  let store = DualWriteAspectStore::new(true, documents, registry, mirror.clone());

  manager.close().await;

  let err = store
    .record_association(NodeId(1), tag, &TransactionCounter::new())
    .await
    .unwrap_err();
  assert!(matches!(err, AspectError::ConnectionFailure(_)));
  assert!(mirror.node_aspects(NodeId(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_duplicates_have_one_winner() {
  let h = harness(true).await;
  let tag = h.tag;
  let store = Arc::new(h.store);
  let txns = Arc::new(TransactionCounter::new());

  let mut handles = Vec::new();
  for _ in 0..8 {
    let store = store.clone();
    let txns = txns.clone();
    handles.push(tokio::spawn(async move {
      let txn = FixedTransaction(txns.begin());
      store.record_association(NodeId(42), tag, &txn).await
    }));
  }

  let mut wins = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(()) => wins += 1,
      Err(AspectError::ConcurrencyConflict { .. }) => {}
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!(wins, 1);
  assert_eq!(store.aspects_of(NodeId(42)).await.unwrap().len(), 1);
  assert_eq!(h.mirror.node_aspects(NodeId(42)).await.unwrap(), vec![tag]);
}
