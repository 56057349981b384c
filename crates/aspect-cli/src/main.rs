//! `aspectctl` — host environment for the node-aspect store.
//!
//! Reads `aspects.toml` (or the path given with `--config`) plus `ASPECTS_*`
//! environment variables, opens both stores, and runs one command.
//!
//! # Usage
//!
//! ```
//! aspectctl bootstrap
//! aspectctl add --node 42 --aspect aspect:temporary --txn 7
//! ASPECTS_DUAL_WRITE_ENABLED=false aspectctl add --node 42 --aspect aspect:titled
//! aspectctl list --node 42
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use aspect_core::{
  DualWriteAspectStore, StoreConfig,
  qname::QNameRegistry,
  record::{COLLECTION_ASPECTS, FIELD_TXN_ID, NodeId, QName, TagId, TxnId},
  store::{Document, DocumentStore, TransactionContext},
  txn::{FixedTransaction, TransactionCounter},
};
use aspect_store_sqlite::{ConnectionLifecycleManager, SqliteDocumentStore, SqliteRelationalStore};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Node aspect store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "aspects.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Open the document store, ensure its indexes, and list them.
  Bootstrap,

  /// Associate one or more aspects with a node in a single transaction.
  Add {
    #[arg(long)]
    node:    i64,
    /// Qualified aspect name; repeat for several.
    #[arg(long = "aspect", required = true)]
    aspects: Vec<String>,
    /// Transaction id to record; defaults to one past the highest stored.
    #[arg(long)]
    txn:     Option<i64>,
  },

  /// Show the aspects recorded for a node.
  List {
    #[arg(long)]
    node: i64,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = settings::load(&cli.config, None)?;

  let mut lifecycle = ConnectionLifecycleManager::new();
  let document_path = cfg.document_path();
  let documents = lifecycle
    .open(&document_path)
    .await
    .with_context(|| format!("failed to open document store at {document_path:?}"))?;

  let result = run(cli.command, &cfg, documents).await;

  lifecycle.close().await;
  result
}

async fn run(command: Command, cfg: &StoreConfig, documents: SqliteDocumentStore) -> anyhow::Result<()> {
  match command {
    Command::Bootstrap => {
      for name in documents.list_indexes(COLLECTION_ASPECTS).await? {
        println!("{COLLECTION_ASPECTS}.{name}");
      }
      Ok(())
    }
    Command::Add { node, aspects, txn } => {
      with_relational(cfg, |relational, registry| async move {
        let mut tags = Vec::with_capacity(aspects.len());
        for aspect in &aspects {
          let qname = QName::from(aspect.as_str());
          let tag = relational.intern_qname(&qname).await?;
          registry.register(tag, qname);
          tags.push(tag);
        }

        let last = last_txn_id(&documents).await?;
        let store =
          DualWriteAspectStore::new(cfg.dual_write_enabled, documents, registry, relational.clone());
        match txn {
          Some(id) => add(&store, NodeId(node), &tags, &FixedTransaction(TxnId(id))).await,
          None => {
            let txns = TransactionCounter::starting_after(last);
            let outcome = add(&store, NodeId(node), &tags, &txns).await;
            txns.commit();
            outcome
          }
        }
      })
      .await
    }
    Command::List { node } => {
      with_relational(cfg, |relational, registry| async move {
        let store = DualWriteAspectStore::new(
          cfg.dual_write_enabled,
          documents,
          registry,
          relational.clone(),
        );
        for record in store.aspects_of(NodeId(node)).await? {
          println!("{}\t{}\t{}", record.node_id, record.txn_id, record.qname);
        }
        if cfg.dual_write_enabled {
          let mirrored = relational.node_aspects(NodeId(node)).await?;
          tracing::info!(node, mirrored = mirrored.len(), "relational store rows");
        }
        Ok(())
      })
      .await
    }
  }
}

/// Open the relational store, load its qualified names, run `body`, and shut
/// the store down again whatever `body` returned.
async fn with_relational<F, Fut>(cfg: &StoreConfig, body: F) -> anyhow::Result<()>
where
  F: FnOnce(SqliteRelationalStore, QNameRegistry) -> Fut,
  Fut: Future<Output = anyhow::Result<()>>,
{
  let relational_path = cfg.relational_path();
  let relational = SqliteRelationalStore::open(&relational_path)
    .await
    .with_context(|| format!("failed to open relational store at {relational_path:?}"))?;

  let registry = QNameRegistry::new();
  relational.load_into(&registry).await?;

  let result = body(relational.clone(), registry).await;

  if let Err(e) = relational.close().await {
    tracing::error!(error = %e, "failed to shut relational store connection cleanly");
  }
  result
}

async fn add<C: TransactionContext>(
  store: &DualWriteAspectStore<SqliteDocumentStore, QNameRegistry, SqliteRelationalStore>,
  node_id: NodeId,
  tags: &[TagId],
  txn: &C,
) -> anyhow::Result<()> {
  for tag in tags {
    store.record_association(node_id, *tag, txn).await?;
  }
  if let Some(txn_id) = txn.current_transaction_id(false) {
    tracing::info!(%node_id, %txn_id, count = tags.len(), "recorded aspects");
  }
  Ok(())
}

/// Highest transaction id in the aspect collection, or 0.
async fn last_txn_id(documents: &SqliteDocumentStore) -> anyhow::Result<TxnId> {
  let all = documents.find(COLLECTION_ASPECTS, &Document::new()).await?;
  let last = all
    .iter()
    .filter_map(|doc| doc.get(FIELD_TXN_ID).and_then(serde_json::Value::as_i64))
    .max()
    .unwrap_or(0);
  Ok(TxnId(last))
}
