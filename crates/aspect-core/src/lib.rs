//! Core types and trait definitions for the node-aspect store.
//!
//! This crate is deliberately free of database dependencies. Concrete stores
//! (e.g. `aspect-store-sqlite`) implement the capability traits in [`store`];
//! the write policy lives in [`writer`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod error;
pub mod index;
pub mod qname;
pub mod record;
pub mod store;
pub mod txn;
pub mod writer;

pub use config::StoreConfig;
pub use error::{Error, Result, StoreError};
pub use record::{AspectRecord, NodeId, QName, TagId, TxnId};
pub use writer::{AspectWriter, DualWriteAspectStore};
