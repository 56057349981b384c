//! SQLite backends for the node-aspect store.
//!
//! [`SqliteDocumentStore`] is the primary document store; collections are
//! tables of JSON documents with expression indexes. [`SqliteRelationalStore`]
//! is the relational system of record the primary store mirrors into.
//!
//! Both wrap [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime.

mod encode;
mod schema;

pub mod document;
pub mod error;
pub mod lifecycle;
pub mod relational;

pub use document::SqliteDocumentStore;
pub use error::{Error, Result};
pub use lifecycle::ConnectionLifecycleManager;
pub use relational::SqliteRelationalStore;

#[cfg(test)]
mod tests;
