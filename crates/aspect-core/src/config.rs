//! Store configuration, deserialised from `aspects.toml` and the environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Recognised options for the aspect store and its two backends.
///
/// The document store is embedded, so it is addressed by `store_dir` and
/// `database_name` rather than by a host and port.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Also write each association to the relational store.
  pub dual_write_enabled: bool,
  /// Directory holding the embedded document database.
  pub store_dir:          PathBuf,
  pub database_name:      String,
  /// File of the relational (secondary) store.
  pub relational_path:    PathBuf,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      dual_write_enabled: true,
      store_dir:          PathBuf::from("."),
      database_name:      "alfresco".to_owned(),
      relational_path:    PathBuf::from("alfresco-sql.db"),
    }
  }
}

impl StoreConfig {
  /// `<store_dir>/<database_name>.db`, with a leading `~` expanded.
  pub fn document_path(&self) -> PathBuf {
    expand_tilde(&self.store_dir).join(format!("{}.db", self.database_name))
  }

  pub fn relational_path(&self) -> PathBuf { expand_tilde(&self.relational_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
