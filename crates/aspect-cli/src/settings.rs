//! Layered configuration: optional TOML file, then `ASPECTS_*` environment
//! variables.

use std::{collections::HashMap, path::Path};

use anyhow::Context as _;
use aspect_core::StoreConfig;

pub const ENV_PREFIX: &str = "ASPECTS";

/// Load [`StoreConfig`] from `path` (if it exists) and the environment.
///
/// `env` replaces the process environment when given.
pub fn load(path: &Path, env: Option<HashMap<String, String>>) -> anyhow::Result<StoreConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .source(env),
    )
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise StoreConfig")
}
