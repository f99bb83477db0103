//! Configuration file management.
//!
//! Configuration for the simulator is loaded from TOML files, but all
//! configuration values have sensible defaults; an empty file is valid.
//!
//! The binary offers an option to dump the defaults for editing:
//! ```text
//! chainsim-node generate-config > config.toml
//! ```

use std::{fs, path::Path};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};

/// Loads a TOML-formatted configuration from a given file.
pub fn load_from_file<P: AsRef<Path>, C: DeserializeOwned>(config_path: P) -> anyhow::Result<C> {
    let path_ref = config_path.as_ref();
    let config: C = toml::from_slice(
        &fs::read(path_ref).with_context(|| "failed to read configuration file")?,
    )
    .with_context(|| format!("failed to parse configuration file {}", path_ref.display()))?;
    Ok(config)
}

/// Creates a TOML-formatted string from a given configuration.
pub fn to_string<C: Serialize>(cfg: &C) -> anyhow::Result<String> {
    toml::to_string_pretty(cfg).with_context(|| "failed to serialize default configuration")
}
