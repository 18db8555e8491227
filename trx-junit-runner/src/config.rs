// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for trx-junit.
//!
//! Repository-specific configuration lives in `.config/trx-junit.toml` and is layered on top of
//! [`TrxJunitConfig::DEFAULT_CONFIG`].

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;
use trx_junit_metadata::ConverterOptions;

/// Overall configuration for trx-junit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrxJunitConfig {
    config_file: Utf8PathBuf,
    pattern: String,
    converter: ConverterOptions,
    unknown_keys: BTreeSet<String>,
}

impl TrxJunitConfig {
    /// The default location of the config within the workspace: `.config/trx-junit.toml`.
    pub const CONFIG_PATH: &'static str = ".config/trx-junit.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from the given file, or if not specified from `.config/trx-junit.toml` in
    /// the workspace root.
    ///
    /// An explicitly specified file must exist. The default location is optional.
    pub fn from_sources(
        workspace_root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown_keys) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file.clone(), kind))?;

        if !unknown_keys.is_empty() {
            warn!(
                config_file = %config_file,
                "ignoring unknown configuration keys: {}",
                unknown_keys.iter().map(String::as_str).collect::<Vec<_>>().join(", "),
            );
        }

        Ok(Self {
            config_file,
            pattern: config.pattern,
            converter: config.converter,
            unknown_keys,
        })
    }

    /// Returns the path of the repository-specific config file, whether or not it exists.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the report pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the converter options.
    pub fn converter(&self) -> &ConverterOptions {
        &self.converter
    }

    /// Returns keys in the config that were not recognized.
    pub fn unknown_keys(&self) -> &BTreeSet<String> {
        &self.unknown_keys
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// Returns the deserialized config and the set of ignored paths.
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(TrxJunitConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: TrxJunitConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // serde_path_to_error already reports the key, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TrxJunitConfigDeserialize {
    pattern: String,
    converter: ConverterOptions,
}
