// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::{FromPathBufError, Utf8PathBuf};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;
use trx_junit_metadata::TrxJunitExitCode;
use trx_junit_runner::errors::{ConfigParseError, TransformError};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are printed with display_to_stderr, which
// colorizes them.

/// An error that trx-junit knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("workspace root is not valid UTF-8")]
    WorkspaceRootInvalidUtf8 {
        #[source]
        err: FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("transform error")]
    TransformError {
        #[from]
        err: TransformError,
    },
    #[error("error reading transform request")]
    RequestReadError {
        path: Option<Utf8PathBuf>,
        #[source]
        err: std::io::Error,
    },
    #[error("error parsing transform request")]
    RequestParseError {
        #[source]
        err: serde_json::Error,
    },
    #[error("error serializing transform response")]
    ResponseSerializeError {
        #[source]
        err: serde_json::Error,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn config_parse_error(err: ConfigParseError) -> Self {
        Self::ConfigParseError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::WorkspaceRootInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::RequestReadError { .. }
            | Self::RequestParseError { .. } => TrxJunitExitCode::SETUP_ERROR,
            Self::TransformError { err } => err.process_exit_code(),
            Self::ResponseSerializeError { .. } | Self::WriteOutputError { .. } => {
                TrxJunitExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirFailed { err } => {
                error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::WorkspaceRootInvalidUtf8 { err } => {
                error!("workspace root is not valid UTF-8");
                Some(err as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse trx-junit config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::TransformError { err } => {
                error!("{err}");
                if let Some(report) = err.report() {
                    error!(
                        target: NO_HEADING_TARGET,
                        "  (while processing {})",
                        report.style(styles.bold)
                    );
                }
                err.source()
            }
            Self::RequestReadError { path, err } => {
                match path {
                    Some(path) => error!(
                        "error reading transform request from `{}`",
                        path.style(styles.bold)
                    ),
                    None => error!("error reading transform request from standard input"),
                }
                Some(err as &dyn Error)
            }
            Self::RequestParseError { err } => {
                error!("error parsing transform request");
                Some(err as &dyn Error)
            }
            Self::ResponseSerializeError { err } => {
                error!("error serializing transform response");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!(
                    "{}",
                    "error writing output (is the output stream closed?)"
                        .style(styles.warning_text)
                );
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
