// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::TrxJunitExitCode;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// The default suite name used for test results whose class is unknown.
pub const DEFAULT_SUITE_NAME: &str = "MSTest";

/// A single unit of work: locate TRX reports under a workspace and convert them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TransformRequest {
    /// The workspace root. If absent, no reports are located.
    pub workspace_root: Option<Utf8PathBuf>,

    /// An absolute path, or a glob relative to the workspace root.
    pub pattern: String,

    /// Options for the TRX to JUnit converter.
    #[serde(default)]
    pub converter: ConverterOptions,
}

impl TransformRequest {
    /// Creates a new request with default converter options.
    pub fn new(workspace_root: Option<Utf8PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            workspace_root,
            pattern: pattern.into(),
            converter: ConverterOptions::default(),
        }
    }

    /// Sets the converter options for this request.
    pub fn with_converter(mut self, converter: ConverterOptions) -> Self {
        self.converter = converter;
        self
    }

    /// Parses a request from JSON.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serializes this request to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Options controlling how TRX results map onto JUnit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConverterOptions {
    /// The suite name for results that don't reference a known test definition.
    pub default_suite_name: String,

    /// Whether to copy test stdout and stderr into the JUnit report.
    pub store_output: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            default_suite_name: DEFAULT_SUITE_NAME.to_owned(),
            store_output: true,
        }
    }
}

/// The answer to a [`TransformRequest`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransformResponse {
    /// True if at least one report was located and every report was converted.
    pub verdict: bool,

    /// The reports converted before the run finished or failed.
    pub reports: Vec<ConvertedReportSummary>,

    /// Lines written to the listener, in order.
    pub listener_lines: Vec<ListenerLine>,

    /// The error that aborted the run, if any.
    pub error: Option<ErrorSummary>,
}

impl TransformResponse {
    /// Parses a response from JSON.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serializes this response to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Returns the exit code a process running this unit of work should exit with.
    pub fn exit_code(&self) -> i32 {
        match (&self.error, self.verdict) {
            (Some(error), _) => error.exit_code,
            (None, false) => TrxJunitExitCode::NO_REPORTS_FOUND,
            (None, true) => TrxJunitExitCode::OK,
        }
    }
}

/// A TRX report and the JUnit files written for it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConvertedReportSummary {
    /// The absolute path of the TRX report.
    pub input: Utf8PathBuf,

    /// The JUnit files written.
    pub outputs: Vec<Utf8PathBuf>,
}

/// A line written to the listener.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListenerLine {
    /// The severity of the line.
    pub level: ListenerLevel,

    /// The message.
    pub message: String,
}

/// The severity of a [`ListenerLine`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerLevel {
    /// Informational output, such as progress.
    Info,

    /// A fatal error.
    Fatal,
}

/// A serializable rendition of an error and its chain of causes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorSummary {
    /// The top-level error message.
    pub message: String,

    /// The messages of each cause, outermost first.
    pub causes: Vec<String>,

    /// The exit code for this error, one of the constants in [`TrxJunitExitCode`].
    pub exit_code: i32,
}

impl ErrorSummary {
    /// Builds a summary by walking the [`source`](std::error::Error::source) chain.
    pub fn from_error(exit_code: i32, error: &(dyn std::error::Error + 'static)) -> Self {
        let message = error.to_string();
        let mut causes = Vec::new();
        let mut next = error.source();
        while let Some(cause) = next {
            causes.push(cause.to_string());
            next = cause.source();
        }
        Self {
            message,
            causes,
            exit_code,
        }
    }
}
