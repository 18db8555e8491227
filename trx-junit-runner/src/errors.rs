// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by trx-junit.

use camino::{FromPathBufError, Utf8PathBuf};
use config::ConfigError;
use std::{error::Error as StdError, fmt};
use thiserror::Error;
use trx_junit_metadata::TrxJunitExitCode;

/// Displays an error followed by each of its sources, separated by `: `.
#[derive(Clone, Copy, Debug)]
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: StdError> DisplayErrorChain<E> {
    /// Creates a new chain display for the given error.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: StdError> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        let mut next = self.error.source();
        while let Some(error) = next {
            write!(f, ": {error}")?;
            next = error.source();
        }
        Ok(())
    }
}

/// An error that occurred while parsing the trx-junit config.
#[derive(Debug, Error)]
#[error("failed to parse trx-junit config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while resolving a report pattern against a workspace.
///
/// [`ReportLocator::locate`](crate::locate::ReportLocator::locate) folds these into an empty
/// result; [`ReportLocator::try_locate`](crate::locate::ReportLocator::try_locate) returns them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LocateError {
    /// An include in the pattern was not a valid glob.
    #[error("invalid glob `{glob}` in report pattern")]
    InvalidGlob {
        /// The include that failed to parse.
        glob: String,

        /// The underlying error.
        #[source]
        error: globset::Error,
    },

    /// The workspace root could not be made absolute.
    #[error("failed to make workspace root `{root}` absolute")]
    AbsoluteRoot {
        /// The workspace root.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The directory the scan starts from could not be read.
    ///
    /// Unreadable entries below it are skipped rather than reported.
    #[error("error scanning `{root}` for reports")]
    Walk {
        /// The directory the scan started from.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: walkdir::Error,
    },

    /// A path under the workspace was not valid UTF-8.
    #[error("non-UTF-8 path encountered under `{root}`")]
    NonUtf8Path {
        /// The workspace root.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: FromPathBufError,
    },
}

/// The stage of conversion at which a [`ConversionError`] occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ConversionErrorKind {
    /// The input was not well-formed XML, or not a structurally valid TRX document.
    MalformedInput,

    /// The JUnit output could not be built or written.
    SchemaBuild,

    /// The XML parser could not be set up for the input.
    ParserInit,
}

impl ConversionErrorKind {
    /// Returns the user-facing message reported when a conversion of this kind fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::MalformedInput | Self::SchemaBuild => {
                "MSTest: Could not transform the MSTest report. \
                 Please report this issue to the trx-junit authors"
            }
            Self::ParserInit => {
                "MSTest: Could not initialize the XML parser. \
                 Please report this issue to the trx-junit authors"
            }
        }
    }
}

impl fmt::Display for ConversionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput => write!(f, "malformed TRX input"),
            Self::SchemaBuild => write!(f, "failed to build JUnit output"),
            Self::ParserInit => write!(f, "failed to initialize the XML parser"),
        }
    }
}

/// An error returned by a [`ReportConverter`](crate::convert::ReportConverter).
///
/// The original error is kept as the [`source`](StdError::source) of this error.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ConversionError {
    kind: ConversionErrorKind,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl ConversionError {
    /// Creates a new conversion error of the given kind.
    pub fn new(
        kind: ConversionErrorKind,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// Creates a new [`ConversionErrorKind::MalformedInput`] error.
    pub fn malformed_input(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(ConversionErrorKind::MalformedInput, source)
    }

    /// Creates a new [`ConversionErrorKind::SchemaBuild`] error.
    pub fn schema_build(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(ConversionErrorKind::SchemaBuild, source)
    }

    /// Creates a new [`ConversionErrorKind::ParserInit`] error.
    pub fn parser_init(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(ConversionErrorKind::ParserInit, source)
    }

    /// Returns the stage at which conversion failed.
    pub fn kind(&self) -> ConversionErrorKind {
        self.kind
    }
}

/// An error that prevented the XML parser from being set up for a TRX input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParserInitError {
    /// The input could not be read.
    #[error("error reading TRX input")]
    Read(#[source] std::io::Error),

    /// The input starts with a byte order mark for an encoding other than UTF-8.
    #[error("unsupported byte order mark for {encoding}")]
    UnsupportedByteOrderMark {
        /// The encoding indicated by the byte order mark.
        encoding: &'static str,
    },

    /// The XML declaration names an encoding other than UTF-8.
    #[error("unsupported XML encoding `{encoding}` (only UTF-8 is supported)")]
    UnsupportedEncoding {
        /// The declared encoding.
        encoding: String,
    },
}

/// A TRX document that is well-formed XML but can't be understood as a TRX report, or that isn't
/// well-formed in ways the XML reader doesn't detect on its own.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrxFormatError {
    /// The input was not valid UTF-8.
    #[error("TRX input is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    /// The document has no root element.
    #[error("document has no root element")]
    MissingRoot,

    /// The root element is not `TestRun`.
    #[error("root element is `{found}`, expected `TestRun`")]
    UnexpectedRoot {
        /// The root element found.
        found: String,
    },

    /// A second root element was found.
    #[error("unexpected element `{element}` after the root element")]
    MultipleRoots {
        /// The extra element.
        element: String,
    },

    /// The document ended before an element was closed.
    #[error("element `{element}` is not closed")]
    UnclosedElement {
        /// The element left open.
        element: String,
    },

    /// An element is missing a required attribute.
    #[error("`{element}` is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element.
        element: &'static str,

        /// The attribute.
        attribute: &'static str,
    },

    /// A duration could not be parsed.
    #[error("invalid duration `{value}` for test `{test_name}`")]
    InvalidDuration {
        /// The test the duration belongs to.
        test_name: String,

        /// The value that failed to parse.
        value: String,
    },

    /// A start time could not be parsed.
    #[error("invalid start time `{value}` for test `{test_name}`")]
    InvalidStartTime {
        /// The test the start time belongs to.
        test_name: String,

        /// The value that failed to parse.
        value: String,

        /// The underlying error.
        #[source]
        error: chrono::ParseError,
    },
}

/// An error that occurred while writing a JUnit report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JunitWriteError {
    /// The report could not be serialized.
    #[error("error serializing JUnit report `{path}`")]
    Serialize {
        /// The report path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },

    /// The report could not be written to disk.
    #[error("error writing JUnit report `{path}`")]
    Write {
        /// The report path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that aborted a transform run.
///
/// Any error aborts the whole batch: reports after the failing one are not converted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransformError {
    /// The JUnit output directory could not be created.
    #[error("MSTest: Could not create the JUnit output directory `{dir}`")]
    CreateOutputDir {
        /// The output directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A located report could not be opened.
    #[error("MSTest: Could not open the MSTest report `{report}`")]
    OpenReport {
        /// The report path.
        report: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A report could not be converted.
    #[error("{}", .error.kind().failure_message())]
    Conversion {
        /// The report path.
        report: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: ConversionError,
    },
}

impl TransformError {
    /// Returns the exit code for a process that stopped with this error.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CreateOutputDir { .. } => TrxJunitExitCode::WRITE_OUTPUT_ERROR,
            Self::OpenReport { .. } | Self::Conversion { .. } => {
                TrxJunitExitCode::CONVERSION_FAILED
            }
        }
    }

    /// Returns the report this error is about, if any.
    pub fn report(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::CreateOutputDir { .. } => None,
            Self::OpenReport { report, .. } | Self::Conversion { report, .. } => Some(report),
        }
    }
}
