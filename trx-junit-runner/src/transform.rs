// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The transform pipeline: locate reports, convert each one, and report progress.

use crate::{
    convert::{OutputDir, ReportConverter},
    errors::TransformError,
    listener::ReportListener,
    locate::ReportLocator,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs::File, io, io::Read};
use tracing::debug;

/// The directory, relative to the workspace root, that JUnit reports are written to.
pub const JUNIT_REPORTS_PATH: &str = "temporary-junit-reports";

/// The fatal line written when the pattern matches nothing.
pub const NO_REPORTS_FOUND_MESSAGE: &str =
    "MSTest: No MSTest TRX test report files were found. Configuration error?";

/// Opens located reports for reading.
pub trait ReportSource {
    /// The reader returned for a report.
    type Reader: Read;

    /// Opens the report at `path`.
    fn open(&self, path: &Utf8Path) -> io::Result<Self::Reader>;
}

/// A [`ReportSource`] that reads reports from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsReportSource;

impl ReportSource for FsReportSource {
    type Reader = File;

    fn open(&self, path: &Utf8Path) -> io::Result<File> {
        File::open(path)
    }
}

/// The result of a transform run that didn't fail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransformOutcome {
    /// The pattern matched no reports. A fatal line was written to the listener.
    NoReportsFound,

    /// Every located report was converted.
    Converted {
        /// The reports, in the order they were converted.
        reports: Vec<ConvertedReport>,
    },
}

impl TransformOutcome {
    /// Returns true if at least one report was converted.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// A TRX report and the JUnit files written for it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConvertedReport {
    /// The absolute path of the TRX report.
    pub input: Utf8PathBuf,

    /// The JUnit files written.
    pub outputs: Vec<Utf8PathBuf>,
}

/// Locates reports matching a pattern and converts each of them.
///
/// Reports are converted one at a time, in the order they were located. The first error aborts
/// the run.
#[derive(Clone, Debug)]
pub struct ReportTransformer<C, S = FsReportSource> {
    locator: ReportLocator,
    converter: C,
    source: S,
}

impl<C: ReportConverter> ReportTransformer<C> {
    /// Creates a new transformer reading reports from the filesystem.
    pub fn new(pattern: impl Into<String>, converter: C) -> Self {
        Self {
            locator: ReportLocator::new(pattern),
            converter,
            source: FsReportSource,
        }
    }
}

impl<C: ReportConverter, S: ReportSource> ReportTransformer<C, S> {
    /// Replaces the source that reports are opened with.
    pub fn with_source<S2: ReportSource>(self, source: S2) -> ReportTransformer<C, S2> {
        ReportTransformer {
            locator: self.locator,
            converter: self.converter,
            source,
        }
    }

    /// Returns the locator used by this transformer.
    pub fn locator(&self) -> &ReportLocator {
        &self.locator
    }

    /// Runs the pipeline against `workspace_root`, writing progress to `listener`.
    pub fn run(
        &self,
        workspace_root: Option<&Utf8Path>,
        listener: &mut dyn ReportListener,
    ) -> Result<TransformOutcome, TransformError> {
        let mut reports = Vec::new();
        if self.run_into(workspace_root, listener, &mut reports)? {
            Ok(TransformOutcome::Converted { reports })
        } else {
            Ok(TransformOutcome::NoReportsFound)
        }
    }

    /// Runs the pipeline, pushing each converted report to `converted` as it completes.
    ///
    /// Returns false if no reports were found. On error, `converted` holds the reports converted
    /// before the failing one.
    pub(crate) fn run_into(
        &self,
        workspace_root: Option<&Utf8Path>,
        listener: &mut dyn ReportListener,
        converted: &mut Vec<ConvertedReport>,
    ) -> Result<bool, TransformError> {
        let located = self.locator.locate(workspace_root);
        let workspace_root = match workspace_root {
            Some(workspace_root) if !located.is_empty() => workspace_root,
            _ => {
                listener.fatal_error(NO_REPORTS_FOUND_MESSAGE);
                return Ok(false);
            }
        };
        debug!(count = located.len(), "located TRX reports");

        // Names are reserved across the whole run, so reports never overwrite each other's output.
        let mut output_dir = OutputDir::new(workspace_root.join(JUNIT_REPORTS_PATH));
        std::fs::create_dir_all(output_dir.path()).map_err(|error| {
            TransformError::CreateOutputDir {
                dir: output_dir.path().to_owned(),
                error,
            }
        })?;

        for report in located {
            listener.info(&format!("MSTest: {report}"));
            let outputs = self.convert_one(&report, &mut output_dir)?;
            converted.push(ConvertedReport {
                input: report,
                outputs,
            });
        }

        Ok(true)
    }

    fn convert_one(
        &self,
        report: &Utf8Path,
        output_dir: &mut OutputDir,
    ) -> Result<Vec<Utf8PathBuf>, TransformError> {
        // The reader is dropped when this returns, whether or not conversion succeeded.
        let mut reader = self
            .source
            .open(report)
            .map_err(|error| TransformError::OpenReport {
                report: report.to_owned(),
                error,
            })?;

        let outputs = self
            .converter
            .transform(&mut reader, output_dir)
            .map_err(|error| TransformError::Conversion {
                report: report.to_owned(),
                error,
            })?;
        debug!(report = %report, outputs = outputs.len(), "converted TRX report");
        Ok(outputs)
    }
}

/// Locates reports matching `pattern` under `workspace_root` and converts them with `converter`.
pub fn transform_reports(
    workspace_root: Option<&Utf8Path>,
    pattern: &str,
    converter: &dyn ReportConverter,
    listener: &mut dyn ReportListener,
) -> Result<TransformOutcome, TransformError> {
    ReportTransformer::new(pattern, converter).run(workspace_root, listener)
}
