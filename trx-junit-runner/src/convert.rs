// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Converting a single TRX report into JUnit reports.
//!
//! The pipeline only depends on the [`ReportConverter`] trait. [`TrxConverter`] is the
//! implementation shipped with trx-junit: it groups results by test class and writes one JUnit
//! file per class.

mod junit;
mod trx;

use crate::errors::ConversionError;
use camino::{Utf8Path, Utf8PathBuf};
use std::{collections::HashSet, io::Read};
use tracing::debug;
pub use trx_junit_metadata::ConverterOptions;

/// Converts one report read from `input` into one or more JUnit files under `output_dir`.
pub trait ReportConverter {
    /// Performs the conversion, returning the paths of the files written.
    ///
    /// The directory at [`OutputDir::path`] must already exist. File names should be obtained
    /// from [`OutputDir::reserve`], so that reports converted in the same run don't overwrite
    /// each other.
    fn transform(
        &self,
        input: &mut dyn Read,
        output_dir: &mut OutputDir,
    ) -> Result<Vec<Utf8PathBuf>, ConversionError>;
}

impl<T: ReportConverter + ?Sized> ReportConverter for &T {
    fn transform(
        &self,
        input: &mut dyn Read,
        output_dir: &mut OutputDir,
    ) -> Result<Vec<Utf8PathBuf>, ConversionError> {
        (**self).transform(input, output_dir)
    }
}

impl<T: ReportConverter + ?Sized> ReportConverter for Box<T> {
    fn transform(
        &self,
        input: &mut dyn Read,
        output_dir: &mut OutputDir,
    ) -> Result<Vec<Utf8PathBuf>, ConversionError> {
        (**self).transform(input, output_dir)
    }
}

/// The directory JUnit reports are written to during one run.
///
/// Names handed out by [`Self::reserve`] are unique for the lifetime of an `OutputDir`. A new
/// `OutputDir` over the same path starts from scratch, so a rerun writes the same names again.
#[derive(Clone, Debug)]
pub struct OutputDir {
    path: Utf8PathBuf,
    used_names: HashSet<String>,
}

impl OutputDir {
    /// Creates a new `OutputDir` with no names reserved.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            used_names: HashSet::new(),
        }
    }

    /// Returns the path to the directory.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reserves `<stem>.xml`, or `<stem>-<n>.xml` with the smallest `n` not yet taken, and returns
    /// its path.
    pub fn reserve(&mut self, stem: &str) -> Utf8PathBuf {
        let mut name = format!("{stem}.xml");
        let mut suffix = 1;
        while !self.used_names.insert(name.clone()) {
            name = format!("{stem}-{suffix}.xml");
            suffix += 1;
        }
        self.path.join(name)
    }
}

/// Converts MSTest TRX reports to JUnit.
#[derive(Clone, Debug, Default)]
pub struct TrxConverter {
    options: ConverterOptions,
}

impl TrxConverter {
    /// Creates a new converter with the given options.
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    /// Returns the options for this converter.
    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }
}

impl ReportConverter for TrxConverter {
    fn transform(
        &self,
        input: &mut dyn Read,
        output_dir: &mut OutputDir,
    ) -> Result<Vec<Utf8PathBuf>, ConversionError> {
        let run = trx::TrxRun::parse(input)?;
        debug!(
            run_id = run.id.as_deref().unwrap_or("(none)"),
            results = run.results.len(),
            "parsed TRX run"
        );
        junit::write_reports(&run, &self.options, output_dir)
    }
}
