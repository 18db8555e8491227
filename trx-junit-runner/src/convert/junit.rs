// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building and writing JUnit reports from parsed TRX runs.

use super::{
    OutputDir,
    trx::{TrxResult, TrxRun},
};
use crate::errors::{ConversionError, JunitWriteError};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::{io::Write, time::Duration};
use tracing::debug;
use trx_junit_metadata::ConverterOptions;

/// How a TRX outcome is represented in JUnit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OutcomeKind {
    Success,
    Failure,
    Error,
    Skipped,
}

impl OutcomeKind {
    fn from_outcome(outcome: Option<&str>) -> Self {
        match outcome {
            Some("Passed" | "PassedButRunAborted" | "Warning" | "Completed") => Self::Success,
            Some("Failed") => Self::Failure,
            Some("Error" | "Timeout" | "Aborted" | "Disconnected") => Self::Error,
            // NotExecuted, Inconclusive, NotRunnable, Pending, InProgress, and anything newer.
            _ => Self::Skipped,
        }
    }
}

/// Writes one JUnit file per test class in `run` to `output_dir`, returning the paths written.
pub(super) fn write_reports(
    run: &TrxRun,
    options: &ConverterOptions,
    output_dir: &mut OutputDir,
) -> Result<Vec<Utf8PathBuf>, ConversionError> {
    let report_name = run
        .name
        .as_deref()
        .unwrap_or(options.default_suite_name.as_str());

    let mut suites: IndexMap<&str, TestSuite> = IndexMap::new();
    for result in &run.results {
        let class_name = result
            .class_name
            .as_deref()
            .unwrap_or(options.default_suite_name.as_str());
        suites
            .entry(class_name)
            .or_insert_with(|| TestSuite::new(class_name))
            .add_test_case(test_case(result, class_name, options));
    }

    if suites.is_empty() {
        // Every input produces at least one report, even if it ran nothing.
        let name = options.default_suite_name.as_str();
        suites.insert(name, TestSuite::new(name));
    }

    let mut written = Vec::with_capacity(suites.len());
    for (class_name, mut suite) in suites {
        let (timestamp, time) = suite_timing(&suite);
        if let Some(timestamp) = timestamp {
            suite.set_timestamp(timestamp);
        }
        suite.set_time(time);

        let mut report = Report::new(report_name);
        if let Some(timestamp) = timestamp {
            report.set_timestamp(timestamp);
        }
        report.set_time(time).add_test_suite(suite);

        let path = output_dir.reserve(&file_stem(run.id.as_deref(), class_name));
        write_report(&report, &path).map_err(ConversionError::schema_build)?;
        debug!(path = %path, "wrote JUnit report");
        written.push(path);
    }

    Ok(written)
}

fn test_case(result: &TrxResult, class_name: &str, options: &ConverterOptions) -> TestCase {
    let kind = OutcomeKind::from_outcome(result.outcome.as_deref());
    let mut status = match kind {
        OutcomeKind::Success => TestCaseStatus::success(),
        OutcomeKind::Failure => TestCaseStatus::non_success(NonSuccessKind::Failure),
        OutcomeKind::Error => TestCaseStatus::non_success(NonSuccessKind::Error),
        OutcomeKind::Skipped => TestCaseStatus::skipped(),
    };
    if kind != OutcomeKind::Success {
        if let Some(outcome) = &result.outcome {
            status.set_type(outcome.as_str());
        }
        if let Some(message) = &result.message {
            status.set_message(message.as_str());
        }
        if let Some(stack_trace) = &result.stack_trace {
            status.set_description(stack_trace.as_str());
        }
    }

    let mut test_case = TestCase::new(result.test_name.as_str(), status);
    test_case.set_classname(class_name);
    if let Some(duration) = result.duration {
        test_case.set_time(duration);
    }
    if let Some(start_time) = result.start_time {
        test_case.set_timestamp(start_time);
    }
    if options.store_output {
        if let Some(std_out) = &result.std_out {
            test_case.set_system_out(std_out.as_str());
        }
        if let Some(std_err) = &result.std_err {
            test_case.set_system_err(std_err.as_str());
        }
    }
    test_case
}

/// Returns the earliest test case timestamp and the total test case time in a suite.
fn suite_timing(
    suite: &TestSuite,
) -> (Option<chrono::DateTime<chrono::FixedOffset>>, Duration) {
    let timestamp = suite
        .test_cases
        .iter()
        .filter_map(|test_case| test_case.timestamp)
        .min();
    let time = suite
        .test_cases
        .iter()
        .filter_map(|test_case| test_case.time)
        .sum();
    (timestamp, time)
}

fn write_report(report: &Report, path: &Utf8Path) -> Result<(), JunitWriteError> {
    let mut buf = Vec::new();
    report
        .serialize(&mut buf)
        .map_err(|error| JunitWriteError::Serialize {
            path: path.to_owned(),
            error,
        })?;

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| file.write_all(&buf))
        .map_err(|error| JunitWriteError::Write {
            path: path.to_owned(),
            error: match error {
                atomicwrites::Error::Internal(error) | atomicwrites::Error::User(error) => error,
            },
        })
}

/// Returns `TEST-<run id>-<class>`, or `TEST-<class>` if the run has no id.
fn file_stem(run_id: Option<&str>, class_name: &str) -> String {
    match run_id {
        Some(run_id) => format!("TEST-{}-{}", sanitize(run_id), sanitize(class_name)),
        None => format!("TEST-{}", sanitize(class_name)),
    }
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
