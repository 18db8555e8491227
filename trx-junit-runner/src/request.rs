// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executing a serialized [`TransformRequest`].
//!
//! This is the unit of work a host ships to the machine that holds the workspace. Listener lines
//! are recorded rather than written, so the host can replay them on its own side with
//! [`RecordingListener::replay`].

use crate::{
    convert::TrxConverter,
    listener::RecordingListener,
    transform::{ConvertedReport, ReportTransformer},
};
use tracing::debug;
use trx_junit_metadata::{
    ConvertedReportSummary, ErrorSummary, TransformRequest, TransformResponse,
};

/// Runs `request` in-process and returns the response.
///
/// Errors never escape: a failed run is described by [`TransformResponse::error`], along with the
/// reports converted before the failure.
pub fn execute_request(request: &TransformRequest) -> TransformResponse {
    debug!(
        workspace_root = ?request.workspace_root,
        pattern = %request.pattern,
        "executing transform request"
    );
    let transformer = ReportTransformer::new(
        request.pattern.clone(),
        TrxConverter::new(request.converter.clone()),
    );

    let mut listener = RecordingListener::new();
    let mut converted = Vec::new();
    let (verdict, error) = match transformer.run_into(
        request.workspace_root.as_deref(),
        &mut listener,
        &mut converted,
    ) {
        Ok(verdict) => (verdict, None),
        Err(error) => (
            false,
            Some(ErrorSummary::from_error(error.process_exit_code(), &error)),
        ),
    };

    TransformResponse {
        verdict,
        reports: converted.into_iter().map(Into::into).collect(),
        listener_lines: listener.into_lines(),
        error,
    }
}

impl From<ConvertedReport> for ConvertedReportSummary {
    fn from(report: ConvertedReport) -> Self {
        Self {
            input: report.input,
            outputs: report.outputs,
        }
    }
}
