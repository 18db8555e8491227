// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, bail, ensure};
use pretty_assertions::assert_eq;
use trx_junit_metadata::{ListenerLevel, TransformRequest, TransformResponse};
use trx_junit_runner::{
    config::TrxJunitConfig,
    convert::{ConverterOptions, TrxConverter},
    errors::{ConversionErrorKind, TransformError},
    listener::{RecordingListener, WriterListener},
    request::execute_request,
    transform::{JUNIT_REPORTS_PATH, ReportTransformer, TransformOutcome, transform_reports},
};

#[test]
fn test_calculator_reports() -> Result<()> {
    let workspace = workspace_with(&["calculator"])?;
    let mut listener = RecordingListener::new();
    let outcome = ReportTransformer::new("**/*.trx", TrxConverter::default())
        .run(Some(workspace.path()), &mut listener)?;

    let reports = match outcome {
        TransformOutcome::Converted { reports } => reports,
        other => bail!("expected reports to be converted, found {other:?}"),
    };
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].input,
        workspace
            .path()
            .join("calculator/TestResults/build-agent_2024-05-01_10_15_02.trx")
    );
    let file_names: Vec<_> = reports[0]
        .outputs
        .iter()
        .filter_map(|output| output.file_name())
        .collect();
    assert_eq!(
        file_names,
        vec![
            format!("TEST-{CALCULATOR_RUN_ID}-Calculator.Tests.ArithmeticTests.xml"),
            format!("TEST-{CALCULATOR_RUN_ID}-Calculator.Tests.ParserTests.xml"),
        ]
    );

    let arithmetic = read_report(
        workspace.path(),
        CALCULATOR_RUN_ID,
        "Calculator.Tests.ArithmeticTests",
    )?;
    ensure!(
        arithmetic.contains(r#"name="build-agent@BUILD01 2024-05-01 10:15:02""#),
        "report is named after the run:\n{arithmetic}"
    );
    ensure!(
        arithmetic.contains(r#"tests="2""#) && arithmetic.contains(r#"failures="1""#),
        "arithmetic suite has one failure:\n{arithmetic}"
    );
    ensure!(
        arithmetic.contains("did not throw expected exception System.DivideByZeroException."),
        "failure message is carried over:\n{arithmetic}"
    );
    ensure!(
        arithmetic.contains("ArithmeticTests.cs:line 27"),
        "stack trace is carried over:\n{arithmetic}"
    );
    ensure!(
        arithmetic.contains("dividing 4 by 0"),
        "stdout is carried over:\n{arithmetic}"
    );

    // The parser tests' class names are assembly-qualified in the TRX file.
    let parser = read_report(
        workspace.path(),
        CALCULATOR_RUN_ID,
        "Calculator.Tests.ParserTests",
    )?;
    ensure!(
        parser.contains(r#"classname="Calculator.Tests.ParserTests""#),
        "class name is unqualified:\n{parser}"
    );
    ensure!(parser.contains("<skipped"), "skipped test:\n{parser}");
    ensure!(
        parser.contains(r#"errors="1""#) && parser.contains(r#"type="Timeout""#),
        "timeout is an error:\n{parser}"
    );
    ensure!(
        parser.contains("giving up after 2000 ms"),
        "stderr is carried over:\n{parser}"
    );

    let lines = listener.into_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].level, ListenerLevel::Info);
    assert_eq!(
        lines[0].message,
        format!("MSTest: {}", reports[0].input)
    );

    Ok(())
}

#[test]
fn test_data_driven_with_byte_order_mark() -> Result<()> {
    let workspace = workspace_with(&["data-driven"])?;
    let outcome = ReportTransformer::new("data-driven/", TrxConverter::default())
        .run(Some(workspace.path()), &mut RecordingListener::new())?;
    ensure!(outcome.is_success(), "conversion succeeded: {outcome:?}");

    let report = read_report(
        workspace.path(),
        DATA_DRIVEN_RUN_ID,
        "Codec.Tests.EncodingTests",
    )?;
    // The data-driven parent is replaced by its two rows.
    assert_eq!(report.matches("<testcase ").count(), 3, "report:\n{report}");
    ensure!(
        report.contains(r#"name="RoundTrip (&quot;plain&quot;)""#),
        "row names are escaped:\n{report}"
    );
    ensure!(
        report.contains(r#"tests="3""#) && report.contains(r#"failures="1""#),
        "one row failed:\n{report}"
    );

    Ok(())
}

#[test]
fn test_multiple_includes() -> Result<()> {
    let workspace = workspace_with(&["calculator", "data-driven", "broken"])?;
    let mut output = Vec::new();
    let mut listener = WriterListener::new(&mut output);
    let outcome = transform_reports(
        Some(workspace.path()),
        "calculator/**/*.trx, data-driven/",
        &TrxConverter::default(),
        &mut listener,
    )?;
    listener.into_inner()?;

    let reports = match outcome {
        TransformOutcome::Converted { reports } => reports,
        other => bail!("expected reports to be converted, found {other:?}"),
    };
    assert_eq!(reports.len(), 2);

    let output = String::from_utf8(output)?;
    let expected = format!(
        "MSTest: {}\nMSTest: {}\n",
        reports[0].input, reports[1].input
    );
    assert_eq!(output, expected);

    Ok(())
}

#[test]
fn test_broken_report_aborts() -> Result<()> {
    let workspace = workspace_with(&["broken"])?;
    let mut listener = RecordingListener::new();
    let result = ReportTransformer::new("**/*.trx", TrxConverter::default())
        .run(Some(workspace.path()), &mut listener);

    let (report, error) = match result {
        Err(TransformError::Conversion { report, error }) => (report, error),
        other => bail!("expected a conversion error, found {other:?}"),
    };
    assert_eq!(
        report,
        workspace.path().join("broken/TestResults/truncated.trx")
    );
    assert_eq!(error.kind(), ConversionErrorKind::MalformedInput);

    // a-complete.trx sorts first and was converted before the failure.
    assert_eq!(listener.lines().len(), 2);
    ensure!(
        workspace
            .path()
            .join(JUNIT_REPORTS_PATH)
            .join(format!(
                "TEST-{CALCULATOR_RUN_ID}-Calculator.Tests.ArithmeticTests.xml"
            ))
            .is_file(),
        "the first report was converted"
    );

    Ok(())
}

#[test]
fn test_config_drives_conversion() -> Result<()> {
    let workspace = workspace_with(&["calculator", "broken"])?;
    let config_dir = workspace.path().join(".config");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(
        config_dir.join("trx-junit.toml"),
        "pattern = \"calculator/**/*.trx\"\n[converter]\nstore-output = false\n",
    )?;

    let config = TrxJunitConfig::from_sources(workspace.path(), None)?;
    let outcome = ReportTransformer::new(
        config.pattern(),
        TrxConverter::new(config.converter().clone()),
    )
    .run(Some(workspace.path()), &mut RecordingListener::new())?;
    ensure!(outcome.is_success(), "broken reports were not matched");

    let arithmetic = read_report(
        workspace.path(),
        CALCULATOR_RUN_ID,
        "Calculator.Tests.ArithmeticTests",
    )?;
    ensure!(
        !arithmetic.contains("dividing 4 by 0"),
        "stdout is dropped:\n{arithmetic}"
    );

    Ok(())
}

#[test]
fn test_request_over_json() -> Result<()> {
    let workspace = workspace_with(&["data-driven"])?;
    let request = TransformRequest::new(Some(workspace.path().to_owned()), "**/*.trx")
        .with_converter(ConverterOptions {
            store_output: false,
            ..Default::default()
        });

    // Ship the request and response through JSON as a remote host would.
    let request = TransformRequest::parse(&request.to_json()?)?;
    let response = TransformResponse::parse(&execute_request(&request).to_json()?)?;

    ensure!(response.verdict, "request succeeded: {response:?}");
    assert_eq!(response.error, None);
    assert_eq!(response.reports.len(), 1);
    assert_eq!(response.reports[0].outputs.len(), 1);
    assert_eq!(response.listener_lines.len(), 1);

    Ok(())
}

#[test]
fn test_absolute_pattern_outside_workspace() -> Result<()> {
    let fixtures = workspace_with(&["calculator"])?;
    let report = fixtures
        .path()
        .join("calculator/TestResults/build-agent_2024-05-01_10_15_02.trx");
    let workspace = workspace_with(&["data-driven"])?;

    let outcome = ReportTransformer::new(report.as_str(), TrxConverter::default())
        .run(Some(workspace.path()), &mut RecordingListener::new())?;
    let reports = match outcome {
        TransformOutcome::Converted { reports } => reports,
        other => bail!("expected reports to be converted, found {other:?}"),
    };
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].input, report);

    // Output goes to the workspace, not next to the report.
    ensure!(
        reports[0]
            .outputs
            .iter()
            .all(|output| output.starts_with(workspace.path().join(JUNIT_REPORTS_PATH))),
        "outputs are under the workspace: {:?}",
        reports[0].outputs
    );

    Ok(())
}
