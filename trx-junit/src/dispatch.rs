// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use std::io::{Read, Write};
use tracing::{debug, info};
use trx_junit_metadata::{TransformRequest, TrxJunitExitCode};
use trx_junit_runner::{
    config::TrxJunitConfig,
    convert::TrxConverter,
    listener::WriterListener,
    request::execute_request,
    transform::{ReportTransformer, TransformOutcome},
};

/// Convert MSTest TRX test reports into JUnit XML.
///
/// JUnit reports are written to `temporary-junit-reports` under the workspace root.
#[derive(Debug, Parser)]
#[command(
    name = "trx-junit",
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct TrxJunitApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl TrxJunitApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Convert(opts) => opts.exec(output, output_writer),
            Command::ExecRequest(opts) => opts.exec(output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Locate TRX reports in a workspace and convert them to JUnit
    ///
    /// Exits with code 4 if no reports were found.
    Convert(ConvertOpts),

    /// Run a JSON-encoded transform request
    ///
    /// Reads a request from standard input (or --input), converts the reports it names, and
    /// writes the response as JSON to standard output. The verdict and any error are part of the
    /// response, so this exits with code 0 whenever a response was written.
    ExecRequest(ExecRequestOpts),
}

#[derive(Debug, Args)]
struct ConvertOpts {
    /// Workspace root [default: current directory]
    #[arg(long, value_name = "DIR")]
    workspace: Option<Utf8PathBuf>,

    /// Config file [default: WORKSPACE/.config/trx-junit.toml]
    #[arg(long = "config", value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Reports to convert: an absolute path, or comma-separated globs relative to the workspace
    /// [default: from config, or **/*.trx]
    #[arg(value_name = "PATTERN")]
    pattern: Option<String>,
}

impl ConvertOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let workspace_root = match self.workspace {
            Some(workspace_root) => workspace_root,
            None => current_dir()?,
        };
        let config = TrxJunitConfig::from_sources(&workspace_root, self.config_file.as_deref())
            .map_err(ExpectedError::config_parse_error)?;
        let pattern = self.pattern.as_deref().unwrap_or(config.pattern());
        debug!(
            workspace_root = %workspace_root,
            pattern,
            config_file = %config.config_file(),
            "converting TRX reports"
        );

        let transformer =
            ReportTransformer::new(pattern, TrxConverter::new(config.converter().clone()));
        let mut listener = WriterListener::new(output_writer.stderr_writer());
        if output.color.should_colorize(supports_color::Stream::Stderr) {
            listener.colorize();
        }

        let result = transformer.run(Some(workspace_root.as_path()), &mut listener);
        let written = listener.into_inner().and_then(|mut stderr| stderr.flush());
        let outcome = result?;
        written.map_err(|err| ExpectedError::WriteOutputError { err })?;

        match outcome {
            TransformOutcome::NoReportsFound => Ok(TrxJunitExitCode::NO_REPORTS_FOUND),
            TransformOutcome::Converted { reports } => {
                if output.verbose {
                    for report in &reports {
                        for junit in &report.outputs {
                            info!("{} -> {junit}", report.input);
                        }
                    }
                }
                debug!(count = reports.len(), "converted all TRX reports");
                Ok(TrxJunitExitCode::OK)
            }
        }
    }
}

#[derive(Debug, Args)]
struct ExecRequestOpts {
    /// Read the request from this file instead of standard input
    #[arg(long, value_name = "PATH")]
    input: Option<Utf8PathBuf>,
}

impl ExecRequestOpts {
    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let json = read_request(self.input.as_deref())?;
        let request = TransformRequest::parse(&json)
            .map_err(|err| ExpectedError::RequestParseError { err })?;

        let response = execute_request(&request);
        debug!(
            verdict = response.verdict,
            exit_code = response.exit_code(),
            "transform request finished"
        );
        let json = response
            .to_json()
            .map_err(|err| ExpectedError::ResponseSerializeError { err })?;

        let mut stdout = output_writer.stdout_writer();
        writeln!(stdout, "{json}")
            .and_then(|()| stdout.flush())
            .map_err(|err| ExpectedError::WriteOutputError { err })?;
        Ok(TrxJunitExitCode::OK)
    }
}

fn read_request(input: Option<&Utf8Path>) -> Result<String> {
    match input {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|err| ExpectedError::RequestReadError {
                path: Some(path.to_owned()),
                err,
            })
        }
        None => {
            let mut json = String::new();
            std::io::stdin()
                .read_to_string(&mut json)
                .map_err(|err| ExpectedError::RequestReadError { path: None, err })?;
            Ok(json)
        }
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let current_dir =
        std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
    Utf8PathBuf::try_from(current_dir)
        .map_err(|err| ExpectedError::WorkspaceRootInvalidUtf8 { err })
}
