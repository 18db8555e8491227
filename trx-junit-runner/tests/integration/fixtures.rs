// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, WrapErr};
use walkdir::WalkDir;

/// The run id of the `calculator` fixture.
pub(crate) const CALCULATOR_RUN_ID: &str = "8c84fa94-04c1-424b-9868-57a2d4851a1d";

/// The run id of the `data-driven` fixture.
pub(crate) const DATA_DRIVEN_RUN_ID: &str = "d5c2a0e1-7f5e-4f51-9a63-0a0bb3cbb7b2";

pub(crate) fn fixtures_dir() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures/trx")
}

/// Creates a temporary workspace containing copies of the named fixture directories.
///
/// Conversions write into the workspace, so fixtures are never used in place.
pub(crate) fn workspace_with(fixtures: &[&str]) -> Result<Utf8TempDir> {
    let workspace = camino_tempfile::tempdir()?;
    for fixture in fixtures {
        let src = fixtures_dir().join(fixture);
        for entry in WalkDir::new(&src) {
            let entry = entry.wrap_err_with(|| format!("error walking {src}"))?;
            let relative = entry.path().strip_prefix(&src)?;
            let dest = workspace.path().as_std_path().join(fixture).join(relative);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest)?;
            } else {
                std::fs::copy(entry.path(), &dest)
                    .wrap_err_with(|| format!("error copying {}", entry.path().display()))?;
            }
        }
    }
    Ok(workspace)
}

/// Reads a JUnit report written for `run_id` and `class_name` under the workspace.
pub(crate) fn read_report(workspace: &Utf8Path, run_id: &str, class_name: &str) -> Result<String> {
    let path = workspace
        .join(trx_junit_runner::transform::JUNIT_REPORTS_PATH)
        .join(format!("TEST-{run_id}-{class_name}.xml"));
    std::fs::read_to_string(&path).wrap_err_with(|| format!("error reading {path}"))
}
