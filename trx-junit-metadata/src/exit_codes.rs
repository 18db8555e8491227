// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `trx-junit` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TrxJunitExitCode {}

impl TrxJunitExitCode {
    /// No errors occurred and all located reports were converted.
    pub const OK: i32 = 0;

    /// No TRX report files matched the pattern, but no other errors occurred.
    pub const NO_REPORTS_FOUND: i32 = 4;

    /// A user issue happened while setting up a trx-junit invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// A located report could not be converted to JUnit.
    pub const CONVERSION_FAILED: i32 = 103;

    /// Reading a request or writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
