// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [trx-junit](https://crates.io/crates/trx-junit), which converts MSTest
//! TRX reports into JUnit XML.
//!
//! A run locates reports in a workspace ([`locate`]), converts each of them ([`convert`]) and
//! writes the results under [`transform::JUNIT_REPORTS_PATH`]. Progress is reported through a
//! [`listener::ReportListener`].

pub mod config;
pub mod convert;
pub mod errors;
pub mod listener;
pub mod locate;
pub mod request;
pub mod transform;
