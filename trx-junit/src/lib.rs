// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Convert MSTest TRX test reports into JUnit XML.
//!
//! `trx-junit convert` finds TRX reports in a workspace and writes JUnit reports to
//! `temporary-junit-reports`. `trx-junit exec-request` runs a JSON-encoded request, for hosts
//! that drive conversions on another machine.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
