// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the trx-junit invocation boundary.
//!
//! A conversion is described by a [`TransformRequest`] and answered by a
//! [`TransformResponse`]. Both are plain JSON documents, so the unit of work can be
//! shipped to whichever machine holds the workspace (for example over `ssh`, into
//! `trx-junit exec-request`), and the listener output relayed back to the caller.

mod exit_codes;
mod request;

pub use exit_codes::*;
pub use request::*;
