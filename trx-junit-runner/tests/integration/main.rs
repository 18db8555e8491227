// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests against the TRX fixtures in `fixtures/trx`.

mod basic;
mod fixtures;
