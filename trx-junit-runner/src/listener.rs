// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sinks for the user-facing lines a transform run produces.
//!
//! A run writes exactly two kinds of lines: one fatal line if no reports were found, and one
//! informational line per report as it is converted. Internal diagnostics go through `tracing`
//! instead.

use owo_colors::{OwoColorize, Style, style};
use std::io::{self, Write};
use trx_junit_metadata::{ListenerLevel, ListenerLine};

/// An append-only sink for the lines produced by a transform run.
pub trait ReportListener {
    /// Reports a fatal error.
    fn fatal_error(&mut self, message: &str);

    /// Reports informational output.
    fn info(&mut self, message: &str);
}

/// A listener that writes lines to a [`Write`] implementation.
///
/// The first write error is kept and returned from [`Self::into_inner`]; later lines are dropped.
#[derive(Debug)]
pub struct WriterListener<W> {
    writer: W,
    styles: ListenerStyles,
    error: Option<io::Error>,
}

impl<W: Write> WriterListener<W> {
    /// Creates a new listener writing uncolored lines.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            styles: ListenerStyles::default(),
            error: None,
        }
    }

    /// Colorizes fatal lines.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Returns the writer, or the first error that occurred while writing to it.
    pub fn into_inner(self) -> io::Result<W> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.writer),
        }
    }

    fn write_line(&mut self, message: &str, style: Style) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = writeln!(self.writer, "{}", message.style(style)) {
            self.error = Some(error);
        }
    }
}

impl<W: Write> ReportListener for WriterListener<W> {
    fn fatal_error(&mut self, message: &str) {
        let style = self.styles.fatal;
        self.write_line(message, style);
    }

    fn info(&mut self, message: &str) {
        let style = self.styles.info;
        self.write_line(message, style);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ListenerStyles {
    fatal: Style,
    info: Style,
}

impl ListenerStyles {
    fn colorize(&mut self) {
        self.fatal = style().red().bold();
        self.info = style();
    }
}

/// A listener that records lines in memory, so they can be relayed back to a remote caller.
#[derive(Clone, Debug, Default)]
pub struct RecordingListener {
    lines: Vec<ListenerLine>,
}

impl RecordingListener {
    /// Creates a new, empty recording listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lines recorded so far.
    pub fn lines(&self) -> &[ListenerLine] {
        &self.lines
    }

    /// Consumes the listener, returning the recorded lines.
    pub fn into_lines(self) -> Vec<ListenerLine> {
        self.lines
    }

    /// Replays the recorded lines into another listener.
    pub fn replay(&self, listener: &mut dyn ReportListener) {
        for line in &self.lines {
            match line.level {
                ListenerLevel::Fatal => listener.fatal_error(&line.message),
                ListenerLevel::Info => listener.info(&line.message),
            }
        }
    }

    fn push(&mut self, level: ListenerLevel, message: &str) {
        self.lines.push(ListenerLine {
            level,
            message: message.to_owned(),
        });
    }
}

impl ReportListener for RecordingListener {
    fn fatal_error(&mut self, message: &str) {
        self.push(ListenerLevel::Fatal, message);
    }

    fn info(&mut self, message: &str) {
        self.push(ListenerLevel::Info, message);
    }
}
