// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading TRX documents.

use crate::errors::{ConversionError, ParserInitError, TrxFormatError};
use chrono::{DateTime, FixedOffset};
use quick_xml::{
    Reader,
    events::{BytesDecl, BytesStart, Event},
};
use std::{collections::HashMap, io::Read, time::Duration};

static SUPPORTED_ENCODINGS: &[&str] = &["utf-8", "utf8", "us-ascii", "ascii"];

/// A parsed `TestRun`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct TrxRun {
    pub(super) id: Option<String>,
    pub(super) name: Option<String>,
    pub(super) results: Vec<TrxResult>,
}

/// A single `UnitTestResult`, joined with its test definition.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct TrxResult {
    pub(super) test_name: String,
    pub(super) class_name: Option<String>,
    pub(super) outcome: Option<String>,
    pub(super) duration: Option<Duration>,
    pub(super) start_time: Option<DateTime<FixedOffset>>,
    pub(super) message: Option<String>,
    pub(super) stack_trace: Option<String>,
    pub(super) std_out: Option<String>,
    pub(super) std_err: Option<String>,
}

impl TrxRun {
    pub(super) fn parse(input: &mut dyn Read) -> Result<Self, ConversionError> {
        let text = read_utf8(input)?;
        let root = parse_tree(&text)?;
        Self::from_root(&root).map_err(ConversionError::malformed_input)
    }

    fn from_root(root: &Element) -> Result<Self, TrxFormatError> {
        if root.name != "TestRun" {
            return Err(TrxFormatError::UnexpectedRoot {
                found: root.name.clone(),
            });
        }

        // Test definitions (UnitTest, GenericTest, OrderedTest...) all share the same shape.
        let mut classes = HashMap::new();
        for definition in root
            .child("TestDefinitions")
            .into_iter()
            .flat_map(|definitions| &definitions.children)
        {
            let class_name = definition
                .child("TestMethod")
                .and_then(|method| method.attribute("className"))
                .and_then(unqualified_class_name);
            if let (Some(id), Some(class_name)) = (definition.attribute("id"), class_name) {
                classes.insert(id, class_name);
            }
        }

        let mut results = Vec::new();
        if let Some(results_element) = root.child("Results") {
            collect_results(results_element, &classes, None, &mut results)?;
        }

        Ok(Self {
            id: root.attribute("id").map(ToOwned::to_owned),
            name: root.attribute("name").map(ToOwned::to_owned),
            results,
        })
    }
}

/// Collects results below `parent`. A result with inner results (data-driven and ordered tests)
/// is represented by its inner results only.
fn collect_results(
    parent: &Element,
    classes: &HashMap<&str, &str>,
    inherited_class: Option<&str>,
    out: &mut Vec<TrxResult>,
) -> Result<(), TrxFormatError> {
    for element in parent.children_named("UnitTestResult") {
        let class_name = element
            .attribute("testId")
            .and_then(|id| classes.get(id).copied())
            .or(inherited_class);

        if let Some(inner) = element.child("InnerResults")
            && inner.children_named("UnitTestResult").next().is_some()
        {
            collect_results(inner, classes, class_name, out)?;
            continue;
        }

        out.push(TrxResult::from_element(element, class_name)?);
    }
    Ok(())
}

impl TrxResult {
    fn from_element(element: &Element, class_name: Option<&str>) -> Result<Self, TrxFormatError> {
        let test_name = element
            .attribute("testName")
            .ok_or(TrxFormatError::MissingAttribute {
                element: "UnitTestResult",
                attribute: "testName",
            })?
            .to_owned();

        let duration = element
            .attribute("duration")
            .map(|value| {
                parse_duration(value).ok_or_else(|| TrxFormatError::InvalidDuration {
                    test_name: test_name.clone(),
                    value: value.to_owned(),
                })
            })
            .transpose()?;

        let start_time = element
            .attribute("startTime")
            .map(|value| {
                DateTime::parse_from_rfc3339(value).map_err(|error| {
                    TrxFormatError::InvalidStartTime {
                        test_name: test_name.clone(),
                        value: value.to_owned(),
                        error,
                    }
                })
            })
            .transpose()?;

        let output = element.child("Output");
        let output_text = |path: &[&str]| {
            output
                .and_then(|output| output.descendant_text(path))
                .map(ToOwned::to_owned)
        };

        Ok(Self {
            class_name: class_name.map(ToOwned::to_owned),
            outcome: element.attribute("outcome").map(ToOwned::to_owned),
            duration,
            start_time,
            message: output_text(&["ErrorInfo", "Message"]),
            stack_trace: output_text(&["ErrorInfo", "StackTrace"]),
            std_out: output_text(&["StdOut"]),
            std_err: output_text(&["StdErr"]),
            test_name,
        })
    }
}

/// Strips the assembly qualification from a .NET type name: `Ns.Class, Assembly, Version=1.0`
/// becomes `Ns.Class`.
fn unqualified_class_name(class_name: &str) -> Option<&str> {
    let class_name = class_name.split(',').next().unwrap_or_default().trim();
    (!class_name.is_empty()).then_some(class_name)
}

/// Parses a .NET `TimeSpan` as written in TRX files: `[d.]hh:mm:ss[.fffffff]`.
pub(super) fn parse_duration(value: &str) -> Option<Duration> {
    let mut parts = value.trim().split(':');
    let (hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match hours.split_once('.') {
        Some((days, hours)) => (parse_digits(days)?, parse_digits(hours)?),
        None => (0, parse_digits(hours)?),
    };
    let minutes = parse_digits(minutes)?;
    let (seconds, fraction) = match seconds.split_once('.') {
        Some((seconds, fraction)) => (parse_digits(seconds)?, Some(fraction)),
        None => (parse_digits(seconds)?, None),
    };
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    let nanos = match fraction {
        Some(fraction) => {
            if fraction.is_empty() || fraction.len() > 9 {
                return None;
            }
            let digits = parse_digits(fraction)?;
            // Scale to nanoseconds: "5" is 500_000_000ns.
            u32::try_from(digits * 10u64.pow(9 - fraction.len() as u32)).ok()?
        }
        None => 0,
    };

    let total_seconds = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?;
    Some(Duration::new(total_seconds, nanos))
}

fn parse_digits(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Reads the whole input as UTF-8, skipping a UTF-8 byte order mark.
fn read_utf8(input: &mut dyn Read) -> Result<String, ConversionError> {
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|error| ConversionError::parser_init(ParserInitError::Read(error)))?;

    // UTF-32 marks must be checked before UTF-16 ones, since FF FE is a prefix of both.
    let unsupported: [(&[u8], &'static str); 4] = [
        (&[0xFF, 0xFE, 0x00, 0x00], "UTF-32LE"),
        (&[0x00, 0x00, 0xFE, 0xFF], "UTF-32BE"),
        (&[0xFF, 0xFE], "UTF-16LE"),
        (&[0xFE, 0xFF], "UTF-16BE"),
    ];
    if let Some(&(_, encoding)) = unsupported.iter().find(|(bom, _)| bytes.starts_with(bom)) {
        return Err(ConversionError::parser_init(
            ParserInitError::UnsupportedByteOrderMark { encoding },
        ));
    }
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    String::from_utf8(bytes).map_err(|error| {
        ConversionError::malformed_input(TrxFormatError::InvalidUtf8(error.utf8_error()))
    })
}

/// A minimal element tree. TRX files are small enough to hold in memory, and results refer to
/// definitions by id, so the whole document is needed before anything can be converted.
#[derive(Clone, Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children_named(name).next()
    }

    fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Returns the text of the element at `path` below this one, if it is non-empty.
    fn descendant_text(&self, path: &[&str]) -> Option<&str> {
        let mut element = self;
        for name in path {
            element = element.child(name)?;
        }
        (!element.text.is_empty()).then_some(element.text.as_str())
    }
}

fn parse_tree(text: &str) -> Result<Element, ConversionError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(ConversionError::malformed_input)? {
            Event::Decl(decl) => check_declared_encoding(&decl)?,
            Event::Start(start) => {
                let element = start_element(&start)?;
                if stack.is_empty() && root.is_some() {
                    return Err(multiple_roots(element));
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = start_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // The reader checks that end tags match start tags.
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(text) => {
                if let Some(element) = stack.last_mut() {
                    let text = text.unescape().map_err(ConversionError::malformed_input)?;
                    element.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(element) = stack.last_mut() {
                    let data = std::str::from_utf8(&data).map_err(|error| {
                        ConversionError::malformed_input(TrxFormatError::InvalidUtf8(error))
                    })?;
                    element.text.push_str(data);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(element) = stack.pop() {
        return Err(ConversionError::malformed_input(
            TrxFormatError::UnclosedElement {
                element: element.name,
            },
        ));
    }
    root.ok_or_else(|| ConversionError::malformed_input(TrxFormatError::MissingRoot))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ConversionError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(multiple_roots(element)),
        None => *root = Some(element),
    }
    Ok(())
}

fn multiple_roots(element: Element) -> ConversionError {
    ConversionError::malformed_input(TrxFormatError::MultipleRoots {
        element: element.name,
    })
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, ConversionError> {
    let name = utf8(start.local_name().as_ref())?.to_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(ConversionError::malformed_input)?;
        let key = utf8(attribute.key.local_name().as_ref())?.to_owned();
        let value = attribute
            .unescape_value()
            .map_err(ConversionError::malformed_input)?;
        attributes.push((key, value.into_owned()));
    }

    Ok(Element {
        name,
        attributes,
        ..Default::default()
    })
}

fn check_declared_encoding(decl: &BytesDecl<'_>) -> Result<(), ConversionError> {
    let Some(encoding) = decl.encoding() else {
        return Ok(());
    };
    let encoding = encoding.map_err(ConversionError::malformed_input)?;
    let encoding = String::from_utf8_lossy(&encoding);
    if SUPPORTED_ENCODINGS
        .iter()
        .any(|supported| encoding.eq_ignore_ascii_case(supported))
    {
        Ok(())
    } else {
        Err(ConversionError::parser_init(
            ParserInitError::UnsupportedEncoding {
                encoding: encoding.into_owned(),
            },
        ))
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, ConversionError> {
    std::str::from_utf8(bytes)
        .map_err(|error| ConversionError::malformed_input(TrxFormatError::InvalidUtf8(error)))
}
