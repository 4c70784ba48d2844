use std::io::BufRead;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::warn;

use checkrelay_types::{Annotation, ParseResult};

/// The general interface to a result parser.
pub trait Parser {
    /// Consume the input stream front to back and collect annotations.
    fn run(&mut self) -> Result<ParseResult, ParseError>;
}

/// A stream-level failure. Aborts the whole run, unlike per-line
/// [`ExtractError`]s which only drop the offending line.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("read input: {0}")]
    Io(#[from] std::io::Error),
}

/// A per-line extraction failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("capture group {0} out of bounds for match")]
    MissingGroup(usize),
    #[error("invalid {field} number {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Generic line matcher: applies `regex` to every input line and feeds each
/// match through `extract`.
pub struct Regexer<R, F> {
    regex: Regex,
    extract: F,
    reader: R,
}

impl<R, F> Regexer<R, F> {
    pub fn new(regex: Regex, extract: F, reader: R) -> Self {
        Self {
            regex,
            extract,
            reader,
        }
    }
}

impl<R, F> Parser for Regexer<R, F>
where
    R: BufRead,
    F: FnMut(&Captures<'_>) -> Result<Annotation, ExtractError>,
{
    fn run(&mut self) -> Result<ParseResult, ParseError> {
        let mut annotations = Vec::new();

        for line in self.reader.by_ref().lines() {
            let line = line?;
            let Some(caps) = self.regex.captures(&line) else {
                // Not every line of tool output is a diagnostic.
                continue;
            };
            match (self.extract)(&caps) {
                Ok(annotation) => annotations.push(annotation),
                Err(err) => warn!(%err, line, "unable to extract annotation from line"),
            }
        }

        Ok(ParseResult {
            annotations,
            ..ParseResult::default()
        })
    }
}

/// Capture group `pos` as text, or the per-line error the profile contracts
/// require when the group did not participate in the match.
pub(crate) fn group_str<'c>(caps: &'c Captures<'_>, pos: usize) -> Result<&'c str, ExtractError> {
    caps.get(pos)
        .map(|m| m.as_str())
        .ok_or(ExtractError::MissingGroup(pos))
}

pub(crate) fn parse_num(field: &'static str, value: &str) -> Result<u32, ExtractError> {
    value.parse().map_err(|_| ExtractError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
