use regex::Captures;

use checkrelay_types::{Annotation, Severity};

use crate::engine::{group_str, parse_num, ExtractError};

/// Capture-group layout for a user-supplied pattern. Positions are 1-based
/// group indexes, matching what the `--*-pos` flags declare.
#[derive(Debug, Clone, Copy)]
pub struct GenericSpec {
    pub path_pos: usize,
    pub line_pos: usize,
    pub message_pos: usize,
    pub column_pos: Option<usize>,
    /// Report matches as warnings instead of errors.
    pub warn: bool,
}

/// Build an extraction function for an arbitrary user pattern.
///
/// A declared path/line/message position the pattern does not populate for a
/// given line is an extraction error for that line only. A declared column
/// position that is absent from the match is tolerated (no column); a column
/// that is present but non-numeric is an extraction error.
pub fn generic_extractor(
    spec: GenericSpec,
) -> impl FnMut(&Captures<'_>) -> Result<Annotation, ExtractError> {
    let severity = if spec.warn {
        Severity::Warning
    } else {
        Severity::Error
    };

    move |caps: &Captures<'_>| {
        let column = match spec.column_pos {
            Some(pos) => match caps.get(pos) {
                Some(m) => Some(parse_num("column", m.as_str())?),
                None => None,
            },
            None => None,
        };

        let path = group_str(caps, spec.path_pos)?;
        let line = parse_num("line", group_str(caps, spec.line_pos)?)?;
        let message = group_str(caps, spec.message_pos)?;

        Ok(Annotation {
            path: path.to_string(),
            line,
            end_line: line,
            column,
            message: message.to_string(),
            severity,
        })
    }
}
