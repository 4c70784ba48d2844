use std::io::BufRead;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use checkrelay_types::{Annotation, Severity};

use crate::engine::{group_str, parse_num, ExtractError, Regexer};

// mypy emits `path:line: severity-word: message`. The severity word (group 3)
// is captured but not trusted: every finding is reported as an error.
static MYPY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*):([0-9]+): (\w*): (.*)$").expect("mypy pattern is valid"));

/// Parser for mypy-style output.
pub fn mypy<R: BufRead>(
    reader: R,
) -> Regexer<R, fn(&Captures<'_>) -> Result<Annotation, ExtractError>> {
    Regexer::new(MYPY_REGEX.clone(), extract_mypy, reader)
}

fn extract_mypy(caps: &Captures<'_>) -> Result<Annotation, ExtractError> {
    let line = parse_num("line", group_str(caps, 2)?)?;

    Ok(Annotation {
        path: group_str(caps, 1)?.to_string(),
        line,
        end_line: line,
        column: None,
        message: group_str(caps, 4)?.to_string(),
        severity: Severity::Error,
    })
}
