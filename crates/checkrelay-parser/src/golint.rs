use std::io::BufRead;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use checkrelay_types::{Annotation, Severity};

use crate::engine::{group_str, parse_num, ExtractError, Regexer};

// golint (and most gofmt-family tools) emit `path:line:column: message`.
static GOLINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*):([0-9]+):([0-9]+): (.*)$").expect("golint pattern is valid")
});

/// Parser for golint-style output. Every finding is a warning.
pub fn golint<R: BufRead>(
    reader: R,
) -> Regexer<R, fn(&Captures<'_>) -> Result<Annotation, ExtractError>> {
    Regexer::new(GOLINT_REGEX.clone(), extract_golint, reader)
}

fn extract_golint(caps: &Captures<'_>) -> Result<Annotation, ExtractError> {
    let line = parse_num("line", group_str(caps, 2)?)?;
    let column = parse_num("column", group_str(caps, 3)?)?;

    Ok(Annotation {
        path: group_str(caps, 1)?.to_string(),
        line,
        end_line: line,
        column: Some(column),
        message: group_str(caps, 4)?.to_string(),
        severity: Severity::Warning,
    })
}

#[cfg(test)]
mod tests {
    use crate::Parser;

    use super::*;

    #[test]
    fn valid_matches() {
        let input = "\ncmd/root.go:35:1: exported function Execute should have comment or be unexported\nnot a valid line\n";
        let result = golint(input.as_bytes()).run().expect("run");

        assert_eq!(result.annotations.len(), 1);
        let a = &result.annotations[0];
        assert_eq!(a.path, "cmd/root.go");
        assert_eq!(a.line, 35);
        assert_eq!(a.end_line, 35);
        assert_eq!(a.column, Some(1));
        assert_eq!(a.severity, Severity::Warning);
        assert_eq!(
            a.message,
            "exported function Execute should have comment or be unexported"
        );
    }

    #[test]
    fn non_numeric_line_is_skipped_not_fatal() {
        let result = golint(&b"foo/bar.go:abcd:1234: foo bar"[..])
            .run()
            .expect("run");
        assert!(result.annotations.is_empty());
    }

    #[test]
    fn empty_input_yields_no_annotations() {
        let result = golint(&b""[..]).run().expect("run");
        assert!(result.annotations.is_empty());
    }
}
