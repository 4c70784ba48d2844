//! The check reporter: parse → (optional in-progress mark) → completed
//! submission → process exit code.
//!
//! Transitions are strictly forward and exactly one completed check run is
//! transmitted per invocation. Only the in-progress placeholder is best
//! effort; a failure on the final submission is never swallowed, because it
//! means CI has no record of the result.

use tracing::{debug, error, info, warn};

use checkrelay_github::CheckClient;
use checkrelay_parser::Parser;
use checkrelay_types::{CheckConclusion, CheckRun, CheckStatus, ParseResult, Severity};

use crate::config::RunConfig;

// Process exit codes shared by every subcommand.
pub const EXIT_OK: i32 = 0;
pub const EXIT_ISSUES_FOUND: i32 = 1;
pub const EXIT_BAD_USAGE: i32 = 2;
pub const EXIT_IDENTITY_OR_PARSE: i32 = 3;
pub const EXIT_AUTH: i32 = 4;
pub const EXIT_REPORT: i32 = 5;

pub struct Runner<'a> {
    pub name: &'a str,
    pub config: &'a RunConfig,
}

impl Runner<'_> {
    /// Drive one reporting pipeline. Identity and credential resolution
    /// happen in the command layer; this takes the resolved head SHA and an
    /// authenticated client.
    pub fn run(
        &self,
        parser: &mut dyn Parser,
        client: &dyn CheckClient,
        head_sha: &str,
    ) -> i32 {
        let mut run = CheckRun {
            name: self.name.to_string(),
            head_sha: head_sha.to_string(),
            status: CheckStatus::Completed,
            conclusion: None,
            details_url: self.config.details_url.clone(),
            output: None,
        };

        if self.config.mark_in_progress {
            let placeholder = CheckRun {
                status: CheckStatus::InProgress,
                conclusion: None,
                output: None,
                ..run.clone()
            };
            if let Err(err) = client.create_check(&placeholder) {
                warn!(%err, "unable to mark check in progress");
            }
        }

        debug!("parsing {} results", self.name);
        let result = match parser.run() {
            Ok(result) => result,
            Err(err) => {
                error!(%err, "error parsing {} results", self.name);
                run.conclusion = Some(CheckConclusion::Failure);
                run.output = Some(ParseResult {
                    title: self.name.to_string(),
                    summary: format!("Parsing {} output failed: {err}", self.name),
                    annotations: Vec::new(),
                });
                if let Err(report_err) = client.create_check(&run) {
                    error!(%report_err, "unable to create check for parse failure");
                } else {
                    info!("created check as failure for parse error");
                }
                return EXIT_IDENTITY_OR_PARSE;
            }
        };

        self.report_results(run, result, client)
    }

    fn report_results(
        &self,
        mut run: CheckRun,
        mut result: ParseResult,
        client: &dyn CheckClient,
    ) -> i32 {
        let errors = count_severity(&result, Severity::Error);
        let warnings = count_severity(&result, Severity::Warning);
        let summary = render_summary(errors, warnings);
        result.title = capitalize(&summary);
        result.summary = summary;

        let conclusion = if result.annotations.is_empty() {
            info!("no violations reported from {}", self.name);
            CheckConclusion::Success
        } else if self.config.annotate_only {
            info!("got {} annotations, reporting neutral", result.annotations.len());
            CheckConclusion::Neutral
        } else {
            info!("got {} annotations", result.annotations.len());
            CheckConclusion::Failure
        };

        run.conclusion = Some(conclusion);
        run.output = Some(result);

        if let Err(err) = client.create_check(&run) {
            error!(%err, "unable to create GitHub check");
            return EXIT_REPORT;
        }

        match conclusion {
            CheckConclusion::Success | CheckConclusion::Neutral => {
                debug!("successfully reported check");
                EXIT_OK
            }
            CheckConclusion::Failure if self.config.exit_zero => {
                debug!("reported failure, exiting 0 at user request");
                EXIT_OK
            }
            CheckConclusion::Failure => {
                info!("exiting 1 due to issues found by tool; pass --exit-zero to disable this behavior");
                EXIT_ISSUES_FOUND
            }
        }
    }
}

fn count_severity(result: &ParseResult, severity: Severity) -> usize {
    result
        .annotations
        .iter()
        .filter(|a| a.severity == severity)
        .count()
}

/// `"N error(s)[ and M warning(s)]"`, or `"no issues"` when both counts are
/// zero. Nouns are pluralized only above one.
pub fn render_summary(errors: usize, warnings: usize) -> String {
    if errors == 0 && warnings == 0 {
        return "no issues".to_string();
    }

    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(pluralize(errors, "error"));
    }
    if warnings > 0 {
        parts.push(pluralize(warnings, "warning"));
    }
    parts.join(" and ")
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
