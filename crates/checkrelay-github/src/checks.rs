use thiserror::Error;
use tracing::{debug, warn};

use checkrelay_types::{CheckRun, Repo, MAX_ANNOTATIONS_PER_REQUEST};

use crate::transport::{Transport, TransportError};

const CHECKS_ACCEPT: (&str, &str) = ("Accept", "application/vnd.github.antiope-preview+json");

/// Submission seam for check runs. The reporter only ever needs this one
/// call.
pub trait CheckClient {
    fn create_check(&self, check: &CheckRun) -> Result<(), ReportError>;
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("error response from GitHub ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Check-run client bound to one repository and one bearer token.
pub struct GithubChecks<'a> {
    transport: &'a dyn Transport,
    bearer: String,
    repo: Repo,
}

impl<'a> GithubChecks<'a> {
    pub fn new(transport: &'a dyn Transport, token: &str, repo: Repo) -> Self {
        Self {
            transport,
            bearer: format!("Bearer {token}"),
            repo,
        }
    }
}

impl CheckClient for GithubChecks<'_> {
    fn create_check(&self, check: &CheckRun) -> Result<(), ReportError> {
        let mut check = check.clone();
        if let Some(output) = check.output.as_mut() {
            if output.annotations.len() > MAX_ANNOTATIONS_PER_REQUEST {
                warn!(
                    provided = output.annotations.len(),
                    "more than {MAX_ANNOTATIONS_PER_REQUEST} annotations provided, only sending the first {MAX_ANNOTATIONS_PER_REQUEST}"
                );
                output.annotations.truncate(MAX_ANNOTATIONS_PER_REQUEST);
            }
        }

        let path = format!("repos/{}/{}/check-runs", self.repo.owner, self.repo.name);
        let body = serde_json::to_value(&check).map_err(TransportError::from)?;
        let (status, resp) = self.transport.post_json(
            &path,
            &body,
            &[("Authorization", &self.bearer), CHECKS_ACCEPT],
        )?;

        debug!(status, "got check create response");
        if status != 201 {
            return Err(ReportError::Rejected {
                status,
                body: resp.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::{json, Value};

    use checkrelay_types::{
        Annotation, CheckConclusion, CheckStatus, ParseResult, Severity,
    };

    use super::*;

    struct StubTransport {
        status: u16,
        posts: RefCell<Vec<(String, Value)>>,
    }

    impl StubTransport {
        fn with_status(status: u16) -> Self {
            Self {
                status,
                posts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for StubTransport {
        fn get_json(
            &self,
            path: &str,
            _headers: &[(&str, &str)],
        ) -> Result<(u16, Value), TransportError> {
            panic!("unexpected GET {path}");
        }

        fn post_json(
            &self,
            path: &str,
            body: &Value,
            _headers: &[(&str, &str)],
        ) -> Result<(u16, Value), TransportError> {
            self.posts
                .borrow_mut()
                .push((path.to_string(), body.clone()));
            Ok((self.status, json!({})))
        }
    }

    fn annotation(line: u32) -> Annotation {
        Annotation {
            path: "src/lib.rs".to_string(),
            line,
            end_line: line,
            column: None,
            message: format!("finding {line}"),
            severity: Severity::Warning,
        }
    }

    fn completed_run(annotations: Vec<Annotation>) -> CheckRun {
        CheckRun {
            name: "golint".to_string(),
            head_sha: "abc123".to_string(),
            status: CheckStatus::Completed,
            conclusion: Some(CheckConclusion::Failure),
            details_url: None,
            output: Some(ParseResult {
                title: "title".to_string(),
                summary: "summary".to_string(),
                annotations,
            }),
        }
    }

    fn repo() -> Repo {
        Repo {
            owner: "octocat".to_string(),
            name: "hello-world".to_string(),
        }
    }

    #[test]
    fn posts_to_the_repository_check_runs_endpoint() {
        let transport = StubTransport::with_status(201);
        let client = GithubChecks::new(&transport, "token", repo());

        client
            .create_check(&completed_run(vec![annotation(1)]))
            .expect("create check");

        let posts = transport.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "repos/octocat/hello-world/check-runs");
        assert_eq!(posts[0].1["head_sha"], "abc123");
        assert_eq!(posts[0].1["status"], "completed");
    }

    #[test]
    fn truncates_annotations_to_the_api_limit() {
        let transport = StubTransport::with_status(201);
        let client = GithubChecks::new(&transport, "token", repo());

        let run = completed_run((1..=100).map(annotation).collect());
        client.create_check(&run).expect("create check");

        let posts = transport.posts.borrow();
        let sent = posts[0].1["output"]["annotations"]
            .as_array()
            .expect("annotations array");
        assert_eq!(sent.len(), MAX_ANNOTATIONS_PER_REQUEST);
        // First 50 in input order, not an arbitrary subset.
        assert_eq!(sent[0]["start_line"], 1);
        assert_eq!(sent[49]["start_line"], 50);

        // The caller's value is untouched.
        assert_eq!(
            run.output.as_ref().expect("output").annotations.len(),
            100
        );
    }

    #[test]
    fn in_progress_run_is_sent_without_output() {
        let transport = StubTransport::with_status(201);
        let client = GithubChecks::new(&transport, "token", repo());

        let run = CheckRun {
            name: "golint".to_string(),
            head_sha: "abc123".to_string(),
            status: CheckStatus::InProgress,
            conclusion: None,
            details_url: None,
            output: None,
        };
        client.create_check(&run).expect("create check");

        let posts = transport.posts.borrow();
        let obj = posts[0].1.as_object().expect("object");
        assert_eq!(obj["status"], "in_progress");
        assert!(!obj.contains_key("conclusion"));
        assert!(!obj.contains_key("output"));
    }

    #[test]
    fn non_201_response_is_an_error() {
        let transport = StubTransport::with_status(404);
        let client = GithubChecks::new(&transport, "token", repo());

        let err = client
            .create_check(&completed_run(vec![]))
            .expect_err("rejected");
        assert!(matches!(err, ReportError::Rejected { status: 404, .. }));
    }
}
