//! Repository and commit identity resolution.
//!
//! Both resolvers walk an ordered list of sources and take the first
//! non-empty value, so the precedence stays auditable: explicit
//! configuration, then CI-provided environment, then (for the commit) the
//! local checkout.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use anyhow::{bail, Context};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use checkrelay_types::Repo;

use crate::config::RunConfig;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("malformed repository {value:?}: expected owner/name")]
    Malformed { value: String },
    #[error("missing repository configuration")]
    Missing,
}

// SSH-style remote as CI agents hand them out: `user@host:owner/name[.git]`.
static SSH_REMOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+:(.+)/(.+)$").expect("remote pattern is valid")
});

pub fn resolve_repo(
    cfg: &RunConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Repo, IdentityError> {
    let owner_name_sources = [
        ("configuration", cfg.github_repo.clone()),
        ("$GITHUB_REPOSITORY", env("GITHUB_REPOSITORY")),
    ];
    for (source, value) in owner_name_sources {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            debug!(source, repo = %value, "using repository");
            return split_owner_name(&value);
        }
    }

    if let Some(remote) = env("BUILDKITE_REPO").filter(|v| !v.is_empty()) {
        if let Some(repo) = parse_ssh_remote(&remote) {
            debug!(remote = %remote, repo = %repo, "using repository from $BUILDKITE_REPO");
            return Ok(repo);
        }
        debug!(remote = %remote, "$BUILDKITE_REPO is not an SSH-style remote");
    }

    Err(IdentityError::Missing)
}

fn split_owner_name(value: &str) -> Result<Repo, IdentityError> {
    let mut parts = value.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(Repo {
            owner: owner.to_string(),
            name: name.to_string(),
        }),
        _ => Err(IdentityError::Malformed {
            value: value.to_string(),
        }),
    }
}

fn parse_ssh_remote(remote: &str) -> Option<Repo> {
    let caps = SSH_REMOTE_REGEX.captures(remote)?;
    let name = caps[2].strip_suffix(".git").unwrap_or(&caps[2]);
    if name.is_empty() {
        return None;
    }
    Some(Repo {
        owner: caps[1].to_string(),
        name: name.to_string(),
    })
}

pub fn resolve_head_sha(
    cfg: &RunConfig,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<String> {
    let sources = [
        ("configuration", cfg.commit_sha.clone()),
        ("$BUILDKITE_COMMIT", env("BUILDKITE_COMMIT")),
        ("$GITHUB_SHA", env("GITHUB_SHA")),
    ];
    for (source, value) in sources {
        if let Some(sha) = value.filter(|v| !v.is_empty()) {
            debug!(source, sha = %sha, "using commit SHA");
            return Ok(sha);
        }
    }

    // Last resort: ask the local checkout.
    git_head_sha(Path::new("."))
}

fn git_head_sha(dir: &Path) -> anyhow::Result<String> {
    let out = Command::new("git")
        .current_dir(dir)
        .args(["rev-parse", "HEAD"])
        .output()
        .context("run git rev-parse HEAD")?;
    if !out.status.success() {
        bail!(
            "git rev-parse HEAD failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if sha.is_empty() {
        bail!("git rev-parse HEAD produced no output");
    }
    Ok(sha)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn cfg_with_repo(value: &str) -> RunConfig {
        RunConfig {
            github_repo: Some(value.to_string()),
            ..RunConfig::default()
        }
    }

    #[test]
    fn malformed_configured_repo() {
        for value in ["foo-bar.git", "a/b/c", "foo/", "/bar", "/"] {
            let err = resolve_repo(&cfg_with_repo(value), no_env).expect_err(value);
            assert!(matches!(err, IdentityError::Malformed { .. }), "{value}");
        }
    }

    #[test]
    fn configured_owner_name() {
        let repo = resolve_repo(&cfg_with_repo("foo/bar"), no_env).expect("resolve");
        assert_eq!(repo.owner, "foo");
        assert_eq!(repo.name, "bar");
    }

    #[test]
    fn configuration_wins_over_environment() {
        let env = |key: &str| (key == "GITHUB_REPOSITORY").then(|| "env/repo".to_string());
        let repo = resolve_repo(&cfg_with_repo("cfg/repo"), env).expect("resolve");
        assert_eq!(repo.to_string(), "cfg/repo");
    }

    #[test]
    fn github_repository_environment_value() {
        let env = |key: &str| (key == "GITHUB_REPOSITORY").then(|| "octocat/hello".to_string());
        let repo = resolve_repo(&RunConfig::default(), env).expect("resolve");
        assert_eq!(repo.to_string(), "octocat/hello");
    }

    #[test]
    fn buildkite_ssh_remote() {
        let env =
            |key: &str| (key == "BUILDKITE_REPO").then(|| "git@github.com:org/with-dashes.git".to_string());
        let repo = resolve_repo(&RunConfig::default(), env).expect("resolve");
        assert_eq!(repo.owner, "org");
        assert_eq!(repo.name, "with-dashes");
    }

    #[test]
    fn trailing_git_is_stripped_exactly_once() {
        let env =
            |key: &str| (key == "BUILDKITE_REPO").then(|| "git@github.com:org/borg.git".to_string());
        let repo = resolve_repo(&RunConfig::default(), env).expect("resolve");
        assert_eq!(repo.name, "borg");

        let env =
            |key: &str| (key == "BUILDKITE_REPO").then(|| "git@github.com:org/repo.git.git".to_string());
        let repo = resolve_repo(&RunConfig::default(), env).expect("resolve");
        assert_eq!(repo.name, "repo.git");
    }

    #[test]
    fn non_ssh_buildkite_remote_is_missing_not_malformed() {
        let env = |key: &str| {
            (key == "BUILDKITE_REPO").then(|| "ssh://github.com:org|with-dashes.git".to_string())
        };
        let err = resolve_repo(&RunConfig::default(), env).expect_err("no match");
        assert!(matches!(err, IdentityError::Missing));
    }

    #[test]
    fn nothing_configured_is_missing() {
        let err = resolve_repo(&RunConfig::default(), no_env).expect_err("missing");
        assert!(matches!(err, IdentityError::Missing));
    }

    #[test]
    fn configured_sha_wins() {
        let cfg = RunConfig {
            commit_sha: Some("my-sha".to_string()),
            ..RunConfig::default()
        };
        let env = |key: &str| (key == "BUILDKITE_COMMIT").then(|| "other".to_string());
        let sha = resolve_head_sha(&cfg, env).expect("resolve");
        assert_eq!(sha, "my-sha");
    }

    #[test]
    fn buildkite_commit_wins_over_github_sha() {
        let env = |key: &str| match key {
            "BUILDKITE_COMMIT" => Some("bk-sha".to_string()),
            "GITHUB_SHA" => Some("gh-sha".to_string()),
            _ => None,
        };
        let sha = resolve_head_sha(&RunConfig::default(), env).expect("resolve");
        assert_eq!(sha, "bk-sha");
    }

    #[test]
    fn head_sha_from_local_checkout() {
        if Command::new("git").arg("--version").output().is_err() {
            return; // git unavailable on this machine
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let run_git = |args: &[&str]| {
            let out = Command::new("git")
                .current_dir(dir.path())
                .args(args)
                .output()
                .expect("git should run");
            assert!(
                out.status.success(),
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&out.stderr)
            );
        };

        run_git(&["init"]);
        run_git(&["config", "user.email", "test@example.com"]);
        run_git(&["config", "user.name", "Test"]);
        std::fs::write(dir.path().join("file"), "content").expect("write");
        run_git(&["add", "."]);
        run_git(&["commit", "-m", "base"]);

        let sha = git_head_sha(dir.path()).expect("sha");
        assert_eq!(sha.len(), 40);
    }

    #[test]
    fn git_failure_surfaces_as_error() {
        if Command::new("git").arg("--version").output().is_err() {
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        // Not a repository: rev-parse exits non-zero.
        assert!(git_head_sha(dir.path()).is_err());
    }
}
