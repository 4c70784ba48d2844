use clap::Args;

use checkrelay_github::{AuthConfig, DEFAULT_API_BASE};

/// Auth, identity, and reporting flags shared by every subcommand.
///
/// Every flag also reads an environment variable so CI pipelines can
/// configure the tool without touching their command lines.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Explicit GitHub token; when set, no app-credential exchange happens.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub application ID (numeric).
    #[arg(long, short = 'a', env = "CHECKRELAY_APPLICATION_ID")]
    pub application_id: Option<u64>,

    /// GitHub installation ID (numeric); skips the per-repository lookup.
    #[arg(long, short = 'i', env = "CHECKRELAY_INSTALLATION_ID")]
    pub installation_id: Option<u64>,

    /// GitHub application private key (path or inline PEM).
    #[arg(long, short = 'p', env = "CHECKRELAY_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// GitHub repository (e.g. 'octocat/hello-world').
    #[arg(long, short = 'r', env = "CHECKRELAY_GITHUB_REPO")]
    pub github_repo: Option<String>,

    /// Commit SHA to report status checks for.
    #[arg(long, short = 'c', env = "CHECKRELAY_COMMIT_SHA")]
    pub commit_sha: Option<String>,

    /// GitHub API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Exit zero even when the tool reports issues.
    #[arg(long, short = 'z')]
    pub exit_zero: bool,

    /// Only leave annotations, never mark the check as failed.
    #[arg(long, short = 'o')]
    pub annotate_only: bool,

    /// Report the check as in-progress before parsing starts.
    #[arg(long)]
    pub mark_in_progress: bool,

    /// Details URL to attach to the check run (e.g. the CI build page).
    #[arg(long, env = "CHECKRELAY_DETAILS_URL")]
    pub details_url: Option<String>,
}

/// The subset of configuration the resolver and reporter consume.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub github_repo: Option<String>,
    pub commit_sha: Option<String>,
    pub details_url: Option<String>,
    pub exit_zero: bool,
    pub annotate_only: bool,
    pub mark_in_progress: bool,
}

impl CommonArgs {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            github_repo: self.github_repo.clone(),
            commit_sha: self.commit_sha.clone(),
            details_url: self.details_url.clone(),
            exit_zero: self.exit_zero,
            annotate_only: self.annotate_only,
            mark_in_progress: self.mark_in_progress,
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            github_token: self.github_token.clone(),
            application_id: self.application_id,
            installation_id: self.installation_id,
            private_key: self.private_key.clone(),
        }
    }
}
