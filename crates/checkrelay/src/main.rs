//! checkrelay CLI: one subcommand per supported tool plus a generic `regex`
//! subcommand, all feeding the same reporting pipeline.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use regex::Regex;
use tracing::{debug, error};

use checkrelay_github::{AuthProvider, GithubChecks, HttpTransport};
use checkrelay_parser::{generic_extractor, golint, mypy, GenericSpec, Regexer};

mod config;
mod repo;
mod runner;

use config::CommonArgs;
use runner::{Runner, EXIT_AUTH, EXIT_BAD_USAGE, EXIT_IDENTITY_OR_PARSE, EXIT_OK};

#[derive(Parser)]
#[command(name = "checkrelay")]
#[command(version, about = "Report lint tool output as GitHub checks from CI", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse golint-style output (`path:line:column: message`).
    Golint(ReportArgs),

    /// Parse mypy-style output (`path:line: severity: message`).
    Mypy(ReportArgs),

    /// Parse results via a user-supplied regular expression.
    Regex(RegexArgs),

    /// Verify checkrelay is configured properly for GitHub auth.
    CheckAuth(CheckAuthArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// Input file with tool output (defaults to stdin).
    file: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct RegexArgs {
    /// Check name to report under.
    #[arg(long)]
    name: String,

    /// Regular expression with capture groups for the positions below.
    #[arg(long)]
    regex: String,

    /// Capture group position for the path.
    #[arg(long, default_value_t = 1)]
    path_pos: usize,

    /// Capture group position for the line number.
    #[arg(long, default_value_t = 2)]
    line_pos: usize,

    /// Capture group position for the message.
    #[arg(long, default_value_t = 3)]
    message_pos: usize,

    /// Capture group position for the column, if the tool reports one.
    #[arg(long)]
    column_pos: Option<usize>,

    /// Treat matches as warnings instead of errors.
    #[arg(long)]
    warn: bool,

    /// Input file with tool output (defaults to stdin).
    file: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CheckAuthArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Golint(args) => {
            let input = match open_input(args.file.as_deref()) {
                Ok(input) => input,
                Err(err) => {
                    error!(%err, "unable to open input");
                    return Ok(EXIT_BAD_USAGE);
                }
            };
            let mut parser = golint(input);
            run_report("golint", &mut parser, &args.common)
        }
        Commands::Mypy(args) => {
            let input = match open_input(args.file.as_deref()) {
                Ok(input) => input,
                Err(err) => {
                    error!(%err, "unable to open input");
                    return Ok(EXIT_BAD_USAGE);
                }
            };
            let mut parser = mypy(input);
            run_report("mypy", &mut parser, &args.common)
        }
        Commands::Regex(args) => cmd_regex(args),
        Commands::CheckAuth(args) => cmd_check_auth(args),
    }
}

fn cmd_regex(args: RegexArgs) -> Result<i32> {
    let regex = match Regex::new(&args.regex) {
        Ok(regex) => regex,
        Err(err) => {
            error!(%err, "unable to compile regular expression");
            return Ok(EXIT_BAD_USAGE);
        }
    };

    let input = match open_input(args.file.as_deref()) {
        Ok(input) => input,
        Err(err) => {
            error!(%err, "unable to open input");
            return Ok(EXIT_BAD_USAGE);
        }
    };

    let spec = GenericSpec {
        path_pos: args.path_pos,
        line_pos: args.line_pos,
        message_pos: args.message_pos,
        column_pos: args.column_pos.filter(|pos| *pos > 0),
        warn: args.warn,
    };
    let mut parser = Regexer::new(regex, generic_extractor(spec), input);
    run_report(&args.name, &mut parser, &args.common)
}

fn cmd_check_auth(args: CheckAuthArgs) -> Result<i32> {
    let cfg = args.common.run_config();

    let repo = match repo::resolve_repo(&cfg, os_env) {
        Ok(repo) => repo,
        Err(err) => {
            error!(%err, "unable to determine repository");
            return Ok(EXIT_IDENTITY_OR_PARSE);
        }
    };

    let transport = HttpTransport::new(args.common.api_base.as_str()).context("build API client")?;
    let provider = AuthProvider::new(args.common.auth_config());
    match provider.get_token(&repo, &default_permissions(), &transport) {
        Ok(credential) => {
            match credential.expires_at {
                Some(expires_at) => {
                    println!("Auth OK for {repo} (token expires {expires_at})");
                }
                None => println!("Auth OK for {repo}"),
            }
            Ok(EXIT_OK)
        }
        Err(err) => {
            error!(%err, "auth check failed");
            Ok(EXIT_AUTH)
        }
    }
}

/// Shared tail of every parse subcommand: resolve identity and credential,
/// then hand off to the reporter.
fn run_report(
    name: &str,
    parser: &mut dyn checkrelay_parser::Parser,
    common: &CommonArgs,
) -> Result<i32> {
    let cfg = common.run_config();

    let repo = match repo::resolve_repo(&cfg, os_env) {
        Ok(repo) => repo,
        Err(err) => {
            error!(%err, "unable to determine repository");
            return Ok(EXIT_IDENTITY_OR_PARSE);
        }
    };

    let head_sha = match repo::resolve_head_sha(&cfg, os_env) {
        Ok(sha) => sha,
        Err(err) => {
            error!(err = %err, "unable to read head SHA, cannot continue");
            return Ok(EXIT_IDENTITY_OR_PARSE);
        }
    };

    let transport = HttpTransport::new(common.api_base.as_str()).context("build API client")?;
    let provider = AuthProvider::new(common.auth_config());
    let credential = match provider.get_token(&repo, &default_permissions(), &transport) {
        Ok(credential) => credential,
        Err(err) => {
            error!(%err, "unable to get GitHub token");
            return Ok(EXIT_AUTH);
        }
    };
    debug!("got GitHub checks token");

    let client = GithubChecks::new(&transport, &credential.token, repo);
    let runner = Runner {
        name,
        config: &cfg,
    };
    Ok(runner.run(parser, &client, &head_sha))
}

fn default_permissions() -> BTreeMap<String, String> {
    BTreeMap::from([("checks".to_string(), "write".to_string())])
}

fn os_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("open input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
