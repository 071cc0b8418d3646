mod config;
mod pr;
mod report;

use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use config::{ColorChoice, Config, ConfigError};
use pr::{ClientError, FeedbackError, GhCli, GitHubClient, RepoName};
use report::{Format, ReportError, Theme};

const EXAMPLES: &str = "\
Examples:
  gh pr-feedback                        # Current PR in current directory
  gh pr-feedback 117                    # PR 117 in current repo
  gh pr-feedback 117 --repo owner/name  # PR 117 in specified repo
  gh pr-feedback /path/to/repo          # Current PR in specified directory";

/// Extracts unresolved review feedback and failing checks from a PR.
#[derive(Parser, Debug)]
#[command(name = "gh-pr-feedback", about, after_help = EXAMPLES)]
struct Cli {
    /// PR number to view feedback for, or path to a git repository
    /// (default: current directory)
    #[arg(value_name = "PR_NUMBER|DIRECTORY")]
    targets: Vec<String>,

    /// Output in JSON format
    #[arg(short, long)]
    json: bool,

    /// Repository name (owner/name)
    #[arg(short = 'R', long, value_name = "OWNER/NAME")]
    repo: Option<RepoName>,

    /// Show version
    #[arg(short = 'v', long)]
    version: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error("Error changing to directory '{}': {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Error creating GitHub client: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl AppError {
    fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::Feedback(FeedbackError::NoActivePr { .. }) => Some(
                "\nMake sure you're in a git repository with an open PR.\n\
                 You can check PR status with: gh pr status\n\
                 Or specify a PR number: gh pr-feedback 123 --repo owner/name",
            ),
            AppError::Feedback(FeedbackError::RepoUnknown { .. }) => {
                Some("Use --repo to specify the repository (e.g., --repo owner/name)")
            }
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if cli.version {
        println!("gh-pr-feedback v{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            if let Some(hint) = err.hint() {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let (pr_number, directory) = split_targets(&cli.targets);
    if let Some(dir) = directory {
        enter_directory(&dir)?;
    }

    info!("loading configuration");
    let config = Config::load()?;
    let gh = GhCli::new(config.gh_program());

    let token = match config.github_token() {
        Some(token) => token,
        None => {
            debug!("no token configured, asking gh");
            gh.auth_token().await.map_err(ClientError::TokenLookup)?
        }
    };
    let client = GitHubClient::new(&config.api_url(), token)?;

    let target = pr::resolve_target(&gh, pr_number, cli.repo).await?;
    let span = info_span!("pr_feedback", repo = %target.repo, pr = target.pr_number);

    let feedback = pr::fetch_feedback(&client, &gh, &target)
        .instrument(span.clone())
        .await?;

    let _entered = span.enter();
    let format = if cli.json { Format::Json } else { Format::Human };
    let now = chrono::Utc::now();
    if config.output.color == ColorChoice::Always {
        colored::control::set_override(true);
    }
    report::output(&feedback, format, now, Theme::for_choice(config.output.color))?;
    info!("done");

    Ok(())
}

/// The first positive integer is the PR number, the first other value is
/// the working directory. Anything after those is ignored.
fn split_targets(targets: &[String]) -> (Option<u64>, Option<PathBuf>) {
    let mut pr_number = None;
    let mut directory = None;
    for target in targets {
        match target.parse::<u64>() {
            Ok(number) if number > 0 => {
                pr_number.get_or_insert(number);
            }
            _ => {
                directory.get_or_insert_with(|| PathBuf::from(target));
            }
        }
    }
    (pr_number, directory)
}

fn enter_directory(dir: &Path) -> Result<(), AppError> {
    if !dir.exists() {
        return Err(AppError::Usage(format!(
            "Directory '{}' does not exist",
            dir.display()
        )));
    }
    std::env::set_current_dir(dir).map_err(|source| AppError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!(dir = %dir.display(), "changed working directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_split_targets_number_and_directory() {
        let (number, dir) = split_targets(&strings(&["117", "../repo"]));
        assert_eq!(number, Some(117));
        assert_eq!(dir, Some(PathBuf::from("../repo")));
    }

    #[test]
    fn test_split_targets_first_wins() {
        let (number, dir) = split_targets(&strings(&["a", "5", "b", "9"]));
        assert_eq!(number, Some(5));
        assert_eq!(dir, Some(PathBuf::from("a")));
    }

    #[test]
    fn test_split_targets_zero_is_directory() {
        let (number, dir) = split_targets(&strings(&["0"]));
        assert_eq!(number, None);
        assert_eq!(dir, Some(PathBuf::from("0")));
    }

    #[test]
    fn test_split_targets_empty() {
        assert_eq!(split_targets(&[]), (None, None));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["gh-pr-feedback", "-j", "-R", "octo/widgets", "42"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.repo, Some("octo/widgets".parse().unwrap()));
        assert_eq!(cli.targets, vec!["42".to_string()]);
        assert!(!cli.version);
    }

    #[test]
    fn test_cli_version_flag() {
        let cli = Cli::try_parse_from(["gh-pr-feedback", "-v"]).unwrap();
        assert!(cli.version);
    }

    #[test]
    fn test_cli_repo_requires_value() {
        assert!(Cli::try_parse_from(["gh-pr-feedback", "--repo"]).is_err());
    }

    #[test]
    fn test_cli_rejects_malformed_repo() {
        assert!(Cli::try_parse_from(["gh-pr-feedback", "--repo", "widgets"]).is_err());
    }

    #[test]
    fn test_cli_help_is_display_help() {
        let err = Cli::try_parse_from(["gh-pr-feedback", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_missing_directory_is_usage_error() {
        let err = enter_directory(Path::new("/nonexistent/gh-pr-feedback/dir")).unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_hints_for_resolution_failures() {
        let no_pr = AppError::Feedback(FeedbackError::NoActivePr {
            reason: "none".to_string(),
        });
        assert!(no_pr.hint().unwrap().contains("gh pr status"));

        let no_repo = AppError::Feedback(FeedbackError::RepoUnknown {
            reason: "none".to_string(),
        });
        assert!(no_repo.hint().unwrap().contains("--repo"));
    }
}
