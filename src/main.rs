use anyhow::Result;
use clap::Parser;
use ghupd::commands::{self, GlobalOptions};
use std::path::PathBuf;

/// ghupd - GitHub release update resolver
///
/// Turns the latest GitHub release of a plugin or theme into update metadata:
/// new version, package URL, changelog and platform version hints.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for accessing private repositories or avoiding rate limits.
///
/// Examples:
///   ghupd check https://github.com/owner/repo --installed 1.2.0
///   ghupd run          # Check every resource listed in the config file
#[derive(Parser, Debug)]
#[command(author, version = env!("GHUPD_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to <config dir>/ghupd/config.json; also via GHUPD_CONFIG)
    #[arg(long = "config", short = 'c', env = "GHUPD_CONFIG", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Directory holding the update-check token (also via GHUPD_STATE_DIR)
    #[arg(long = "state-dir", env = "GHUPD_STATE_DIR", value_name = "PATH", global = true)]
    pub state_dir: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Check one repository for a release newer than the installed version
    Check(CheckArgs),

    /// Show details of the latest release of one repository
    Info(InfoArgs),

    /// Check every configured resource
    Run,

    /// Run an on-demand check, authorized by the update-check token
    Trigger(TriggerArgs),

    /// Print the update-check token, generating it on first use
    Token,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Repository homepage, e.g. https://github.com/owner/repo
    #[arg(value_name = "URL")]
    pub url: String,

    /// Currently installed version
    #[arg(long, value_name = "VERSION")]
    pub installed: String,

    /// Access token for private repositories (overrides GITHUB_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    /// Repository homepage, e.g. https://github.com/owner/repo
    #[arg(value_name = "URL")]
    pub url: String,

    /// Access token for private repositories (overrides GITHUB_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct TriggerArgs {
    /// The update-check token
    #[arg(long, value_name = "TOKEN")]
    pub token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = ghupd::runtime::RealRuntime;
    let global = GlobalOptions {
        config_path: cli.config,
        api_url: cli.api_url,
        state_dir: cli.state_dir,
    };

    let output = match cli.command {
        Commands::Check(args) => {
            commands::check(&runtime, &global, &args.url, &args.installed, args.token).await?
        }
        Commands::Info(args) => commands::info(&runtime, &global, &args.url, args.token).await?,
        Commands::Run => commands::run(runtime, &global).await?,
        Commands::Trigger(args) => commands::trigger(runtime, &global, &args.token).await?,
        Commands::Token => commands::token(runtime, &global)?,
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_check_parsing() {
        let cli = Cli::try_parse_from([
            "ghupd",
            "check",
            "https://github.com/owner/repo",
            "--installed",
            "1.2.0",
        ])
        .unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.url, "https://github.com/owner/repo");
                assert_eq!(args.installed, "1.2.0");
                assert_eq!(args.token, None);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_check_requires_installed() {
        let result = Cli::try_parse_from(["ghupd", "check", "https://github.com/owner/repo"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_info_with_token() {
        let cli = Cli::try_parse_from([
            "ghupd",
            "info",
            "https://github.com/owner/repo",
            "--token",
            "t0k",
        ])
        .unwrap();
        match cli.command {
            Commands::Info(args) => assert_eq!(args.token.as_deref(), Some("t0k")),
            _ => panic!("Expected Info command"),
        }
    }

    #[test]
    fn test_cli_trigger_requires_token() {
        assert!(Cli::try_parse_from(["ghupd", "trigger"]).is_err());
        let cli = Cli::try_parse_from(["ghupd", "trigger", "--token", "abc"]).unwrap();
        match cli.command {
            Commands::Trigger(args) => assert_eq!(args.token, "abc"),
            _ => panic!("Expected Trigger command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "ghupd",
            "--api-url",
            "http://localhost:8080",
            "run",
            "--state-dir",
            "/tmp/state",
            "--config",
            "/tmp/config.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/state")));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.json")));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["ghupd", "https://github.com/owner/repo"]);
        assert!(result.is_err());
    }
}
