mod config;
mod pipeline;
pub mod results;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::SearchOverrides;
use pipeline::{BatchArgs, SearchArgs, VerifyArgs};

/// nng-prover: depth-limited tactic search for Natural Number Game levels.
#[derive(Parser)]
#[command(name = "nng-prover", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Search options shared by `search` and `batch`.
#[derive(clap::Args, Debug)]
struct SearchFlags {
    /// Override the maximum proof depth.
    #[arg(long)]
    max_depth: Option<usize>,
    /// Keep searching after the first solution.
    #[arg(long)]
    exhaustive: bool,
    /// Stop an exhaustive search after this many solutions.
    #[arg(long)]
    max_solutions: Option<usize>,
    /// Override the per-level time limit in seconds (0 = none).
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl From<SearchFlags> for SearchOverrides {
    fn from(flags: SearchFlags) -> Self {
        Self {
            max_depth: flags.max_depth,
            exhaustive: flags.exhaustive,
            max_solutions: flags.max_solutions,
            timeout_secs: flags.timeout_secs,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Search one level and print its solutions.
    Search {
        /// Path to search config TOML file.
        #[arg(long, default_value = "configs/search.toml")]
        config: PathBuf,
        /// Path to the level index JSON file.
        #[arg(long, default_value = "data/levels.json")]
        levels: PathBuf,
        /// Level name.
        #[arg(long)]
        level: String,
        #[command(flatten)]
        search: SearchFlags,
        /// Lean project directory (overrides the config).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Number of solutions to print.
        #[arg(long, default_value_t = 5)]
        show: usize,
        /// Write the search graph as JSON to this path.
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Search every level, or every level of one world.
    Batch {
        /// Path to search config TOML file.
        #[arg(long, default_value = "configs/search.toml")]
        config: PathBuf,
        /// Path to the level index JSON file.
        #[arg(long, default_value = "data/levels.json")]
        levels: PathBuf,
        /// Only search this world.
        #[arg(long)]
        world: Option<String>,
        /// Path for the JSON report.
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        search: SearchFlags,
        /// Lean project directory (overrides the config).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Maximum number of levels to search (truncates the index).
        #[arg(long)]
        max_levels: Option<usize>,
    },
    /// Print the tactics and lemmas available at a level.
    Scope {
        #[arg(long, default_value = "data/levels.json")]
        levels: PathBuf,
        #[arg(long)]
        level: String,
    },
    /// Keyword usage across reference solutions, with tactic model coverage.
    Tactics {
        #[arg(long, default_value = "data/levels.json")]
        levels: PathBuf,
    },
    /// Replay reference solutions against Lean.
    Verify {
        /// Path to search config TOML file.
        #[arg(long, default_value = "configs/search.toml")]
        config: PathBuf,
        /// Path to the level index JSON file.
        #[arg(long, default_value = "data/levels.json")]
        levels: PathBuf,
        /// Only verify this world.
        #[arg(long)]
        world: Option<String>,
        /// Only verify this level.
        #[arg(long)]
        level: Option<String>,
        /// Path for the JSON report.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Lean project directory (overrides the config).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Submit commands as written, without normalizing them first.
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Search {
            config,
            levels,
            level,
            search,
            project,
            show,
            trace,
        } => {
            pipeline::run_search(SearchArgs {
                config,
                levels,
                level,
                overrides: search.into(),
                project,
                show,
                trace,
            })
            .await
        }
        Command::Batch {
            config,
            levels,
            world,
            output,
            search,
            project,
            max_levels,
        } => {
            pipeline::run_batch(BatchArgs {
                config,
                levels,
                world,
                output,
                overrides: search.into(),
                project,
                max_levels,
            })
            .await
        }
        Command::Scope { levels, level } => pipeline::run_scope(&levels, &level),
        Command::Tactics { levels } => pipeline::run_tactics(&levels),
        Command::Verify {
            config,
            levels,
            world,
            level,
            output,
            project,
            raw,
        } => {
            pipeline::run_verify(VerifyArgs {
                config,
                levels,
                world,
                level,
                output,
                project,
                raw,
            })
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "nng-prover",
            "search",
            "--level",
            "L02",
            "--max-depth",
            "4",
            "--exhaustive",
        ])
        .unwrap();
        let Command::Search { level, search, show, .. } = cli.command else {
            panic!("expected search");
        };
        assert_eq!(level, "L02");
        assert_eq!(show, 5);
        let overrides: SearchOverrides = search.into();
        assert_eq!(overrides.max_depth, Some(4));
        assert!(overrides.exhaustive);
    }

    #[test]
    fn test_cli_batch_requires_output() {
        assert!(Cli::try_parse_from(["nng-prover", "batch"]).is_err());
        assert!(Cli::try_parse_from(["nng-prover", "batch", "--output", "r.json"]).is_ok());
    }
}
