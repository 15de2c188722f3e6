//! Subcommand implementations: level search, batch runs, scope and tactic
//! listings, and reference solution replay.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use levels::{LevelIndex, LevelTask};
use search::{
    replay_level, LeanEnvironment, ProofEnvironment, SearchEngine, SearchGraph, SearchOutcome,
};

use crate::config::{apply_project, load_or_default, SearchOverrides};
use crate::results::{BatchReport, LevelReport, VerifyLevel, VerifyReport};

/// Stuck nodes listed when a search fails.
const STUCK_SAMPLE: usize = 3;

/// Arguments for the `search` subcommand.
#[derive(Debug)]
pub struct SearchArgs {
    /// Path to the search config TOML file.
    pub config: PathBuf,
    /// Path to the level index JSON file.
    pub levels: PathBuf,
    /// Level to search.
    pub level: String,
    pub overrides: SearchOverrides,
    /// Lean project directory, overriding `[lean] lean_env_path`.
    pub project: Option<PathBuf>,
    /// Number of solutions to print.
    pub show: usize,
    /// Write the full search graph here as JSON.
    pub trace: Option<PathBuf>,
}

/// Arguments for the `batch` subcommand.
#[derive(Debug)]
pub struct BatchArgs {
    pub config: PathBuf,
    pub levels: PathBuf,
    /// Only search this world.
    pub world: Option<String>,
    /// Path for the JSON report.
    pub output: PathBuf,
    pub overrides: SearchOverrides,
    pub project: Option<PathBuf>,
    /// Stop after this many levels.
    pub max_levels: Option<usize>,
}

/// Arguments for the `verify` subcommand.
#[derive(Debug)]
pub struct VerifyArgs {
    pub config: PathBuf,
    pub levels: PathBuf,
    pub world: Option<String>,
    /// Only verify this level.
    pub level: Option<String>,
    /// Path for the JSON report.
    pub output: Option<PathBuf>,
    pub project: Option<PathBuf>,
    /// Submit commands as written instead of through the tactic model.
    pub raw: bool,
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

/// Search one level and print its solutions, or diagnostics if none was found.
pub async fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let toml = load_or_default(&args.config)?;
    let index = LevelIndex::from_json(&args.levels)?;
    let task = index.task(&args.level)?;

    let engine = SearchEngine::new(args.overrides.apply(toml.search));
    let env = LeanEnvironment::new(apply_project(toml.lean, args.project.as_ref()));

    println!("Level {} ({}): {}", task.name, task.world, task.statement);
    println!("{}", render_scope(&task));

    let outcome = engine.search_level(&env, &task).await;
    if let Some(message) = &outcome.init_error {
        anyhow::bail!("Could not start a proof of {}: {message}", task.name);
    }

    print!("{}", render_outcome(&outcome, args.show));

    if let Some(path) = &args.trace {
        write_json(path, &outcome.graph)?;
        println!("Trace: {}", path.display());
    }
    Ok(())
}

/// Solutions found, or what the search tried when it found none.
pub fn render_outcome(outcome: &SearchOutcome, show: usize) -> String {
    let mut out = String::new();
    let stats = &outcome.stats;
    let _ = writeln!(
        out,
        "\n--- Search ({:?}, {} states, {} attempts, {:.1}s) ---",
        outcome.termination,
        outcome.graph.len(),
        stats.tactic_attempts,
        stats.wall_time_ms as f64 / 1000.0
    );

    if outcome.is_solved() {
        let solutions = outcome.solutions();
        let _ = writeln!(out, "Found {} solution(s)", solutions.len());
        for (i, solution) in solutions.iter().take(show).enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, solution.join("; "));
        }
        if solutions.len() > show {
            let _ = writeln!(out, "... {} more", solutions.len() - show);
        }
    } else {
        let _ = writeln!(out, "No solution found");
        out.push_str(&render_diagnostics(&outcome.graph, STUCK_SAMPLE));
    }
    out
}

/// Root attempts, a sample of stuck states, and per-state attempt tallies.
pub fn render_diagnostics(graph: &SearchGraph, sample: usize) -> String {
    let mut out = String::new();
    let Some(root) = graph.root_node() else {
        let _ = writeln!(out, "No root state recorded");
        return out;
    };

    let _ = writeln!(out, "Root tactics tried: {}", root.tactics_tried.len());
    for tactic in &root.tactics_tried {
        let _ = writeln!(out, "  {tactic}");
    }
    let failures = graph.root_failures_only();
    if !failures.is_empty() {
        let _ = writeln!(out, "Root failures: {}", failures.join(", "));
    }

    let stuck = graph.stuck_nodes();
    let _ = writeln!(out, "Stuck states: {}", stuck.len());
    for node in stuck.iter().take(sample) {
        let _ = writeln!(
            out,
            "  [{} @ depth {}] {}",
            node.state_id,
            node.depth,
            node.goal_preview()
        );
    }

    let tallies = graph.tallies();
    let _ = writeln!(out, "Attempts per state:");
    for tally in tallies.iter().take(sample) {
        let _ = writeln!(
            out,
            "  [{} @ depth {}] tried {}, ok {}, failed {}",
            tally.state_id, tally.depth, tally.tried, tally.succeeded, tally.failed
        );
    }
    if tallies.len() > sample {
        let _ = writeln!(out, "  ... {} more", tallies.len() - sample);
    }
    out
}

// ---------------------------------------------------------------------------
// batch
// ---------------------------------------------------------------------------

/// Search every level (or one world) and write a JSON report.
pub async fn run_batch(args: BatchArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    let toml = load_or_default(&args.config)?;
    let index = LevelIndex::from_json(&args.levels)?;
    let mut tasks = select_tasks(&index, args.world.as_deref(), None)?;
    if let Some(max) = args.max_levels {
        tasks.truncate(max);
    }

    let config = args.overrides.apply(toml.search);
    let max_depth = config.max_depth;
    let engine = SearchEngine::new(config);
    let env = LeanEnvironment::new(apply_project(toml.lean, args.project.as_ref()));

    let per_level = search_tasks(&engine, &env, &tasks, true).await;
    let report = BatchReport::new(
        args.levels.display().to_string(),
        args.world.clone(),
        max_depth,
        per_level,
    );
    write_json(&args.output, &report)?;

    println!("\n--- Batch Summary ---");
    println!("Solved: {}/{}", report.solved, report.total);
    for level in report.unsolved() {
        let reason = level
            .init_error
            .clone()
            .unwrap_or_else(|| format!("{:?}", level.termination));
        println!("  unsolved: {} ({reason})", level.name);
    }
    println!("Median time: {:.2}s", report.median_time_secs);
    println!("Output: {}", args.output.display());
    println!("Elapsed: {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Search each task in order, one backend session per task.
pub async fn search_tasks(
    engine: &SearchEngine,
    env: &dyn ProofEnvironment,
    tasks: &[LevelTask],
    show_progress: bool,
) -> Vec<LevelReport> {
    let pb = if show_progress {
        let pb = ProgressBar::new(tasks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .expect("valid progress bar template")
                .progress_chars("=> "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut reports = Vec::with_capacity(tasks.len());
    for task in tasks {
        pb.set_message(task.name.clone());
        let outcome = engine.search_level(env, task).await;
        if let Some(solution) = outcome.solutions().first() {
            tracing::info!(level = %task.name, tactics = ?solution, "Solved");
        }
        reports.push(LevelReport::from_outcome(task, &outcome));
        pb.inc(1);
    }
    pb.finish_with_message("done");
    reports
}

// ---------------------------------------------------------------------------
// scope
// ---------------------------------------------------------------------------

/// Print the tactics and lemmas available at a level.
pub fn run_scope(levels: &Path, level: &str) -> anyhow::Result<()> {
    let index = LevelIndex::from_json(levels)?;
    let task = index.task(level)?;
    println!("Level {} ({})", task.name, task.world);
    println!("{}", render_scope(&task));
    Ok(())
}

pub fn render_scope(task: &LevelTask) -> String {
    format!(
        "Tactics ({}): {}\nLemmas ({}): {}",
        task.scope.tactics.len(),
        task.scope.tactics.join(", "),
        task.scope.lemmas.len(),
        task.scope.lemmas.join(", ")
    )
}

// ---------------------------------------------------------------------------
// tactics
// ---------------------------------------------------------------------------

/// How often one keyword appears in reference solutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordUsage {
    pub keyword: String,
    pub uses: usize,
    /// Uses the tactic model parsed.
    pub parsed: usize,
    /// The tactic model has a parser for this keyword.
    pub supported: bool,
}

/// Keyword usage over every reference solution, most used first.
pub fn tactic_usage(tasks: &[LevelTask]) -> Vec<KeywordUsage> {
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for task in tasks {
        let Some(solution) = &task.solution else {
            continue;
        };
        for command in tactics::extract_commands(solution) {
            if !tactics::is_tactic_like(&command) {
                continue;
            }
            let Some(keyword) = tactics::leading_keyword(&command) else {
                continue;
            };
            let entry = counts.entry(keyword.to_string()).or_default();
            entry.0 += 1;
            if tactics::parse_tactic(&command).is_ok() {
                entry.1 += 1;
            }
        }
    }

    let mut usage: Vec<KeywordUsage> = counts
        .into_iter()
        .map(|(keyword, (uses, parsed))| KeywordUsage {
            supported: tactics::is_supported_keyword(&keyword),
            keyword,
            uses,
            parsed,
        })
        .collect();
    usage.sort_by(|a, b| b.uses.cmp(&a.uses).then_with(|| a.keyword.cmp(&b.keyword)));
    usage
}

pub fn render_usage(usage: &[KeywordUsage]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:>6} {:>7}  model", "keyword", "uses", "parsed");
    for u in usage {
        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>7}  {}",
            u.keyword,
            u.uses,
            u.parsed,
            if u.supported { "yes" } else { "-" }
        );
    }
    let total: usize = usage.iter().map(|u| u.uses).sum();
    let parsed: usize = usage.iter().map(|u| u.parsed).sum();
    if total > 0 {
        let _ = writeln!(
            out,
            "Parse coverage: {parsed}/{total} ({:.1}%)",
            parsed as f64 / total as f64 * 100.0
        );
    }
    out
}

/// Print the keyword usage table for the index's reference solutions.
pub fn run_tactics(levels: &Path) -> anyhow::Result<()> {
    let index = LevelIndex::from_json(levels)?;
    let tasks = index.tasks();
    let with_solution = tasks.iter().filter(|t| t.solution.is_some()).count();
    println!("Reference solutions: {with_solution}/{}", tasks.len());
    print!("{}", render_usage(&tactic_usage(&tasks)));
    Ok(())
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

/// Replay reference solutions against Lean.
pub async fn run_verify(args: VerifyArgs) -> anyhow::Result<()> {
    let toml = load_or_default(&args.config)?;
    let index = LevelIndex::from_json(&args.levels)?;
    let tasks = select_tasks(&index, args.world.as_deref(), args.level.as_deref())?;
    let env = LeanEnvironment::new(apply_project(toml.lean, args.project.as_ref()));

    let report = verify_tasks(&env, &tasks, !args.raw).await;

    println!("\n--- Verify Summary ---");
    println!("Complete: {}/{}", report.complete, report.total);
    for level in report.per_level.iter().filter(|l| !l.outcome.is_complete()) {
        let detail = match (&level.outcome.init_error, &level.outcome.failure) {
            (Some(e), _) => format!("start failed: {e}"),
            (None, Some(f)) => format!("step {} `{}`: {}", f.index + 1, f.command, f.message),
            (None, None) => format!("{} goal(s) left", level.outcome.remaining_goals.len()),
        };
        println!("  {}: {detail}", level.name);
    }
    if report.unsupported_commands > 0 {
        println!("Unsupported commands: {}", report.unsupported_commands);
    }
    if let Some(path) = &args.output {
        write_json(path, &report)?;
        println!("Output: {}", path.display());
    }
    Ok(())
}

/// Replay the reference solution of each task that has one.
pub async fn verify_tasks(
    env: &dyn ProofEnvironment,
    tasks: &[LevelTask],
    normalize: bool,
) -> VerifyReport {
    let mut per_level = Vec::new();
    for task in tasks {
        let Some(solution) = &task.solution else {
            tracing::debug!(level = %task.name, "No reference solution, skipping");
            continue;
        };
        let commands: Vec<String> = tactics::extract_commands(solution)
            .into_iter()
            .filter(|c| tactics::is_tactic_like(c))
            .collect();
        let outcome = replay_level(env, task, &commands, normalize).await;
        per_level.push(VerifyLevel {
            name: task.name.clone(),
            world: task.world.clone(),
            outcome,
        });
    }
    VerifyReport::new(per_level)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Tasks for one level, one world, or the whole index.
pub fn select_tasks(
    index: &LevelIndex,
    world: Option<&str>,
    level: Option<&str>,
) -> anyhow::Result<Vec<LevelTask>> {
    if let Some(name) = level {
        return Ok(vec![index.task(name)?]);
    }
    match world {
        Some(world) => {
            let tasks = index.world_tasks(world);
            if tasks.is_empty() {
                anyhow::bail!("World '{world}' has no levels in the index");
            }
            Ok(tasks)
        }
        None => Ok(index.tasks()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
