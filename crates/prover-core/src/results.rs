//! Report types written by `batch` and `verify`.

use levels::LevelTask;
use search::{ReplayOutcome, SearchOutcome, SearchStats, TerminationReason};
use serde::{Deserialize, Serialize};

/// Result of searching one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReport {
    pub name: String,
    pub world: String,
    pub level: Option<u32>,
    pub solved: bool,
    /// Solutions in discovery order.
    pub solutions: Vec<Vec<String>>,
    pub termination: TerminationReason,
    pub stats: SearchStats,
    #[serde(default)]
    pub init_error: Option<String>,
    /// Wall-clock time in seconds.
    pub time_secs: f64,
}

impl LevelReport {
    pub fn from_outcome(task: &LevelTask, outcome: &SearchOutcome) -> Self {
        Self {
            name: task.name.clone(),
            world: task.world.clone(),
            level: task.level,
            solved: outcome.is_solved(),
            solutions: outcome.solutions().to_vec(),
            termination: outcome.termination,
            stats: outcome.stats.clone(),
            init_error: outcome.init_error.clone(),
            time_secs: outcome.stats.wall_time_ms as f64 / 1000.0,
        }
    }
}

/// Results of a batch run over many levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Path of the level index that was searched.
    pub levels_file: String,
    /// World filter, if any.
    pub world: Option<String>,
    pub max_depth: usize,
    pub total: usize,
    pub solved: usize,
    /// Fraction solved (solved / total).
    pub rate: f64,
    pub avg_time_secs: f64,
    pub median_time_secs: f64,
    pub per_level: Vec<LevelReport>,
}

impl BatchReport {
    pub fn new(
        levels_file: String,
        world: Option<String>,
        max_depth: usize,
        per_level: Vec<LevelReport>,
    ) -> Self {
        let total = per_level.len();
        let solved = per_level.iter().filter(|r| r.solved).count();
        let mut times: Vec<f64> = per_level.iter().map(|r| r.time_secs).collect();
        let avg_time_secs = if total > 0 {
            times.iter().sum::<f64>() / total as f64
        } else {
            0.0
        };
        Self {
            levels_file,
            world,
            max_depth,
            total,
            solved,
            rate: if total > 0 { solved as f64 / total as f64 } else { 0.0 },
            avg_time_secs,
            median_time_secs: median(&mut times),
            per_level,
        }
    }

    /// Levels that were searched but not solved.
    pub fn unsolved(&self) -> impl Iterator<Item = &LevelReport> {
        self.per_level.iter().filter(|r| !r.solved)
    }
}

/// Replay result for one level's reference solution.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyLevel {
    pub name: String,
    pub world: String,
    #[serde(flatten)]
    pub outcome: ReplayOutcome,
}

/// Results of replaying reference solutions.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub total: usize,
    pub complete: usize,
    /// Levels where a command was rejected.
    pub failed: usize,
    /// Levels whose proof could not be started.
    pub init_errors: usize,
    /// Commands the tactic model could not parse, across all levels.
    pub unsupported_commands: usize,
    pub per_level: Vec<VerifyLevel>,
}

impl VerifyReport {
    pub fn new(per_level: Vec<VerifyLevel>) -> Self {
        Self {
            total: per_level.len(),
            complete: per_level.iter().filter(|l| l.outcome.is_complete()).count(),
            failed: per_level.iter().filter(|l| l.outcome.failure.is_some()).count(),
            init_errors: per_level
                .iter()
                .filter(|l| l.outcome.init_error.is_some())
                .count(),
            unsupported_commands: per_level.iter().map(|l| l.outcome.unsupported().count()).sum(),
            per_level,
        }
    }
}

/// Compute the median of a slice of f64 values.
///
/// Returns 0.0 for empty slices.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
