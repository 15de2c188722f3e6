use std::path::PathBuf;

use serde::Deserialize;

/// Errors that can occur during Lean REPL interaction.
#[derive(Debug, thiserror::Error)]
pub enum LeanError {
    /// Lean process exited unexpectedly, or was killed after a timeout.
    #[error("Lean process exited unexpectedly")]
    ProcessDied,

    /// Request timed out after the specified number of seconds.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// JSON parse error or unexpected response format.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Lean reported an error (unknown constant, elaboration failure, etc.).
    #[error("Lean error: {0}")]
    LeanMessage(String),

    /// IO error from process communication.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A single goal in a proof state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    /// Zero-indexed goal position within the proof state.
    pub goal_id: usize,
    /// Case tag (e.g. `succ` after `induction`), if the goal has one.
    pub case_name: Option<String>,
    /// Hypothesis strings (e.g., "n : ℕ").
    pub hypotheses: Vec<String>,
    /// The goal target (the part after `⊢`).
    pub target: String,
    /// Full text rendering, as handed to the search.
    pub raw: String,
}

impl Goal {
    /// Construct a Goal from Pantograph's structured response.
    ///
    /// The rendering is the usual Lean infoview layout:
    /// ```text
    /// case succ
    /// n : ℕ
    /// h : n + 0 = n
    /// ⊢ succ n + 0 = succ n
    /// ```
    pub fn from_pantograph(goal_id: usize, pg: &crate::protocol::PantographGoal) -> Self {
        let target = pg
            .target
            .pp
            .as_deref()
            .unwrap_or("<no pp>")
            .to_string();

        let hypotheses: Vec<String> = pg
            .vars
            .iter()
            .map(|v| {
                let type_str = v
                    .type_expr
                    .as_ref()
                    .and_then(|e| e.pp.as_deref())
                    .unwrap_or("?");
                format!("{} : {}", v.user_name, type_str)
            })
            .collect();

        let case_name = pg.user_name.clone().filter(|n| !n.is_empty());

        let mut lines = Vec::with_capacity(hypotheses.len() + 2);
        if let Some(case) = &case_name {
            lines.push(format!("case {case}"));
        }
        lines.extend(hypotheses.iter().cloned());
        lines.push(format!("⊢ {target}"));

        Goal {
            goal_id,
            case_name,
            hypotheses,
            target,
            raw: lines.join("\n"),
        }
    }
}

/// Result of applying a tactic to a proof state.
#[derive(Debug, Clone)]
pub enum TacticResult {
    /// Tactic applied successfully, producing new goals.
    Success { state_id: u64, goals: Vec<Goal> },
    /// Proof is complete (goals list is empty).
    ProofComplete { state_id: u64 },
    /// Tactic failed with a Lean error message.
    Failed { message: String },
}

/// A proof state returned by `goal.start`.
#[derive(Debug, Clone)]
pub struct ProofState {
    /// Monotonically increasing state ID from Pantograph.
    pub state_id: u64,
    /// Current goals. `goal.start` does not report any; run a tactic to see them.
    pub goals: Vec<Goal>,
}

/// Configuration for a Pantograph process.
#[derive(Debug, Clone, Deserialize)]
pub struct LeanConfig {
    /// Path to the Pantograph binary, or `lake` to run `lake exe repl`.
    #[serde(default = "default_pantograph_path")]
    pub pantograph_path: PathBuf,

    /// Lean project directory (where the lakefile lives). Used as the working
    /// directory of the child process.
    #[serde(default = "default_lean_env_path")]
    pub lean_env_path: PathBuf,

    /// Lean modules to import (e.g. `["Init"]` or `["Game"]`).
    #[serde(default = "default_imports")]
    pub imports: Vec<String>,

    /// Timeout in seconds for a single tactic application.
    #[serde(default = "default_tactic_timeout")]
    pub tactic_timeout_secs: u64,

    /// Timeout in seconds for process startup and `goal.start`. Loading a
    /// large environment can take a minute or more.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

impl Default for LeanConfig {
    fn default() -> Self {
        Self {
            pantograph_path: default_pantograph_path(),
            lean_env_path: default_lean_env_path(),
            imports: default_imports(),
            tactic_timeout_secs: default_tactic_timeout(),
            startup_timeout_secs: default_startup_timeout(),
        }
    }
}

impl LeanConfig {
    /// Config running `lake exe repl` inside `project_dir`.
    pub fn for_project(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            lean_env_path: project_dir.into(),
            ..Self::default()
        }
    }
}

fn default_pantograph_path() -> PathBuf {
    PathBuf::from("lake")
}
fn default_lean_env_path() -> PathBuf {
    PathBuf::from(".")
}
fn default_imports() -> Vec<String> {
    vec!["Init".to_string()]
}
fn default_tactic_timeout() -> u64 {
    30
}
fn default_startup_timeout() -> u64 {
    120
}
