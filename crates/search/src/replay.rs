//! Replay a fixed tactic sequence against the backend and report how far it got.
//!
//! Used to check reference solutions and the tactic model against a real
//! backend: commands can first be normalized through [`tactics::normalize`],
//! so a command that round-trips to something Lean rejects shows up here.

use levels::LevelTask;
use serde::Serialize;

use crate::engine::{ProofEnvironment, StepResult, TacticRunner};

/// How a replayed command was prepared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayCommand {
    /// Command as written in the source.
    pub original: String,
    /// Command actually submitted.
    pub submitted: String,
    /// The tactic model had no parser for it; submitted verbatim.
    pub unsupported: bool,
}

/// First command the backend rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayFailure {
    /// Zero-based index into the command list.
    pub index: usize,
    pub command: String,
    pub message: String,
}

/// Result of replaying one command sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    pub commands: Vec<ReplayCommand>,
    /// Commands applied successfully before stopping.
    pub steps_applied: usize,
    pub failure: Option<ReplayFailure>,
    /// Goals left after the last applied command.
    pub remaining_goals: Vec<String>,
    /// Starting or probing the proof failed.
    pub init_error: Option<String>,
}

impl ReplayOutcome {
    /// Every command applied and no goals remain.
    pub fn is_complete(&self) -> bool {
        self.init_error.is_none() && self.failure.is_none() && self.remaining_goals.is_empty()
    }

    /// Commands the tactic model could not parse.
    pub fn unsupported(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .filter(|c| c.unsupported)
            .map(|c| c.original.as_str())
    }
}

/// Prepare commands for submission.
///
/// With `normalize`, each command is parsed and printed through the tactic
/// model; commands it cannot parse are kept verbatim and flagged.
pub fn prepare_commands(commands: &[String], normalize: bool) -> Vec<ReplayCommand> {
    commands
        .iter()
        .map(|original| {
            if !normalize {
                return ReplayCommand {
                    original: original.clone(),
                    submitted: original.clone(),
                    unsupported: false,
                };
            }
            match tactics::normalize(original) {
                Ok(submitted) => ReplayCommand {
                    original: original.clone(),
                    submitted,
                    unsupported: false,
                },
                Err(e) => {
                    tracing::debug!(command = %original, error = %e, "Replaying command verbatim");
                    ReplayCommand {
                        original: original.clone(),
                        submitted: original.clone(),
                        unsupported: true,
                    }
                }
            }
        })
        .collect()
}

/// Probe the runner, then apply each command to the latest state in order.
/// Stops at the first rejected command. Does not tear the runner down.
pub async fn replay(
    runner: &mut (dyn TacticRunner + Send),
    commands: &[String],
    normalize: bool,
) -> ReplayOutcome {
    let mut outcome = ReplayOutcome {
        commands: prepare_commands(commands, normalize),
        ..ReplayOutcome::default()
    };

    let (mut state, mut goals) = match runner.probe().await {
        Ok(StepResult::Success { state_id, goals }) => (state_id, goals),
        Ok(StepResult::Failed { message }) => {
            outcome.init_error = Some(format!("probe failed: {message}"));
            return outcome;
        }
        Err(e) => {
            outcome.init_error = Some(e.to_string());
            return outcome;
        }
    };

    for (index, command) in outcome.commands.iter().enumerate() {
        let message = match runner.apply_tactic(state, &command.submitted).await {
            Ok(StepResult::Success { state_id, goals: next }) => {
                state = state_id;
                goals = next;
                outcome.steps_applied += 1;
                continue;
            }
            Ok(StepResult::Failed { message }) => message,
            Err(e) => e.to_string(),
        };
        tracing::debug!(index, command = %command.submitted, error = %message, "Replay stopped");
        outcome.failure = Some(ReplayFailure {
            index,
            command: command.submitted.clone(),
            message,
        });
        break;
    }

    outcome.remaining_goals = goals;
    outcome
}

/// Start a proof of `task`, replay `commands`, and tear the session down.
pub async fn replay_level(
    env: &dyn ProofEnvironment,
    task: &LevelTask,
    commands: &[String],
    normalize: bool,
) -> ReplayOutcome {
    let mut runner = match env.start_proof(task).await {
        Ok(runner) => runner,
        Err(e) => {
            return ReplayOutcome {
                commands: prepare_commands(commands, normalize),
                init_error: Some(e.to_string()),
                ..ReplayOutcome::default()
            }
        }
    };
    let outcome = replay(runner.as_mut(), commands, normalize).await;
    runner.teardown().await;

    tracing::info!(
        level = %task.name,
        applied = outcome.steps_applied,
        total = commands.len(),
        complete = outcome.is_complete(),
        "Replay finished"
    );
    outcome
}
