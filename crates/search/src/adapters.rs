//! Bridges between search traits and the Pantograph client in lean-repl.

use async_trait::async_trait;
use lean_repl::{LeanConfig, LeanError, LeanWorker, TacticResult};
use levels::LevelTask;

use crate::engine::{ProofEnvironment, SearchError, StepResult, TacticRunner};
use crate::graph::StateId;

// ---------------------------------------------------------------------------
// ProofEnvironment over fresh Pantograph processes
// ---------------------------------------------------------------------------

/// Spawns one Pantograph process per proof and kills it on teardown.
///
/// Each search gets a clean environment, so state ids never leak between
/// levels.
#[derive(Debug, Clone)]
pub struct LeanEnvironment {
    config: LeanConfig,
}

impl LeanEnvironment {
    pub fn new(config: LeanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LeanConfig {
        &self.config
    }
}

#[async_trait]
impl ProofEnvironment for LeanEnvironment {
    async fn start_proof(&self, task: &LevelTask) -> Result<Box<dyn TacticRunner + Send>, SearchError> {
        let mut worker = LeanWorker::spawn(&self.config).await?;

        // Try copyFrom(name) first: the level's theorem is in the game environment.
        let state = match worker.start_proof_by_name(&task.name).await {
            Ok(state) => state,
            Err(LeanError::LeanMessage(msg)) => {
                tracing::debug!(
                    level = %task.name,
                    error = %msg,
                    "copyFrom failed, falling back to expr"
                );
                match worker.start_proof(&task.statement).await {
                    Ok(state) => state,
                    Err(e) => {
                        tracing::warn!(
                            level = %task.name,
                            error = %e,
                            "goal.start(expr) fallback also failed"
                        );
                        worker.shutdown().await;
                        return Err(SearchError::ProofStart(e.to_string()));
                    }
                }
            }
            Err(e) => {
                worker.shutdown().await;
                return Err(SearchError::Lean(e));
            }
        };

        Ok(Box::new(LeanTacticRunner {
            worker,
            initial: StateId(state.state_id),
        }))
    }
}

// ---------------------------------------------------------------------------
// TacticRunner over one LeanWorker
// ---------------------------------------------------------------------------

/// Runs tactics against a single Pantograph process.
pub struct LeanTacticRunner {
    worker: LeanWorker,
    initial: StateId,
}

/// Flatten a Pantograph tactic result into the search's step result.
pub fn step_from_tactic_result(result: TacticResult) -> StepResult {
    match result {
        TacticResult::Success { state_id, goals } => StepResult::Success {
            state_id: StateId(state_id),
            goals: goals.into_iter().map(|g| g.raw).collect(),
        },
        TacticResult::ProofComplete { state_id } => StepResult::Success {
            state_id: StateId(state_id),
            goals: Vec::new(),
        },
        TacticResult::Failed { message } => StepResult::Failed { message },
    }
}

#[async_trait]
impl TacticRunner for LeanTacticRunner {
    fn initial_state(&self) -> StateId {
        self.initial
    }

    async fn apply_tactic(&mut self, state_id: StateId, tactic: &str) -> Result<StepResult, SearchError> {
        let result = self.worker.apply_tactic(state_id.0, None, tactic).await?;
        Ok(step_from_tactic_result(result))
    }

    async fn teardown(&mut self) {
        self.worker.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lean_repl::Goal;

    fn goal(raw: &str) -> Goal {
        Goal {
            goal_id: 0,
            case_name: None,
            hypotheses: vec![],
            target: raw.trim_start_matches("⊢ ").to_string(),
            raw: raw.to_string(),
        }
    }

    #[test]
    fn success_keeps_rendered_goals() {
        let step = step_from_tactic_result(TacticResult::Success {
            state_id: 4,
            goals: vec![goal("⊢ a = a"), goal("⊢ b = b")],
        });
        assert_eq!(
            step,
            StepResult::Success {
                state_id: StateId(4),
                goals: vec!["⊢ a = a".into(), "⊢ b = b".into()],
            }
        );
    }

    #[test]
    fn proof_complete_is_success_without_goals() {
        let step = step_from_tactic_result(TacticResult::ProofComplete { state_id: 9 });
        assert_eq!(
            step,
            StepResult::Success {
                state_id: StateId(9),
                goals: vec![],
            }
        );
    }

    #[test]
    fn failure_passes_message_through() {
        let step = step_from_tactic_result(TacticResult::Failed {
            message: "unknown identifier 'h'".into(),
        });
        assert_eq!(
            step,
            StepResult::Failed {
                message: "unknown identifier 'h'".into()
            }
        );
    }
}
