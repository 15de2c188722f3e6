//! Depth-limited depth-first search over backend proof states.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use levels::{LevelTask, TacticScope};
use serde::{Deserialize, Serialize};

use crate::candidates::generate_candidates;
use crate::config::{DominanceKey, SearchConfig};
use crate::graph::{AttemptOutcome, NodeUpsert, SearchGraph, StateId};

/// No-op tactic used to turn the initial handle into a state with goals.
pub const PROBE_TACTIC: &str = "skip";

/// Errors that can occur at the backend boundary.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Error from the Lean REPL.
    #[error("Lean error: {0}")]
    Lean(#[from] lean_repl::LeanError),
    /// Failed to start a proof environment.
    #[error("Failed to start proof: {0}")]
    ProofStart(String),
    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Backend reply to one tactic submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// The tactic applied. An empty goal list means the proof is complete.
    Success { state_id: StateId, goals: Vec<String> },
    /// The backend rejected the tactic.
    Failed { message: String },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Proof environment that can start proofs and produce tactic runners.
#[async_trait]
pub trait ProofEnvironment: Send + Sync {
    /// Start a proof of the level's statement.
    async fn start_proof(&self, task: &LevelTask) -> Result<Box<dyn TacticRunner + Send>, SearchError>;
}

/// Runner for applying tactics to a single proof (holds its backend session).
#[async_trait]
pub trait TacticRunner: Send {
    /// Handle returned when the proof was started. May carry no goals yet.
    fn initial_state(&self) -> StateId;

    /// Apply a tactic to the given state.
    ///
    /// `Ok(Failed)` is a rejected tactic; `Err` is a transport problem.
    async fn apply_tactic(&mut self, state_id: StateId, tactic: &str) -> Result<StepResult, SearchError>;

    /// Submit [`PROBE_TACTIC`] against the initial handle to get the root
    /// state and its goals.
    async fn probe(&mut self) -> Result<StepResult, SearchError> {
        let initial = self.initial_state();
        self.apply_tactic(initial, PROBE_TACTIC).await
    }

    /// Release the backend session.
    async fn teardown(&mut self) {}
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why the search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Stack emptied.
    Exhausted,
    /// Early-exit mode found its solution.
    FirstSolution,
    /// Exhaustive mode reached `max_solutions`.
    SolutionLimit,
    Cancelled,
    TimedOut,
    /// The proof could not be started or probed.
    InitFailed,
}

/// Counters collected during one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub nodes_expanded: usize,
    pub tactic_attempts: usize,
    pub tactic_failures: usize,
    /// Attempts whose transport failed; also counted in `tactic_failures`.
    pub transport_errors: usize,
    pub duplicate_edges: usize,
    pub pruned_depth: usize,
    pub pruned_dominated: usize,
    pub children_enqueued: usize,
    pub max_depth_reached: usize,
    pub wall_time_ms: u64,
}

/// Everything one search produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub graph: SearchGraph,
    pub stats: SearchStats,
    pub termination: TerminationReason,
    /// Why initialization failed, for [`TerminationReason::InitFailed`].
    pub init_error: Option<String>,
}

impl SearchOutcome {
    fn init_failed(message: String, started: Instant) -> Self {
        Self {
            graph: SearchGraph::new(),
            stats: SearchStats {
                wall_time_ms: started.elapsed().as_millis() as u64,
                ..SearchStats::default()
            },
            termination: TerminationReason::InitFailed,
            init_error: Some(message),
        }
    }

    /// Solutions in discovery order.
    pub fn solutions(&self) -> &[Vec<String>] {
        &self.graph.solutions
    }

    pub fn is_solved(&self) -> bool {
        !self.graph.solutions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SearchEngine
// ---------------------------------------------------------------------------

/// Key into the best-depth map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DepthKey {
    State(StateId),
    Goals(String),
}

/// Depth-first proof search engine.
///
/// Candidates come from [`generate_candidates`]; the backend decides which
/// of them apply. One backend request is in flight at a time.
#[derive(Clone)]
pub struct SearchEngine {
    config: SearchConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchEngine {
    /// Create a new search engine with the given configuration.
    pub fn new(config: SearchConfig) -> Self {
        config.validate();
        Self {
            config,
            cancel: None,
        }
    }

    /// Stop searching once `flag` is set. Checked between stack pops.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn depth_key(&self, state_id: StateId, goals: &[String]) -> DepthKey {
        match self.config.dominance {
            DominanceKey::StateId => DepthKey::State(state_id),
            DominanceKey::GoalText => DepthKey::Goals(goals.join("\n\n")),
        }
    }

    /// Start a proof of `task` in `env`, search it, and tear the session down.
    ///
    /// Start and probe failures come back as [`TerminationReason::InitFailed`].
    pub async fn search_level(&self, env: &dyn ProofEnvironment, task: &LevelTask) -> SearchOutcome {
        let started = Instant::now();
        let mut runner = match env.start_proof(task).await {
            Ok(runner) => runner,
            Err(e) => {
                tracing::warn!(level = %task.name, error = %e, "Failed to start proof");
                return SearchOutcome::init_failed(e.to_string(), started);
            }
        };

        let outcome = self.search(runner.as_mut(), &task.scope).await;
        runner.teardown().await;

        tracing::info!(
            level = %task.name,
            solutions = outcome.solutions().len(),
            states = outcome.graph.len(),
            attempts = outcome.stats.tactic_attempts,
            termination = ?outcome.termination,
            time_ms = outcome.stats.wall_time_ms,
            "Search finished"
        );
        outcome
    }

    /// Search from the runner's initial handle using the tactics and lemmas
    /// in `scope`. Does not tear the runner down.
    pub async fn search(&self, runner: &mut (dyn TacticRunner + Send), scope: &TacticScope) -> SearchOutcome {
        let started = Instant::now();
        let deadline = (self.config.timeout_secs > 0)
            .then(|| started + Duration::from_secs(self.config.timeout_secs));
        let max_depth = self.config.max_depth;

        let (root, root_goals) = match runner.probe().await {
            Ok(StepResult::Success { state_id, goals }) => (state_id, goals),
            Ok(StepResult::Failed { message }) => {
                tracing::warn!(error = %message, "Probe tactic failed");
                return SearchOutcome::init_failed(format!("probe failed: {message}"), started);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Probe tactic could not be submitted");
                return SearchOutcome::init_failed(e.to_string(), started);
            }
        };

        tracing::info!(
            root = %root,
            goals = root_goals.len(),
            max_depth,
            exhaustive = self.config.exhaustive,
            "Starting search"
        );

        let mut graph = SearchGraph::new();
        let mut stats = SearchStats::default();
        let mut best_depth: HashMap<DepthKey, usize> = HashMap::new();
        let mut explored_edges: HashSet<(StateId, String)> = HashSet::new();
        let mut stack: Vec<(StateId, Vec<String>)> = vec![(root, Vec::new())];
        let mut termination = TerminationReason::Exhausted;

        best_depth.insert(self.depth_key(root, &root_goals), 0);
        graph.record_node(root, root_goals, 0);

        loop {
            if self.cancelled() {
                termination = TerminationReason::Cancelled;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::info!(elapsed_s = started.elapsed().as_secs(), "Search timed out");
                termination = TerminationReason::TimedOut;
                break;
            }
            let Some((state_id, path)) = stack.pop() else {
                break;
            };

            let depth = path.len();
            if depth > max_depth {
                stats.pruned_depth += 1;
                continue;
            }

            let goals = graph.goals(state_id).to_vec();
            if goals.is_empty() {
                tracing::info!(depth, tactics = ?path, "Solution found");
                graph.solutions.push(path);
                if self.config.solution_limit_reached(graph.solutions.len()) {
                    termination = if self.config.exhaustive {
                        TerminationReason::SolutionLimit
                    } else {
                        TerminationReason::FirstSolution
                    };
                    break;
                }
                continue;
            }

            // Only expand from the shallowest known arrival.
            let key = self.depth_key(state_id, &goals);
            if best_depth.get(&key).is_some_and(|&recorded| recorded < depth) {
                stats.pruned_dominated += 1;
                continue;
            }
            best_depth.insert(key, depth);

            // States at the limit are still expanded; their children are
            // dropped at pop.
            stats.nodes_expanded += 1;
            let candidates = generate_candidates(&goals[0], scope);
            tracing::debug!(
                state = %state_id,
                depth,
                candidates = candidates.len(),
                "Expanding state"
            );

            let mut children: Vec<(StateId, Vec<String>)> = Vec::new();
            for tactic in candidates {
                if !explored_edges.insert((state_id, tactic.clone())) {
                    stats.duplicate_edges += 1;
                    continue;
                }

                stats.tactic_attempts += 1;
                let result = match runner.apply_tactic(state_id, &tactic).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(state = %state_id, tactic = %tactic, error = %e, "Backend error, treating tactic as failed");
                        stats.transport_errors += 1;
                        StepResult::Failed {
                            message: e.to_string(),
                        }
                    }
                };

                match result {
                    StepResult::Failed { message } => {
                        stats.tactic_failures += 1;
                        tracing::debug!(state = %state_id, tactic = %tactic, error = %message, "Tactic failed");
                        graph.record_attempt(state_id, &tactic, AttemptOutcome::Failed);
                    }
                    StepResult::Success {
                        state_id: next,
                        goals: next_goals,
                    } => {
                        let new_depth = depth + 1;
                        stats.max_depth_reached = stats.max_depth_reached.max(new_depth);
                        let child_key = self.depth_key(next, &next_goals);
                        graph.record_attempt(state_id, &tactic, AttemptOutcome::Succeeded(next));
                        if let NodeUpsert::Refreshed { previous_depth } =
                            graph.record_node(next, next_goals, new_depth)
                        {
                            if previous_depth > new_depth {
                                tracing::debug!(
                                    state = %next,
                                    previous_depth,
                                    depth = new_depth,
                                    "Reached known state at a shallower depth"
                                );
                            }
                        }

                        if best_depth.get(&child_key).is_some_and(|&recorded| recorded <= new_depth) {
                            continue;
                        }
                        best_depth.insert(child_key, new_depth);
                        let mut child_path = path.clone();
                        child_path.push(tactic);
                        children.push((next, child_path));
                    }
                }
            }

            stats.children_enqueued += children.len();
            // Reversed so the first-emitted candidate is popped first.
            stack.extend(children.into_iter().rev());
        }

        stats.wall_time_ms = started.elapsed().as_millis() as u64;
        SearchOutcome {
            graph,
            stats,
            termination,
            init_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{solved, step, MockEnvironment};

    fn task(tactics: &[&str], lemmas: &[&str]) -> LevelTask {
        LevelTask {
            name: "test_level".into(),
            world: "Test".into(),
            level: Some(1),
            statement: "True".into(),
            scope: TacticScope::new(tactics.iter().copied(), lemmas.iter().copied()),
            solution: None,
        }
    }

    fn engine(config: SearchConfig) -> SearchEngine {
        SearchEngine::new(config)
    }

    fn exhaustive() -> SearchConfig {
        SearchConfig {
            exhaustive: true,
            ..SearchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_rfl_fails_no_solutions() {
        let env = MockEnvironment::with_root(1, &["⊢ 2 + 2 = 5"]);

        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl"], &[]))
            .await;

        assert!(!outcome.is_solved());
        assert_eq!(outcome.termination, TerminationReason::Exhausted);
        assert_eq!(
            env.submissions(),
            vec![(StateId(0), "skip".to_string()), (StateId(1), "rfl".to_string())]
        );
        assert_eq!(outcome.graph.root, Some(StateId(1)));
        assert_eq!(outcome.graph.root_failures_only(), vec!["rfl"]);
        assert_eq!(env.teardowns(), 1);
    }

    #[tokio::test]
    async fn test_one_step_proof() {
        let mut env = MockEnvironment::with_root(1, &["⊢ 37 = 37"]);
        env.add_response(1, "rfl", solved(2));

        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl"], &[]))
            .await;

        assert_eq!(outcome.solutions(), &[vec!["rfl".to_string()]]);
        assert_eq!(outcome.termination, TerminationReason::FirstSolution);
        assert_eq!(outcome.graph.node(StateId(2)).unwrap().depth, 1);
    }

    #[tokio::test]
    async fn test_two_step_proof_with_hypothesis() {
        let mut env = MockEnvironment::with_root(1, &["a b : ℕ\nh : a = b\n⊢ b = a"]);
        env.add_response(1, "rw [h]", step(2, &["a b : ℕ\nh : a = b\n⊢ b = b"]));
        env.add_response(2, "rfl", solved(3));

        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl", "rw"], &[]))
            .await;

        assert_eq!(
            outcome.solutions(),
            &[vec!["rw [h]".to_string(), "rfl".to_string()]]
        );
        // All root candidates go out before the first child is expanded.
        assert_eq!(
            env.submitted_tactics(),
            vec!["skip", "rfl", "rw [h]", "rw [← h]", "rfl", "rw [h]", "rw [← h]"]
        );
    }

    #[tokio::test]
    async fn test_max_depth_zero_expands_root_only() {
        let mut env = MockEnvironment::with_root(1, &["⊢ 0 = 0"]);
        env.add_response(1, "rfl", solved(2));

        let config = SearchConfig {
            max_depth: 0,
            ..SearchConfig::default()
        };
        let outcome = engine(config).search_level(&env, &task(&["rfl"], &[])).await;

        // The closing step sits one past the limit and is dropped.
        assert!(!outcome.is_solved());
        assert_eq!(env.submitted_tactics(), vec!["skip", "rfl"]);
        assert_eq!(outcome.stats.nodes_expanded, 1);
        assert_eq!(outcome.stats.pruned_depth, 1);
        assert_eq!(outcome.graph.len(), 2);
    }

    #[tokio::test]
    async fn test_state_at_depth_limit_is_expanded() {
        let mut env = MockEnvironment::with_root(1, &["h : a = b\n⊢ a = b"]);
        env.add_response(1, "rw [h]", step(2, &["h : a = b\n⊢ b = b"]));
        env.add_response(2, "rfl", solved(3));

        let config = SearchConfig {
            max_depth: 1,
            ..SearchConfig::default()
        };
        let outcome = engine(config).search_level(&env, &task(&["rfl", "rw"], &[])).await;

        assert!(env.submissions().contains(&(StateId(2), "rfl".to_string())));
        assert!(outcome.graph.stuck_nodes().iter().all(|n| n.state_id != StateId(2)));
        // rw [h] then rfl is two steps, one past the limit.
        assert!(!outcome.is_solved());
        assert_eq!(outcome.stats.pruned_depth, 1);
    }

    #[tokio::test]
    async fn test_solution_at_exact_depth_limit() {
        let mut env = MockEnvironment::with_root(1, &["h : a = b\n⊢ a = b"]);
        env.add_response(1, "rw [h]", solved(2));

        let config = SearchConfig {
            max_depth: 1,
            ..SearchConfig::default()
        };
        let outcome = engine(config).search_level(&env, &task(&["rw"], &[])).await;
        assert_eq!(outcome.solutions(), &[vec!["rw [h]".to_string()]]);
    }

    #[tokio::test]
    async fn test_root_already_solved() {
        let env = MockEnvironment::with_root(1, &[]);
        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl"], &[]))
            .await;
        assert_eq!(outcome.solutions(), &[Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_cycle_does_not_resubmit_edges() {
        // rw [h] and rw [← h] flip between two states forever.
        let g1 = "h : a = b\n⊢ a = c";
        let g2 = "h : a = b\n⊢ b = c";
        let mut env = MockEnvironment::with_root(1, &[g1]);
        env.add_response(1, "rw [h]", step(2, &[g2]));
        env.add_response(2, "rw [← h]", step(1, &[g1]));
        env.add_response(1, "rw [← h]", step(1, &[g1]));

        let config = SearchConfig {
            max_depth: 10,
            ..exhaustive()
        };
        let outcome = engine(config).search_level(&env, &task(&["rw"], &[])).await;

        assert!(!outcome.is_solved());
        assert_eq!(outcome.termination, TerminationReason::Exhausted);
        let submissions = env.submissions();
        let unique: HashSet<_> = submissions.iter().collect();
        assert_eq!(unique.len(), submissions.len(), "duplicate submission in {submissions:?}");
    }

    #[tokio::test]
    async fn test_shallower_arrival_dominates() {
        // Root → A (rw [h]) → C at depth 2, but also root → C (rw [← h]) at depth 1.
        let root = "h : a = b\n⊢ root";
        let a = "h : a = b\n⊢ A";
        let c = "h : a = b\n⊢ C";
        let mut env = MockEnvironment::with_root(1, &[root]);
        env.add_response(1, "rw [h]", step(2, &[a]));
        env.add_response(1, "rw [← h]", step(3, &[c]));
        env.add_response(2, "rw [h]", step(3, &[c]));
        env.add_response(3, "rfl", solved(4));

        let outcome = engine(exhaustive())
            .search_level(&env, &task(&["rfl", "rw"], &[]))
            .await;

        assert_eq!(outcome.graph.node(StateId(3)).unwrap().depth, 1);
        assert_eq!(
            outcome.solutions(),
            &[vec!["rw [← h]".to_string(), "rfl".to_string()]]
        );
        // C was expanded once: a single rfl from state 3.
        let from_c = env
            .submissions()
            .into_iter()
            .filter(|(s, _)| *s == StateId(3))
            .count();
        assert_eq!(from_c, 3, "rfl, rw [h], rw [← h] from C exactly once");
    }

    #[tokio::test]
    async fn test_first_candidate_explored_first() {
        let mut env = MockEnvironment::with_root(1, &["h : a = b\n⊢ a = b"]);
        env.add_response(1, "rw [h]", step(2, &["⊢ b = b"]));
        env.add_response(1, "rw [← h]", step(3, &["⊢ a = a"]));
        env.add_response(2, "rfl", solved(4));
        env.add_response(3, "rfl", solved(5));

        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl", "rw"], &[]))
            .await;
        assert_eq!(outcome.solutions(), &[vec!["rw [h]".to_string(), "rfl".to_string()]]);
        assert_eq!(outcome.termination, TerminationReason::FirstSolution);
        // State 3 was recorded but never expanded.
        assert!(!env.submissions().iter().any(|(s, _)| *s == StateId(3)));
    }

    #[tokio::test]
    async fn test_exhaustive_collects_in_discovery_order() {
        let mut env = MockEnvironment::with_root(1, &["h : a = b\n⊢ a = b"]);
        env.add_response(1, "rw [h]", step(2, &["⊢ b = b"]));
        env.add_response(1, "rw [← h]", step(3, &["⊢ a = a"]));
        env.add_response(2, "rfl", solved(4));
        env.add_response(3, "rfl", solved(5));

        let outcome = engine(exhaustive())
            .search_level(&env, &task(&["rfl", "rw"], &[]))
            .await;
        assert_eq!(outcome.termination, TerminationReason::Exhausted);
        assert_eq!(
            outcome.solutions(),
            &[
                vec!["rw [h]".to_string(), "rfl".to_string()],
                vec!["rw [← h]".to_string(), "rfl".to_string()],
            ]
        );

        let capped = SearchConfig {
            max_solutions: 1,
            ..exhaustive()
        };
        let mut env2 = MockEnvironment::with_root(1, &["h : a = b\n⊢ a = b"]);
        env2.add_response(1, "rw [h]", step(2, &["⊢ b = b"]));
        env2.add_response(2, "rfl", solved(4));
        let outcome = engine(capped).search_level(&env2, &task(&["rfl", "rw"], &[])).await;
        assert_eq!(outcome.termination, TerminationReason::SolutionLimit);
        assert_eq!(outcome.solutions().len(), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_is_init_failure() {
        let env = MockEnvironment::new();
        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl"], &[]))
            .await;

        assert_eq!(outcome.termination, TerminationReason::InitFailed);
        assert!(outcome.init_error.as_deref().unwrap().contains("probe failed"));
        assert!(outcome.graph.is_empty());
        assert_eq!(env.submitted_tactics(), vec!["skip"]);
        assert_eq!(env.teardowns(), 1);
    }

    #[tokio::test]
    async fn test_start_failure_is_init_failure() {
        let mut env = MockEnvironment::new();
        env.fail_start("unknown constant");
        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl"], &[]))
            .await;
        assert_eq!(outcome.termination, TerminationReason::InitFailed);
        assert!(outcome.init_error.unwrap().contains("unknown constant"));
        assert_eq!(env.teardowns(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_absorbed() {
        let mut env = MockEnvironment::with_root(1, &["h : a = b\n⊢ a = b"]);
        env.add_transport_error(1, "rfl", "timed out");
        env.add_response(1, "rw [h]", solved(2));

        let outcome = engine(SearchConfig::default())
            .search_level(&env, &task(&["rfl", "rw"], &[]))
            .await;

        assert_eq!(outcome.solutions(), &[vec!["rw [h]".to_string()]]);
        assert_eq!(outcome.stats.transport_errors, 1);
        assert_eq!(outcome.stats.tactic_failures, 2);
        let root = outcome.graph.root_node().unwrap();
        assert_eq!(root.failures, vec!["rfl", "rw [← h]"]);
    }

    #[tokio::test]
    async fn test_cancel_flag_stops_before_expansion() {
        let mut env = MockEnvironment::with_root(1, &["⊢ 0 = 0"]);
        env.add_response(1, "rfl", solved(2));
        let flag = Arc::new(AtomicBool::new(true));

        let outcome = engine(SearchConfig::default())
            .with_cancel_flag(flag)
            .search_level(&env, &task(&["rfl"], &[]))
            .await;

        assert_eq!(outcome.termination, TerminationReason::Cancelled);
        assert_eq!(env.submitted_tactics(), vec!["skip"]);
        assert_eq!(env.teardowns(), 1);
    }

    #[tokio::test]
    async fn test_goal_text_dominance_merges_states() {
        // Two different state ids with identical goal text.
        let root = "h : a = b\n⊢ a = b";
        let same = "h : a = b\n⊢ b = b";
        let mut env = MockEnvironment::with_root(1, &[root]);
        env.add_response(1, "rw [h]", step(2, &[same]));
        env.add_response(1, "rw [← h]", step(3, &[same]));

        let by_text = SearchConfig {
            dominance: DominanceKey::GoalText,
            ..exhaustive()
        };
        let outcome = engine(by_text).search_level(&env, &task(&["rw"], &[])).await;
        assert_eq!(outcome.stats.children_enqueued, 1);
        assert!(!env.submissions().iter().any(|(s, _)| *s == StateId(3)));

        let mut env = MockEnvironment::with_root(1, &[root]);
        env.add_response(1, "rw [h]", step(2, &[same]));
        env.add_response(1, "rw [← h]", step(3, &[same]));
        let outcome = engine(exhaustive()).search_level(&env, &task(&["rw"], &[])).await;
        assert_eq!(outcome.stats.children_enqueued, 2);
    }

    #[tokio::test]
    async fn test_search_without_teardown() {
        let mut env = MockEnvironment::with_root(1, &["⊢ 1 = 1"]);
        env.add_response(1, "rfl", solved(2));
        let t = task(&["rfl"], &[]);

        let mut runner = env.start_proof(&t).await.unwrap();
        let outcome = engine(SearchConfig::default())
            .search(runner.as_mut(), &t.scope)
            .await;
        assert!(outcome.is_solved());
        assert_eq!(env.teardowns(), 0);
    }
}
