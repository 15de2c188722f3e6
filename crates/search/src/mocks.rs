//! Mock implementations of search traits for testing without Lean.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use levels::LevelTask;

use crate::engine::{ProofEnvironment, SearchError, StepResult, TacticRunner, PROBE_TACTIC};
use crate::graph::StateId;

/// Canned reply for one `(state, tactic)` pair.
#[derive(Debug, Clone)]
enum MockReply {
    Step(StepResult),
    TransportError(String),
}

/// Successful step to `state_id` with the given goals.
pub fn step(state_id: u64, goals: &[&str]) -> StepResult {
    StepResult::Success {
        state_id: StateId(state_id),
        goals: goals.iter().map(|g| g.to_string()).collect(),
    }
}

/// Step that closes every goal.
pub fn solved(state_id: u64) -> StepResult {
    step(state_id, &[])
}

/// Mock proof environment returning canned results by `(state_id, tactic)`.
///
/// Unknown pairs fail like a rejected tactic. Every submission is logged so
/// tests can check what the search sent.
pub struct MockEnvironment {
    responses: Arc<HashMap<(StateId, String), MockReply>>,
    initial_state_id: StateId,
    start_error: Option<String>,
    submissions: Arc<Mutex<Vec<(StateId, String)>>>,
    teardowns: Arc<AtomicUsize>,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnvironment {
    /// Create a mock with initial handle 0 and no responses.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(HashMap::new()),
            initial_state_id: StateId(0),
            start_error: None,
            submissions: Arc::new(Mutex::new(Vec::new())),
            teardowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock whose probe of handle 0 lands on `root` with `goals`.
    pub fn with_root(root: u64, goals: &[&str]) -> Self {
        let mut env = Self::new();
        env.add_response(0, PROBE_TACTIC, step(root, goals));
        env
    }

    /// Add a canned result for a `(state_id, tactic)` pair.
    pub fn add_response(&mut self, state_id: u64, tactic: &str, result: StepResult) {
        self.insert(state_id, tactic, MockReply::Step(result));
    }

    /// Make a `(state_id, tactic)` pair fail at the transport level.
    pub fn add_transport_error(&mut self, state_id: u64, tactic: &str, message: &str) {
        self.insert(state_id, tactic, MockReply::TransportError(message.to_string()));
    }

    /// Make `start_proof` fail.
    pub fn fail_start(&mut self, message: &str) {
        self.start_error = Some(message.to_string());
    }

    fn insert(&mut self, state_id: u64, tactic: &str, reply: MockReply) {
        Arc::get_mut(&mut self.responses)
            .expect("cannot add responses after starting a proof")
            .insert((StateId(state_id), tactic.to_string()), reply);
    }

    /// Every `(state, tactic)` submitted so far, in order.
    pub fn submissions(&self) -> Vec<(StateId, String)> {
        self.submissions.lock().expect("submission log poisoned").clone()
    }

    /// Submitted tactics only, in order.
    pub fn submitted_tactics(&self) -> Vec<String> {
        self.submissions().into_iter().map(|(_, t)| t).collect()
    }

    /// Number of runners torn down.
    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofEnvironment for MockEnvironment {
    async fn start_proof(&self, _task: &LevelTask) -> Result<Box<dyn TacticRunner + Send>, SearchError> {
        if let Some(message) = &self.start_error {
            return Err(SearchError::ProofStart(message.clone()));
        }
        Ok(Box::new(MockTacticRunner {
            initial: self.initial_state_id,
            responses: Arc::clone(&self.responses),
            submissions: Arc::clone(&self.submissions),
            teardowns: Arc::clone(&self.teardowns),
        }))
    }
}

/// Mock runner sharing its environment's tables and logs.
pub struct MockTacticRunner {
    initial: StateId,
    responses: Arc<HashMap<(StateId, String), MockReply>>,
    submissions: Arc<Mutex<Vec<(StateId, String)>>>,
    teardowns: Arc<AtomicUsize>,
}

#[async_trait]
impl TacticRunner for MockTacticRunner {
    fn initial_state(&self) -> StateId {
        self.initial
    }

    async fn apply_tactic(
        &mut self,
        state_id: StateId,
        tactic: &str,
    ) -> Result<StepResult, SearchError> {
        self.submissions
            .lock()
            .expect("submission log poisoned")
            .push((state_id, tactic.to_string()));

        match self.responses.get(&(state_id, tactic.to_string())) {
            Some(MockReply::Step(result)) => Ok(result.clone()),
            Some(MockReply::TransportError(message)) => Err(SearchError::Backend(message.clone())),
            None => Ok(StepResult::Failed {
                message: format!("unknown tactic '{tactic}' at state {state_id}"),
            }),
        }
    }

    async fn teardown(&mut self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}
