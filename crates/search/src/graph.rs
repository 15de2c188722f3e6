//! Record of everything one search saw: states, their goals, the shallowest
//! depth each was reached at, and every tactic tried from each.
//!
//! The graph is a passive recorder. Traversal decisions live in the engine;
//! the views at the bottom of this file are for diagnostics after the fact.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend-assigned identifier of a proof state. Opaque to the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u64);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StateId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One visited proof state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchNode {
    pub state_id: StateId,
    /// Open goals at the latest observation. Empty means solved.
    pub goals: Vec<String>,
    /// Shallowest depth this state was reached at.
    pub depth: usize,
    /// Every tactic submitted from this state, in submission order.
    pub tactics_tried: Vec<String>,
    /// Tactics that succeeded, with the state they led to.
    pub successes: Vec<(String, StateId)>,
    /// Tactics the backend rejected.
    pub failures: Vec<String>,
}

impl SearchNode {
    fn new(state_id: StateId, goals: Vec<String>, depth: usize) -> Self {
        Self {
            state_id,
            goals,
            depth,
            tactics_tried: Vec::new(),
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// First line of the first goal, for short listings.
    pub fn goal_preview(&self) -> &str {
        self.goals
            .first()
            .and_then(|g| g.lines().next())
            .unwrap_or("")
    }

    /// Whether the node has open goals but no successful tactic.
    pub fn is_stuck(&self) -> bool {
        !self.goals.is_empty() && self.successes.is_empty()
    }
}

/// What [`SearchGraph::record_node`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeUpsert {
    /// First time this state was seen.
    Inserted,
    /// Known state; goals replaced, depth lowered to the minimum.
    Refreshed { previous_depth: usize },
}

/// Result of submitting one tactic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded(StateId),
    Failed,
}

/// Per-state attempt counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptTally {
    pub state_id: StateId,
    pub depth: usize,
    pub tried: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// All states visited in one search, plus the solutions found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchGraph {
    pub nodes: HashMap<StateId, SearchNode>,
    /// First state recorded at depth 0.
    pub root: Option<StateId>,
    /// Tactic sequences that closed every goal, in discovery order.
    pub solutions: Vec<Vec<String>>,
}

impl SearchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a state or refresh an existing one.
    ///
    /// Goals are always replaced by the latest observation. Depth only ever
    /// decreases. The first node recorded at depth 0 becomes the root.
    pub fn record_node(&mut self, state_id: StateId, goals: Vec<String>, depth: usize) -> NodeUpsert {
        match self.nodes.get_mut(&state_id) {
            Some(node) => {
                let previous_depth = node.depth;
                node.goals = goals;
                node.depth = node.depth.min(depth);
                NodeUpsert::Refreshed { previous_depth }
            }
            None => {
                self.nodes
                    .insert(state_id, SearchNode::new(state_id, goals, depth));
                if depth == 0 && self.root.is_none() {
                    self.root = Some(state_id);
                }
                NodeUpsert::Inserted
            }
        }
    }

    /// Log a tactic submission against `state_id`.
    ///
    /// An unknown state gets an empty placeholder node at depth 0. Nothing is
    /// deduplicated here.
    pub fn record_attempt(&mut self, state_id: StateId, tactic: &str, outcome: AttemptOutcome) {
        let node = self
            .nodes
            .entry(state_id)
            .or_insert_with(|| SearchNode::new(state_id, Vec::new(), 0));
        node.tactics_tried.push(tactic.to_string());
        match outcome {
            AttemptOutcome::Succeeded(next) => node.successes.push((tactic.to_string(), next)),
            AttemptOutcome::Failed => node.failures.push(tactic.to_string()),
        }
    }

    pub fn node(&self, state_id: StateId) -> Option<&SearchNode> {
        self.nodes.get(&state_id)
    }

    /// Latest goals observed for a state; empty for unknown states.
    pub fn goals(&self, state_id: StateId) -> &[String] {
        self.nodes
            .get(&state_id)
            .map(|n| n.goals.as_slice())
            .unwrap_or(&[])
    }

    pub fn root_node(&self) -> Option<&SearchNode> {
        self.root.and_then(|id| self.nodes.get(&id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tactics that failed at the root and never succeeded there.
    pub fn root_failures_only(&self) -> Vec<&str> {
        let Some(root) = self.root_node() else {
            return Vec::new();
        };
        let mut out: Vec<&str> = Vec::new();
        for tactic in &root.failures {
            let succeeded = root.successes.iter().any(|(t, _)| t == tactic);
            if !succeeded && !out.contains(&tactic.as_str()) {
                out.push(tactic);
            }
        }
        out
    }

    /// Nodes with open goals and no successful tactic, shallowest first.
    pub fn stuck_nodes(&self) -> Vec<&SearchNode> {
        let mut stuck: Vec<&SearchNode> = self.nodes.values().filter(|n| n.is_stuck()).collect();
        stuck.sort_by_key(|n| (n.depth, n.state_id));
        stuck
    }

    /// Every node, shallowest first (ties by state id).
    pub fn nodes_by_depth(&self) -> Vec<&SearchNode> {
        let mut nodes: Vec<&SearchNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| (n.depth, n.state_id));
        nodes
    }

    /// Attempt counts per state, in [`nodes_by_depth`](Self::nodes_by_depth) order.
    pub fn tallies(&self) -> Vec<AttemptTally> {
        self.nodes_by_depth()
            .into_iter()
            .map(|n| AttemptTally {
                state_id: n.state_id,
                depth: n.depth,
                tried: n.tactics_tried.len(),
                succeeded: n.successes.len(),
                failed: n.failures.len(),
            })
            .collect()
    }
}
