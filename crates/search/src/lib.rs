//! Depth-limited depth-first tactic search.
//!
//! The search explores proof states reported by an external backend. From
//! each state it synthesizes candidate tactics out of the first goal's
//! hypotheses and the level's scope, submits them one by one, and follows
//! the successful ones depth first. Trait-based backends keep the driver
//! testable with mocks (no Lean needed).
//!
//! # Key types
//!
//! - [`SearchEngine`]: the DFS driver
//! - [`SearchConfig`]: configuration loaded from TOML
//! - [`SearchGraph`] / [`SearchNode`]: the trace of one search
//! - [`ProofEnvironment`] / [`TacticRunner`]: backend traits
//! - [`LeanEnvironment`]: Pantograph-backed environment
//! - [`replay_level`]: apply a fixed tactic sequence and report progress

pub mod adapters;
pub mod candidates;
pub mod config;
pub mod engine;
pub mod goal;
pub mod graph;
pub mod mocks;
pub mod replay;

pub use adapters::{LeanEnvironment, LeanTacticRunner};
pub use candidates::generate_candidates;
pub use config::{DominanceKey, SearchConfig};
pub use engine::{
    ProofEnvironment, SearchEngine, SearchError, SearchOutcome, SearchStats, StepResult,
    TacticRunner, TerminationReason, PROBE_TACTIC,
};
pub use goal::{parse_goal, GoalHints};
pub use graph::{AttemptOutcome, AttemptTally, NodeUpsert, SearchGraph, SearchNode, StateId};
pub use replay::{replay, replay_level, ReplayCommand, ReplayFailure, ReplayOutcome};
