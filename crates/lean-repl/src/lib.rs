//! Async Lean 4 client speaking the Pantograph JSON-lines protocol.
//!
//! One [`LeanWorker`] owns one Pantograph child process. Requests are sent
//! one at a time: `goal.start` (from an expression or, via `copyFrom`, from a
//! theorem already in the environment) and `goal.tactic`.
//!
//! ```rust,no_run
//! use lean_repl::{LeanConfig, LeanWorker, TacticResult};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LeanConfig::for_project("/path/to/NNG4");
//! let mut worker = LeanWorker::spawn(&config).await?;
//! let state = worker.start_proof("∀ (n : Nat), n = n").await?;
//! let result = worker.apply_tactic(state.state_id, None, "intro n").await?;
//! if let TacticResult::Success { goals, .. } = result {
//!     println!("{}", goals[0].raw);
//! }
//! worker.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod protocol;
pub mod types;
pub mod worker;

pub use protocol::{PantographRequest, PantographResponse};
pub use types::{Goal, LeanConfig, LeanError, ProofState, TacticResult};
pub use worker::LeanWorker;
