//! Level metadata for the search: which statement to prove and which tactics
//! and lemmas are in scope.
//!
//! A [`LevelIndex`] is loaded from JSON. Scope is cumulative: a level may use
//! everything unlocked by the levels before it in play order, plus its own
//! additions.

pub mod scope;
pub mod types;

pub use scope::TacticScope;
pub use types::{LevelEntry, LevelIndex, LevelTask};
