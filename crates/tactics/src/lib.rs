//! Structured tactic models for Natural Number Game style proofs.
//!
//! Two pieces live here:
//!
//! - [`Tactic`]: a closed set of tactic shapes (`rw`, `apply`,
//!   `nth_rewrite`, `rfl`) with a canonical text form, parsed through an
//!   explicit keyword table. Unknown keywords fail with a typed
//!   [`TacticParseError`] naming the keyword.
//! - [`extract_commands`]: splits a reference solution into the tactic
//!   commands it contains, skipping hints, bullets and comments.

pub mod model;
pub mod script;

pub use model::{
    is_supported_keyword, leading_keyword, normalize, parse_tactic, supported_keywords,
    Direction, RewriteRule, Tactic, TacticParseError,
};
pub use script::{extract_commands, is_tactic_like};
