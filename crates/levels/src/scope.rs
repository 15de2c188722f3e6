//! Tactic names and lemma names usable at a level.

use serde::{Deserialize, Serialize};

/// What the search may use at a level: tactic keywords and lemma names.
///
/// Both lists keep first-seen order and hold no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticScope {
    /// Tactic keywords, introduced tactics first and hidden ones after.
    pub tactics: Vec<String>,
    /// Lemma names in the order they were unlocked.
    pub lemmas: Vec<String>,
}

impl TacticScope {
    /// Build a scope, dropping duplicates and blank names.
    pub fn new<T, L>(tactics: T, lemmas: L) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let mut scope = Self::default();
        push_unique(&mut scope.tactics, tactics);
        push_unique(&mut scope.lemmas, lemmas);
        scope
    }

    /// Whether `name` is an available tactic.
    pub fn has_tactic(&self, name: &str) -> bool {
        self.tactics.iter().any(|t| t == name)
    }

    /// Add lemma names, also registering the last segment of dotted names
    /// (`Nat.succ_ne_zero` adds `succ_ne_zero` too).
    pub fn add_theorems<I>(&mut self, names: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            push_unique(&mut self.lemmas, [name]);
            if let Some((_, short)) = name.rsplit_once('.') {
                push_unique(&mut self.lemmas, [short]);
            }
        }
    }
}

/// Append items not already present, skipping blank ones.
pub(crate) fn push_unique<I>(existing: &mut Vec<String>, items: I)
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    for item in items {
        let item = item.into();
        if !item.trim().is_empty() && !existing.contains(&item) {
            existing.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dedups_and_drops_blank() {
        let scope = TacticScope::new(["rfl", "rw", "rfl", ""], ["h", " ", "h"]);
        assert_eq!(scope.tactics, vec!["rfl", "rw"]);
        assert_eq!(scope.lemmas, vec!["h"]);
    }

    #[test]
    fn has_tactic_is_exact() {
        let scope = TacticScope::new(["rw"], Vec::<String>::new());
        assert!(scope.has_tactic("rw"));
        assert!(!scope.has_tactic("nth_rewrite"));
    }

    #[test]
    fn dotted_theorem_adds_short_name() {
        let mut scope = TacticScope::default();
        scope.add_theorems(["Nat.succ_ne_zero", "add_zero", "MyNat.add_zero"]);
        assert_eq!(scope.lemmas, vec!["Nat.succ_ne_zero", "succ_ne_zero", "add_zero", "MyNat.add_zero"]);
    }

    #[test]
    fn trailing_dot_adds_nothing_extra() {
        let mut scope = TacticScope::default();
        scope.add_theorems(["Weird."]);
        assert_eq!(scope.lemmas, vec!["Weird."]);
    }
}
