//! Tactic candidates for a goal, built from its hypotheses and the level scope.

use levels::TacticScope;
use tactics::{RewriteRule, Tactic};

use crate::goal::parse_goal;

/// Keyword gating `induction` candidates. Not part of the structured model.
pub const INDUCTION: &str = "induction";

/// Occurrence positions tried for `nth_rewrite`.
pub const NTH_REWRITE_POSITIONS: std::ops::RangeInclusive<u32> = 1..=3;

/// Candidates for `goal` in emission order.
///
/// Order: `rfl`; `rw` forward then backward per rewrite name; `nth_rewrite`
/// for each position, per name, forward then backward; `induction` per
/// variable. Each group only when its tactic is in scope. Rewrite names are
/// the goal's equality hypotheses followed by the scope's lemmas, with
/// duplicates and blank names dropped.
pub fn generate_candidates(goal: &str, scope: &TacticScope) -> Vec<String> {
    let hints = parse_goal(goal);

    let mut rewrite_names: Vec<&str> = Vec::new();
    for name in hints
        .equalities
        .iter()
        .chain(&scope.lemmas)
        .map(String::as_str)
        .filter(|n| !n.is_empty())
    {
        if !rewrite_names.contains(&name) {
            rewrite_names.push(name);
        }
    }

    let rules = |name: &str| [RewriteRule::forward(name), RewriteRule::backward(name)];

    let mut candidates = Vec::new();
    if scope.has_tactic(Tactic::Rfl.keyword()) {
        candidates.push(Tactic::Rfl.to_string());
    }

    if scope.has_tactic("rw") {
        for &name in &rewrite_names {
            for rule in rules(name) {
                candidates.push(Tactic::rewrite(rule).to_string());
            }
        }
    }

    if scope.has_tactic("nth_rewrite") {
        for position in NTH_REWRITE_POSITIONS {
            for &name in &rewrite_names {
                for rule in rules(name) {
                    candidates.push(Tactic::nth_rewrite(position, rule).to_string());
                }
            }
        }
    }

    if scope.has_tactic(INDUCTION) {
        for name in &hints.induction_targets {
            candidates.push(format!("{INDUCTION} {name}"));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(tactics: &[&str], lemmas: &[&str]) -> TacticScope {
        TacticScope::new(tactics.iter().copied(), lemmas.iter().copied())
    }

    #[test]
    fn rfl_only() {
        let candidates = generate_candidates("⊢ 37 = 37", &scope(&["rfl"], &[]));
        assert_eq!(candidates, vec!["rfl"]);
    }

    #[test]
    fn rewrite_with_hypothesis() {
        let candidates = generate_candidates("a b : ℕ\nh : a = b\n⊢ b = a", &scope(&["rw"], &[]));
        assert_eq!(candidates, vec!["rw [h]", "rw [← h]"]);
    }

    #[test]
    fn hypotheses_before_lemmas_and_dedup() {
        let candidates = generate_candidates(
            "h : a = b\n⊢ b = a",
            &scope(&["rw"], &["add_zero", "h", "add_zero"]),
        );
        assert_eq!(
            candidates,
            vec!["rw [h]", "rw [← h]", "rw [add_zero]", "rw [← add_zero]"]
        );
    }

    #[test]
    fn nth_rewrite_positions_outermost() {
        let candidates =
            generate_candidates("h : a = b\n⊢ a = a", &scope(&["nth_rewrite"], &["two_eq_succ_one"]));
        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], "nth_rewrite 1 [h]");
        assert_eq!(candidates[1], "nth_rewrite 1 [← h]");
        assert_eq!(candidates[2], "nth_rewrite 1 [two_eq_succ_one]");
        assert_eq!(candidates[3], "nth_rewrite 1 [← two_eq_succ_one]");
        assert_eq!(candidates[4], "nth_rewrite 2 [h]");
        assert_eq!(candidates[11], "nth_rewrite 3 [← two_eq_succ_one]");
    }

    #[test]
    fn full_emission_order() {
        let candidates = generate_candidates(
            "n : ℕ\nh : n = 0\n⊢ n + 0 = 0",
            &scope(&["induction", "nth_rewrite", "rw", "rfl"], &[]),
        );
        let expected: Vec<String> = [
            "rfl",
            "rw [h]",
            "rw [← h]",
            "nth_rewrite 1 [h]",
            "nth_rewrite 1 [← h]",
            "nth_rewrite 2 [h]",
            "nth_rewrite 2 [← h]",
            "nth_rewrite 3 [h]",
            "nth_rewrite 3 [← h]",
            "induction n",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn gating_excludes_unavailable_tactics() {
        let candidates = generate_candidates("n : ℕ\nh : n = 0\n⊢ n = 0", &scope(&["apply"], &["foo"]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn no_rewrite_names_no_rw_candidates() {
        let candidates = generate_candidates("⊢ 2 = 2", &scope(&["rw", "nth_rewrite"], &[""]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn deterministic() {
        let s = scope(&["rfl", "rw", "nth_rewrite", "induction"], &["add_succ", "succ_eq_add_one"]);
        let goal = "case succ\nd : ℕ\nhd : d + 0 = d\n⊢ succ d + 0 = succ d";
        assert_eq!(generate_candidates(goal, &s), generate_candidates(goal, &s));
    }

    #[test]
    fn every_candidate_uses_an_available_keyword() {
        let s = scope(&["rw", "induction"], &["add_zero"]);
        let goal = "x : ℕ\nh : x = 1\n⊢ x + 0 = 1";
        for candidate in generate_candidates(goal, &s) {
            let keyword = candidate.split_whitespace().next().unwrap();
            assert!(s.has_tactic(keyword), "{candidate}");
        }
    }
}
