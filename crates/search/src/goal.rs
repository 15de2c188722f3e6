//! Lightweight structural hints pulled from a goal's hypothesis lines.

/// Tokens that rule a hypothesis out as an induction target.
const NON_INDUCTIVE_TOKENS: &[&str] = &["→", "∀", "∃", "↔", "≠", "≤", "≥", "⊢", ":="];

/// Names found in the hypotheses of one goal, in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalHints {
    /// Hypotheses whose type is an equality; usable as rewrite rules.
    pub equalities: Vec<String>,
    /// Plain variables that `induction` could be applied to.
    pub induction_targets: Vec<String>,
}

/// Scan the hypothesis lines of `goal`.
///
/// Never fails: text that does not look like a hypothesis is ignored.
/// Parsing stops at the `⊢` line; `case` tag lines are skipped. Names are not
/// deduplicated.
pub fn parse_goal(goal: &str) -> GoalHints {
    let mut hints = GoalHints::default();

    for raw_line in goal.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("case") {
            continue;
        }
        if line.starts_with('⊢') {
            break;
        }
        let Some((names, type_str)) = line.split_once(':') else {
            continue;
        };
        let names: Vec<String> = names
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            continue;
        }

        let type_str = type_str.trim();
        if type_str.contains('=') {
            hints.equalities.extend(names);
        } else if !NON_INDUCTIVE_TOKENS.iter().any(|t| type_str.contains(t)) {
            hints.induction_targets.extend(names);
        }
    }

    hints
}
