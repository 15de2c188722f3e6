use serde::Deserialize;

/// Key used to decide whether a state was already reached at a shallower depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominanceKey {
    /// Backend state id. Two ids with identical goals count as different states.
    #[default]
    StateId,
    /// Joined goal text. Merges distinct backend states that print the same.
    GoalText,
}

/// Search configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum proof depth (tactics from root).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Keep searching after the first solution.
    #[serde(default)]
    pub exhaustive: bool,

    /// Stop an exhaustive search after this many solutions. 0 = unlimited.
    #[serde(default)]
    pub max_solutions: usize,

    /// Key for depth dominance checks.
    #[serde(default)]
    pub dominance: DominanceKey,

    /// Maximum wall-clock seconds per level. 0 = no deadline.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_max_depth() -> usize {
    6
}

impl SearchConfig {
    /// Log warnings for settings that are legal but probably not intended.
    pub fn validate(&self) {
        if self.max_solutions > 0 && !self.exhaustive {
            tracing::warn!(
                max_solutions = self.max_solutions,
                "max_solutions has no effect unless exhaustive = true"
            );
        }
        if self.dominance == DominanceKey::GoalText {
            tracing::warn!(
                "dominance = goal_text merges distinct backend states; solutions may be missed"
            );
        }
        if self.max_depth > 12 {
            tracing::warn!(
                max_depth = self.max_depth,
                "large max_depth; the candidate tree grows exponentially with depth"
            );
        }
    }

    /// Whether `found` solutions are enough to stop.
    pub fn solution_limit_reached(&self, found: usize) -> bool {
        if !self.exhaustive {
            return found > 0;
        }
        self.max_solutions > 0 && found >= self.max_solutions
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            exhaustive: false,
            max_solutions: 0,
            dominance: DominanceKey::default(),
            timeout_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.max_depth, 6);
        assert!(!cfg.exhaustive);
        assert_eq!(cfg.max_solutions, 0);
        assert_eq!(cfg.dominance, DominanceKey::StateId);
        assert_eq!(cfg.timeout_secs, 0);
    }

    #[test]
    fn test_partial_toml_override() {
        let cfg: SearchConfig = toml::from_str("max_depth = 3").unwrap();
        assert_eq!(cfg.max_depth, 3);
        assert!(!cfg.exhaustive);
        assert_eq!(cfg.dominance, DominanceKey::StateId);
    }

    #[test]
    fn test_full_toml() {
        let toml_str = r#"
            max_depth = 8
            exhaustive = true
            max_solutions = 5
            dominance = "goal_text"
            timeout_secs = 120
        "#;
        let cfg: SearchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.max_depth, 8);
        assert!(cfg.exhaustive);
        assert_eq!(cfg.max_solutions, 5);
        assert_eq!(cfg.dominance, DominanceKey::GoalText);
        assert_eq!(cfg.timeout_secs, 120);
    }

    #[test]
    fn test_unknown_dominance_rejected() {
        assert!(toml::from_str::<SearchConfig>(r#"dominance = "depth""#).is_err());
    }

    #[test]
    fn test_solution_limit() {
        let early = SearchConfig::default();
        assert!(!early.solution_limit_reached(0));
        assert!(early.solution_limit_reached(1));

        let unlimited = SearchConfig {
            exhaustive: true,
            ..Default::default()
        };
        assert!(!unlimited.solution_limit_reached(1000));

        let capped = SearchConfig {
            exhaustive: true,
            max_solutions: 2,
            ..Default::default()
        };
        assert!(!capped.solution_limit_reached(1));
        assert!(capped.solution_limit_reached(2));
    }

    #[test]
    fn test_validate_does_not_panic() {
        SearchConfig::default().validate();
        SearchConfig {
            max_solutions: 3,
            dominance: DominanceKey::GoalText,
            max_depth: 20,
            ..Default::default()
        }
        .validate();
    }
}
