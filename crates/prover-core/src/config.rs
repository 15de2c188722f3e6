//! TOML config loading for the prover CLI.
//!
//! Deserializes `configs/search.toml`, which has `[search]` and `[lean]`
//! sections, then merges in CLI overrides.

use std::path::{Path, PathBuf};

use lean_repl::LeanConfig;
use search::SearchConfig;
use serde::Deserialize;

/// Top-level structure matching `configs/search.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchToml {
    /// Search parameters.
    #[serde(default)]
    pub search: SearchConfig,
    /// Pantograph process settings.
    #[serde(default)]
    pub lean: LeanConfig,
}

/// Load and deserialize a `SearchToml` from a TOML file.
pub fn load_search_toml(path: &Path) -> anyhow::Result<SearchToml> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read config {}: {e}", path.display()))?;
    let config: SearchToml = toml::from_str(&contents)?;
    tracing::info!(path = %path.display(), "Loaded search config");
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to built-in defaults.
pub fn load_or_default(path: &Path) -> anyhow::Result<SearchToml> {
    if path.exists() {
        load_search_toml(path)
    } else {
        tracing::info!(path = %path.display(), "Config not found, using defaults");
        Ok(SearchToml::default())
    }
}

/// Search settings given on the command line. `None` keeps the TOML value.
#[derive(Debug, Default, Clone)]
pub struct SearchOverrides {
    pub max_depth: Option<usize>,
    pub exhaustive: bool,
    pub max_solutions: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl SearchOverrides {
    /// Priority chain: built-in defaults < TOML values < CLI flags.
    pub fn apply(&self, mut config: SearchConfig) -> SearchConfig {
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if self.exhaustive {
            config.exhaustive = true;
        }
        if let Some(n) = self.max_solutions {
            config.max_solutions = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        config
    }
}

/// Point the backend at a Lean project directory given on the command line.
pub fn apply_project(mut config: LeanConfig, project: Option<&PathBuf>) -> LeanConfig {
    if let Some(dir) = project {
        config.lean_env_path = dir.clone();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use search::DominanceKey;

    #[test]
    fn test_deserialize_full_search_toml() {
        let toml_str = r#"
[search]
max_depth = 8
exhaustive = true
max_solutions = 3
dominance = "goal_text"
timeout_secs = 120

[lean]
pantograph_path = "lake"
lean_env_path = "/opt/nng4"
imports = ["Game"]
tactic_timeout_secs = 15
"#;
        let config: SearchToml = toml::from_str(toml_str).unwrap();
        assert_eq!(config.search.max_depth, 8);
        assert!(config.search.exhaustive);
        assert_eq!(config.search.max_solutions, 3);
        assert_eq!(config.search.dominance, DominanceKey::GoalText);
        assert_eq!(config.search.timeout_secs, 120);
        assert_eq!(config.lean.lean_env_path, PathBuf::from("/opt/nng4"));
        assert_eq!(config.lean.imports, vec!["Game"]);
        assert_eq!(config.lean.tactic_timeout_secs, 15);
        // Unset field keeps its default.
        assert_eq!(config.lean.startup_timeout_secs, 120);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: SearchToml = toml::from_str("").unwrap();
        assert_eq!(config.search.max_depth, 6);
        assert!(!config.search.exhaustive);
        assert_eq!(config.lean.pantograph_path, PathBuf::from("lake"));
    }

    #[test]
    fn test_cli_override_priority() {
        let toml_config = SearchConfig {
            max_depth: 4,
            timeout_secs: 60,
            ..SearchConfig::default()
        };
        let overrides = SearchOverrides {
            max_depth: Some(9),
            exhaustive: true,
            ..SearchOverrides::default()
        };
        let merged = overrides.apply(toml_config);
        assert_eq!(merged.max_depth, 9);
        assert!(merged.exhaustive);
        // Not overridden.
        assert_eq!(merged.timeout_secs, 60);
        assert_eq!(merged.max_solutions, 0);
    }

    #[test]
    fn test_project_override() {
        let config = apply_project(LeanConfig::default(), Some(&PathBuf::from("/games/nng")));
        assert_eq!(config.lean_env_path, PathBuf::from("/games/nng"));
        let config = apply_project(LeanConfig::default(), None);
        assert_eq!(config.lean_env_path, PathBuf::from("."));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = load_or_default(Path::new("/nonexistent/search.toml")).unwrap();
        assert_eq!(config.search.max_depth, 6);
        assert!(load_search_toml(Path::new("/nonexistent/search.toml")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("search.toml");
        std::fs::write(&path, "[search]\nmax_depth = 3\n").unwrap();
        let config = load_search_toml(&path).unwrap();
        assert_eq!(config.search.max_depth, 3);
    }
}
