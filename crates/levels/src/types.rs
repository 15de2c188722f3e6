//! Level index: worlds of ordered levels, each unlocking tactics and theorems.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scope::{push_unique, TacticScope};

/// One level as described in the index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelEntry {
    /// World the level belongs to (e.g. `"Tutorial"`).
    pub world: String,
    /// Position inside the world. Unnumbered levels sort last.
    #[serde(default)]
    pub level: Option<u32>,
    /// Unique level name, also used as the theorem name for `copyFrom`.
    pub name: String,
    /// Lean expression of the statement to prove.
    pub statement: String,
    /// Tactics introduced by this level.
    #[serde(default)]
    pub new_tactics: Vec<String>,
    /// Tactics usable from this level on without being announced.
    #[serde(default)]
    pub hidden_tactics: Vec<String>,
    /// Theorems unlocked by this level.
    #[serde(default)]
    pub new_theorems: Vec<String>,
    /// Reference solution text, if the level ships one.
    #[serde(default)]
    pub solution: Option<String>,
}

/// A level ready to search: its statement plus the scope accumulated so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelTask {
    pub name: String,
    pub world: String,
    pub level: Option<u32>,
    pub statement: String,
    pub scope: TacticScope,
    pub solution: Option<String>,
}

/// All levels of a game, loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelIndex {
    /// Declared world order. Worlds missing here are appended alphabetically.
    #[serde(default)]
    pub worlds: Vec<String>,
    /// Levels in any order.
    pub levels: Vec<LevelEntry>,
}

impl LevelIndex {
    /// Load a level index from a JSON file.
    pub fn from_json(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let index: Self = serde_json::from_str(&contents)?;
        tracing::info!(count = index.levels.len(), path = %path.display(), "Loaded level index");
        Ok(index)
    }

    /// Number of levels in the index.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the index has no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Worlds in play order: declared ones first, then the rest sorted
    /// case-insensitively. Declared worlds without levels are left out.
    pub fn world_order(&self) -> Vec<String> {
        let mut present: Vec<String> = Vec::new();
        push_unique(&mut present, self.levels.iter().map(|l| l.world.clone()));

        let mut ordered: Vec<String> = Vec::new();
        for world in &self.worlds {
            if present.contains(world) && !ordered.contains(world) {
                ordered.push(world.clone());
            }
        }
        let mut remaining: Vec<String> = present
            .into_iter()
            .filter(|w| !ordered.contains(w))
            .collect();
        remaining.sort_by_key(|w| w.to_lowercase());
        ordered.extend(remaining);
        ordered
    }

    /// Levels in play order (worlds by [`world_order`](Self::world_order),
    /// then by level number).
    pub fn ordered_levels(&self) -> Vec<&LevelEntry> {
        let mut ordered = Vec::with_capacity(self.levels.len());
        for world in self.world_order() {
            let mut in_world: Vec<&LevelEntry> =
                self.levels.iter().filter(|l| l.world == world).collect();
            in_world.sort_by_key(|l| (l.level.is_none(), l.level));
            ordered.extend(in_world);
        }
        ordered
    }

    /// Every level as a task, each carrying the scope accumulated over all
    /// levels up to and including itself.
    pub fn tasks(&self) -> Vec<LevelTask> {
        let mut introduced: Vec<String> = Vec::new();
        let mut hidden: Vec<String> = Vec::new();
        let mut theorems = TacticScope::default();

        self.ordered_levels()
            .into_iter()
            .map(|entry| {
                push_unique(&mut introduced, entry.new_tactics.iter().cloned());
                push_unique(&mut hidden, entry.hidden_tactics.iter().cloned());
                theorems.add_theorems(&entry.new_theorems);

                let scope = TacticScope::new(
                    introduced.iter().chain(hidden.iter()).cloned(),
                    theorems.lemmas.iter().cloned(),
                );
                LevelTask {
                    name: entry.name.clone(),
                    world: entry.world.clone(),
                    level: entry.level,
                    statement: entry.statement.clone(),
                    scope,
                    solution: entry.solution.clone(),
                }
            })
            .collect()
    }

    /// The task for a single level.
    pub fn task(&self, name: &str) -> anyhow::Result<LevelTask> {
        self.tasks()
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| anyhow::anyhow!("Level '{name}' was not found in the level index"))
    }

    /// Tasks of one world, in level order.
    pub fn world_tasks(&self, world: &str) -> Vec<LevelTask> {
        self.tasks().into_iter().filter(|t| t.world == world).collect()
    }
}
