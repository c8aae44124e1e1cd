use std::{fmt::Debug, path::Path};

use anyhow::Context;
use hearth_clap::DisplaySlot;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const SCOREBOARD_FILE: &str = "scoreboard.toml";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreboardError {
    #[error("An objective already exists by that name")]
    DuplicateObjective(String),
    #[error("Unknown scoreboard objective '{0}'")]
    UnknownObjective(String),
    #[error("Objective names cannot be longer than {MAX_NAME_LEN} characters")]
    NameTooLong(String),
}

const MAX_NAME_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub criteria: String,
    pub display_name: String,
}

/// Objectives and which of them are shown where. Scores themselves live with their holders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    #[serde(default)]
    objectives: IndexMap<String, Objective>,
    #[serde(default)]
    display_slots: IndexMap<DisplaySlot, String>,
}

impl Scoreboard {
    pub fn add_objective(
        &mut self,
        name: &str,
        criteria: &str,
        display_name: Option<&str>,
    ) -> Result<&Objective, ScoreboardError> {
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ScoreboardError::NameTooLong(name.to_owned()));
        }
        if self.objectives.contains_key(name) {
            return Err(ScoreboardError::DuplicateObjective(name.to_owned()));
        }

        let objective = Objective {
            criteria: criteria.to_owned(),
            display_name: display_name.unwrap_or(name).to_owned(),
        };
        Ok(self.objectives.entry(name.to_owned()).or_insert(objective))
    }

    /// Removes the objective and clears every slot showing it.
    pub fn remove_objective(&mut self, name: &str) -> Result<Objective, ScoreboardError> {
        let objective = self
            .objectives
            .shift_remove(name)
            .ok_or_else(|| ScoreboardError::UnknownObjective(name.to_owned()))?;
        self.display_slots.retain(|_, shown| shown != name);
        Ok(objective)
    }

    pub fn objectives(&self) -> impl Iterator<Item = (&str, &Objective)> {
        self.objectives
            .iter()
            .map(|(name, objective)| (name.as_str(), objective))
    }

    #[must_use]
    pub fn objective(&self, name: &str) -> Option<&Objective> {
        self.objectives.get(name)
    }

    /// Shows `objective` in `slot`, or clears the slot when `None`.
    pub fn set_display(
        &mut self,
        slot: DisplaySlot,
        objective: Option<&str>,
    ) -> Result<(), ScoreboardError> {
        match objective {
            Some(name) => {
                if !self.objectives.contains_key(name) {
                    return Err(ScoreboardError::UnknownObjective(name.to_owned()));
                }
                self.display_slots.insert(slot, name.to_owned());
            }
            None => {
                self.display_slots.shift_remove(&slot);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn displayed(&self, slot: DisplaySlot) -> Option<&str> {
        self.display_slots.get(&slot).map(String::as_str)
    }

    /// Reads a saved scoreboard, or an empty one if none was saved yet.
    #[instrument]
    pub fn load<P: AsRef<Path> + Debug>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    #[instrument(skip(self))]
    pub fn save<P: AsRef<Path> + Debug>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string(self).context("failed to serialize scoreboard")?;
        std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
    }
}
