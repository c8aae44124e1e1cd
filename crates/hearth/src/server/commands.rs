//! Console commands.

use clap::{Parser, Subcommand};
use hearth_clap::{
    CommandRegistry, CommandSource, DisplaySlot, MinecraftCommand, ScoreboardSlotArgument,
};

use super::scoreboard::Scoreboard;
use crate::world::PrimaryLevelData;

/// Everything commands can read or change. Requests are carried out by the tick loop.
#[derive(Debug)]
pub struct GameState {
    pub world_data: PrimaryLevelData,
    pub scoreboard: Scoreboard,
    pub command_names: Vec<String>,
    pub stop_requested: bool,
    pub save_requested: bool,
    /// Save with flush: wait for everything to hit the disk.
    pub flush_requested: bool,
}

impl GameState {
    #[must_use]
    pub const fn new(world_data: PrimaryLevelData, scoreboard: Scoreboard) -> Self {
        Self {
            world_data,
            scoreboard,
            command_names: Vec::new(),
            stop_requested: false,
            save_requested: false,
            flush_requested: false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "stop")]
#[command(about = "Stops the server")]
struct Stop;

impl MinecraftCommand<GameState> for Stop {
    const PERMISSION_LEVEL: u8 = 4;

    fn execute(self, state: &mut GameState, source: &mut dyn CommandSource) {
        source.send_success("Stopping the server");
        state.stop_requested = true;
    }
}

#[derive(Parser, Debug)]
#[command(name = "save-all")]
#[command(about = "Saves the world to disk")]
struct SaveAll {
    /// Wait until everything is written
    #[arg(value_parser = ["flush"])]
    flush: Option<String>,
}

impl MinecraftCommand<GameState> for SaveAll {
    const PERMISSION_LEVEL: u8 = 4;

    fn execute(self, state: &mut GameState, source: &mut dyn CommandSource) {
        source.send_success("Saving the game (this may take a moment!)");
        state.save_requested = true;
        state.flush_requested |= self.flush.is_some();
    }
}

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Shows the world seed")]
struct Seed;

impl MinecraftCommand<GameState> for Seed {
    const PERMISSION_LEVEL: u8 = 2;

    fn execute(self, state: &mut GameState, source: &mut dyn CommandSource) {
        source.send_success(&format!("Seed: [{}]", state.world_data.seed()));
    }
}

#[derive(Parser, Debug)]
#[command(name = "help")]
#[command(about = "Lists the available commands")]
#[command(disable_help_subcommand = true)]
struct Help;

impl MinecraftCommand<GameState> for Help {
    fn execute(self, state: &mut GameState, source: &mut dyn CommandSource) {
        source.send_success(&format!(
            "Available commands: {}",
            state.command_names.join(", ")
        ));
    }
}

#[derive(Parser, Debug)]
#[command(name = "scoreboard")]
#[command(about = "Manages scoreboard objectives")]
struct ScoreboardCommand {
    #[command(subcommand)]
    target: ScoreboardTarget,
}

#[derive(Subcommand, Debug)]
enum ScoreboardTarget {
    #[command(subcommand)]
    Objectives(ObjectivesAction),
}

#[derive(Subcommand, Debug)]
enum ObjectivesAction {
    /// Add a new objective
    Add {
        objective: String,
        criteria: String,
        display_name: Vec<String>,
    },
    /// List all objectives
    List,
    /// Remove an objective
    Remove { objective: String },
    /// Show an objective in a display slot, or clear the slot
    Setdisplay {
        #[arg(value_parser = ScoreboardSlotArgument::display_slot())]
        slot: DisplaySlot,
        objective: Option<String>,
    },
}

impl MinecraftCommand<GameState> for ScoreboardCommand {
    const PERMISSION_LEVEL: u8 = 2;

    fn execute(self, state: &mut GameState, source: &mut dyn CommandSource) {
        let ScoreboardTarget::Objectives(action) = self.target;
        let scoreboard = &mut state.scoreboard;

        let result = match action {
            ObjectivesAction::Add {
                objective,
                criteria,
                display_name,
            } => {
                let display_name = display_name.join(" ");
                let display_name = (!display_name.is_empty()).then_some(display_name.as_str());
                scoreboard
                    .add_objective(&objective, &criteria, display_name)
                    .map(|added| format!("Created new objective [{}]", added.display_name))
            }
            ObjectivesAction::List => {
                let names: Vec<_> = scoreboard.objectives().map(|(name, _)| name).collect();
                Ok(if names.is_empty() {
                    "There are no objectives".to_owned()
                } else {
                    format!(
                        "There are {} objective(s): {}",
                        names.len(),
                        names.join(", ")
                    )
                })
            }
            ObjectivesAction::Remove { objective } => scoreboard
                .remove_objective(&objective)
                .map(|_| format!("Removed objective [{objective}]")),
            ObjectivesAction::Setdisplay { slot, objective } => scoreboard
                .set_display(slot, objective.as_deref())
                .map(|()| match objective {
                    Some(objective) => {
                        format!("Set display slot {slot} to show objective {objective}")
                    }
                    None => format!("Cleared objective display slot {slot}"),
                }),
        };

        match result {
            Ok(message) => source.send_success(&message),
            Err(e) => source.send_failure(&e.to_string()),
        }
    }
}

/// The commands the dedicated server console understands.
#[must_use]
pub fn registry() -> CommandRegistry<GameState> {
    let mut registry = CommandRegistry::new();
    Help::register(&mut registry);
    SaveAll::register(&mut registry);
    ScoreboardCommand::register(&mut registry);
    Seed::register(&mut registry);
    Stop::register(&mut registry);
    registry
}
