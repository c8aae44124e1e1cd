//! Command parsing for the console and, eventually, players.
//!
//! Commands are `clap` parsers. Arguments that need the game's own syntax (and its error messages)
//! implement [`ArgumentType`] and are bridged into `clap` as value parsers.

use clap::{Parser, ValueEnum, error::ErrorKind};
use serde::{Deserialize, Serialize};

pub mod argument;
pub mod reader;
mod registry;
pub mod scoreboard;
pub mod suggestion;

pub use argument::ArgumentType;
pub use reader::{CommandSyntaxError, StringReader, SyntaxErrorKind};
pub use registry::{CommandError, CommandHandler, CommandRegistry};
pub use scoreboard::{DisplaySlot, ScoreboardSlotArgument, TeamColor};
use suggestion::{Suggestions, SuggestionsBuilder, suggest};

/// Whoever issued a command.
pub trait CommandSource {
    fn send_success(&mut self, message: &str);
    fn send_failure(&mut self, message: &str);

    /// Operator level, 0 to 4.
    fn permission_level(&self) -> u8 {
        4
    }
}

pub trait MinecraftCommand<C>: Parser {
    /// Lowest [`CommandSource::permission_level`] allowed to run the command.
    const PERMISSION_LEVEL: u8 = 0;

    fn execute(self, context: &mut C, source: &mut dyn CommandSource);

    fn register(registry: &mut CommandRegistry<C>) {
        let cmd = Self::command();
        let name = cmd.get_name().to_owned();

        let on_execute = |input: &str, context: &mut C, source: &mut dyn CommandSource| {
            let input = input.split_whitespace();

            match Self::try_parse_from(input) {
                Ok(elem) => elem.execute(context, source),
                Err(e) => match e.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                        source.send_success(e.to_string().trim_end());
                    }
                    _ => {
                        tracing::warn!("could not parse command {e}");
                        source.send_failure(e.to_string().trim_end());
                    }
                },
            }
        };

        let on_tab_complete = |input: &str| complete(&Self::command(), input);

        let handler = CommandHandler {
            on_execute,
            on_tab_complete,
            permission_level: Self::PERMISSION_LEVEL,
        };

        tracing::debug!("registering command {name}");

        registry.register(name, handler);
    }
}

/// Byte offset and text of each whitespace separated word.
fn words(input: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;

    for (index, c) in input.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(begin)) => {
                words.push((begin, &input[begin..index]));
                start = None;
            }
            (false, None) => start = Some(index),
            _ => {}
        }
    }

    if let Some(begin) = start {
        words.push((begin, &input[begin..]));
    }

    words
}

/// Completes the word under the cursor (the end of `input`) against `command`.
///
/// The first word is the command name itself. Later words select subcommands until a command
/// without subcommands is reached; after that they fill positionals in order.
#[must_use]
pub fn complete(command: &clap::Command, input: &str) -> Suggestions {
    let mut words = words(input);

    // Typing a fresh word after trailing whitespace.
    if input.ends_with(char::is_whitespace) || input.is_empty() {
        words.push((input.len(), ""));
    }

    let Some(((start, current), before)) = words.split_last() else {
        return Suggestions::default();
    };
    let builder = SuggestionsBuilder::new(input, *start);

    let mut command = command;
    let mut positional = 0;

    // Skip the command name.
    for (_, word) in before.iter().skip(1) {
        if command.has_subcommands() {
            let Some(sub) = command.find_subcommand(word) else {
                return Suggestions::default();
            };
            command = sub;
        } else {
            positional += 1;
        }
    }

    if before.is_empty() {
        return Suggestions::default();
    }

    if command.has_subcommands() {
        let names = command
            .get_subcommands()
            .map(clap::Command::get_name)
            .filter(|name| *name != "help");
        return suggest(names, builder);
    }

    let Some(arg) = command.get_positionals().nth(positional) else {
        return Suggestions::default();
    };

    let possible_values = arg.get_possible_values();
    if possible_values.iter().any(|possible| possible.matches(current, true)) {
        return Suggestions::default();
    }

    suggest(
        possible_values
            .iter()
            .filter(|possible| !possible.is_hide_set())
            .map(clap::builder::PossibleValue::get_name),
        builder,
    )
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Survival => "survival",
            Self::Creative => "creative",
            Self::Adventure => "adventure",
            Self::Spectator => "spectator",
        }
    }

    /// Accepts the name or the legacy numeric id.
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim() {
            "survival" | "0" => Some(Self::Survival),
            "creative" | "1" => Some(Self::Creative),
            "adventure" | "2" => Some(Self::Adventure),
            "spectator" | "3" => Some(Self::Spectator),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_keep_their_offsets() {
        assert_eq!(words("  a bc\td "), [(2, "a"), (4, "bc"), (7, "d")]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn game_mode_accepts_legacy_ids() {
        assert_eq!(GameMode::by_name("2"), Some(GameMode::Adventure));
        assert_eq!(GameMode::by_name("creative"), Some(GameMode::Creative));
        assert_eq!(GameMode::by_name("hardcore"), None);
        assert_eq!(GameMode::Spectator.id(), 3);
    }
}
