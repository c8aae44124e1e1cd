use indexmap::IndexMap;

use crate::{CommandSource, suggestion::Suggestions};

/// Function table for one registered command.
pub struct CommandHandler<C> {
    pub on_execute: fn(input: &str, context: &mut C, source: &mut dyn CommandSource),
    pub on_tab_complete: fn(input: &str) -> Suggestions,
    pub permission_level: u8,
}

impl<C> Clone for CommandHandler<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for CommandHandler<C> {}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command is empty")]
    Empty,
    #[error("Unknown command '{name}'. Available commands: [{}]", available.join(", "))]
    Unknown {
        name: String,
        available: Vec<String>,
    },
    #[error("You do not have permission to use '{name}'")]
    PermissionDenied { name: String },
}

/// Commands by name, in registration order.
pub struct CommandRegistry<C> {
    commands: IndexMap<String, CommandHandler<C>>,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            commands: IndexMap::new(),
        }
    }
}

impl<C> CommandRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: CommandHandler<C>) {
        let name = name.into();
        self.commands.insert(name, handler);
    }

    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Names of the commands a source with operator `level` is allowed to run.
    pub fn get_permitted(&self, level: u8) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .filter(move |(_, handler)| handler.permission_level <= level)
            .map(|(name, _)| name.as_str())
    }

    /// Runs one line of input. A leading `/` is ignored.
    pub fn execute(
        &self,
        input: &str,
        context: &mut C,
        source: &mut dyn CommandSource,
    ) -> Result<(), CommandError> {
        let input = input.trim();
        let input = input.strip_prefix('/').unwrap_or(input);

        let Some(first_word) = input.split_whitespace().next() else {
            return Err(CommandError::Empty);
        };

        let Some(handler) = self.commands.get(first_word) else {
            tracing::debug!("command {first_word} not found");
            return Err(CommandError::Unknown {
                name: first_word.to_owned(),
                available: self
                    .get_permitted(source.permission_level())
                    .map(str::to_owned)
                    .collect(),
            });
        };

        if handler.permission_level > source.permission_level() {
            return Err(CommandError::PermissionDenied {
                name: first_word.to_owned(),
            });
        }

        tracing::debug!("executing command {first_word}");
        (handler.on_execute)(input, context, source);
        Ok(())
    }

    /// Completions for partially typed `input`; command names while the first word is being typed.
    #[must_use]
    pub fn complete(&self, input: &str) -> Suggestions {
        let offset = usize::from(input.starts_with('/'));
        let query = &input[offset..];

        match query.split_once(char::is_whitespace) {
            Some((name, _)) => self
                .commands
                .get(name)
                .map(|handler| {
                    let mut suggestions = (handler.on_tab_complete)(query);
                    suggestions.shift(offset);
                    suggestions
                })
                .unwrap_or_default(),
            None => crate::suggestion::suggest(
                self.all(),
                crate::suggestion::SuggestionsBuilder::new(input, offset),
            ),
        }
    }
}
