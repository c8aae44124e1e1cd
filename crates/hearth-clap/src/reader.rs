use std::fmt;

/// A cursor over command input, mirroring how arguments consume text one after another.
#[derive(Debug, Clone)]
pub struct StringReader<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> StringReader<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    #[must_use]
    pub const fn input(&self) -> &'a str {
        self.input
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.input.len());
    }

    #[must_use]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        self.cursor < self.input.len()
    }

    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn skip(&mut self) {
        if let Some(c) = self.peek() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.skip();
        }
    }

    /// Characters allowed in an unquoted word.
    #[must_use]
    pub const fn is_allowed_in_unquoted_string(c: char) -> bool {
        matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_' | '-' | '.' | '+')
    }

    /// Reads the longest run of unquoted-word characters. May return an empty string.
    pub fn read_unquoted_string(&mut self) -> &'a str {
        let start = self.cursor;
        while self.peek().is_some_and(Self::is_allowed_in_unquoted_string) {
            self.skip();
        }
        &self.input[start..self.cursor]
    }
}

/// Why a piece of command input was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("Unknown display slot '{0}'")]
    InvalidDisplaySlot(String),
    #[error("Expected whitespace to end one argument, but found trailing data")]
    ExpectedArgumentSeparator,
}

/// A parse failure together with the position it happened at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct CommandSyntaxError {
    pub kind: SyntaxErrorKind,
    pub input: String,
    pub cursor: usize,
}

impl CommandSyntaxError {
    #[must_use]
    pub fn new(kind: SyntaxErrorKind, reader: &StringReader<'_>) -> Self {
        Self {
            kind,
            input: reader.input().to_owned(),
            cursor: reader.cursor(),
        }
    }

    /// Up to ten characters of input before the failure, the way clients render it.
    #[must_use]
    pub fn context(&self) -> String {
        let cursor = self.cursor.min(self.input.len());
        let prefix = &self.input[..cursor];
        let start = prefix
            .char_indices()
            .rev()
            .nth(9)
            .map_or(0, |(index, _)| index);

        let mut context = String::new();
        if start > 0 {
            context.push_str("...");
        }
        context.push_str(&prefix[start..]);
        context.push_str("<--[HERE]");
        context
    }
}

impl fmt::Display for CommandSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}: {}", self.kind, self.cursor, self.context())
    }
}
