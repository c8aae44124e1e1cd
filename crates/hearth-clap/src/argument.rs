use crate::{
    reader::{CommandSyntaxError, StringReader, SyntaxErrorKind},
    suggestion::{Suggestions, SuggestionsBuilder},
};

/// A typed command argument: how to read it, how to complete it, and what it looks like.
pub trait ArgumentType {
    type Output;

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<Self::Output, CommandSyntaxError>;

    fn list_suggestions(&self, builder: SuggestionsBuilder) -> Suggestions {
        builder.build()
    }

    fn examples(&self) -> &'static [&'static str] {
        &[]
    }

    /// Parses `input` as a whole, rejecting anything left over.
    fn parse_complete(&self, input: &str) -> Result<Self::Output, CommandSyntaxError> {
        let mut reader = StringReader::new(input);
        let value = self.parse(&mut reader)?;

        if reader.can_read() {
            return Err(CommandSyntaxError::new(
                SyntaxErrorKind::ExpectedArgumentSeparator,
                &reader,
            ));
        }

        Ok(value)
    }
}
