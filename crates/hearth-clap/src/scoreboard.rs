//! Scoreboard display slots and the command argument that names them.

use std::{ffi::OsStr, fmt};

use clap::{
    builder::{PossibleValue, TypedValueParser},
    error::ErrorKind,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{
    argument::ArgumentType,
    reader::{CommandSyntaxError, StringReader, SyntaxErrorKind},
    suggestion::{Suggestions, SuggestionsBuilder, suggest},
};

/// The sixteen named text colours, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl TeamColor {
    pub const ALL: [Self; 16] = [
        Self::Black,
        Self::DarkBlue,
        Self::DarkGreen,
        Self::DarkAqua,
        Self::DarkRed,
        Self::DarkPurple,
        Self::Gold,
        Self::Gray,
        Self::DarkGray,
        Self::Blue,
        Self::Green,
        Self::Aqua,
        Self::Red,
        Self::LightPurple,
        Self::Yellow,
        Self::White,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::DarkBlue => "dark_blue",
            Self::DarkGreen => "dark_green",
            Self::DarkAqua => "dark_aqua",
            Self::DarkRed => "dark_red",
            Self::DarkPurple => "dark_purple",
            Self::Gold => "gold",
            Self::Gray => "gray",
            Self::DarkGray => "dark_gray",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Aqua => "aqua",
            Self::Red => "red",
            Self::LightPurple => "light_purple",
            Self::Yellow => "yellow",
            Self::White => "white",
        }
    }

    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

/// Where an objective can be shown on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplaySlot {
    List,
    Sidebar,
    BelowName,
    /// The sidebar as seen by members of a team with this colour.
    TeamSidebar(TeamColor),
}

const TEAM_SIDEBAR_NAMES: [&str; 16] = [
    "sidebar.team.black",
    "sidebar.team.dark_blue",
    "sidebar.team.dark_green",
    "sidebar.team.dark_aqua",
    "sidebar.team.dark_red",
    "sidebar.team.dark_purple",
    "sidebar.team.gold",
    "sidebar.team.gray",
    "sidebar.team.dark_gray",
    "sidebar.team.blue",
    "sidebar.team.green",
    "sidebar.team.aqua",
    "sidebar.team.red",
    "sidebar.team.light_purple",
    "sidebar.team.yellow",
    "sidebar.team.white",
];

impl DisplaySlot {
    /// Every slot, ordered by protocol id.
    pub const ALL: [Self; 19] = {
        let mut all = [Self::List; 19];
        all[1] = Self::Sidebar;
        all[2] = Self::BelowName;
        let mut i = 0;
        while i < TeamColor::ALL.len() {
            all[i + 3] = Self::TeamSidebar(TeamColor::ALL[i]);
            i += 1;
        }
        all
    };

    /// The protocol id of the slot.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::List => 0,
            Self::Sidebar => 1,
            Self::BelowName => 2,
            Self::TeamSidebar(color) => 3 + color.id(),
        }
    }

    #[must_use]
    pub const fn serialized_name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Sidebar => "sidebar",
            Self::BelowName => "below_name",
            Self::TeamSidebar(color) => TEAM_SIDEBAR_NAMES[color.id() as usize],
        }
    }

    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.serialized_name() == name)
    }

    #[must_use]
    pub fn by_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// The team colour this slot is restricted to, if any.
    #[must_use]
    pub const fn team_color(self) -> Option<TeamColor> {
        match self {
            Self::TeamSidebar(color) => Some(color),
            _ => None,
        }
    }
}

impl fmt::Display for DisplaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.serialized_name())
    }
}

impl Serialize for DisplaySlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.serialized_name())
    }
}

impl<'de> Deserialize<'de> for DisplaySlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::by_name(&name)
            .ok_or_else(|| de::Error::custom(format_args!("unknown display slot '{name}'")))
    }
}

/// Command argument naming a [`DisplaySlot`] by its serialized name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreboardSlotArgument;

impl ScoreboardSlotArgument {
    pub const EXAMPLES: &'static [&'static str] = &["sidebar", "foo.bar"];

    #[must_use]
    pub const fn display_slot() -> Self {
        Self
    }
}

impl ArgumentType for ScoreboardSlotArgument {
    type Output = DisplaySlot;

    fn parse(&self, reader: &mut StringReader<'_>) -> Result<DisplaySlot, CommandSyntaxError> {
        let start = reader.cursor();
        let name = reader.read_unquoted_string();

        DisplaySlot::by_name(name).ok_or_else(|| {
            let mut at = reader.clone();
            at.set_cursor(start);
            CommandSyntaxError::new(SyntaxErrorKind::InvalidDisplaySlot(name.to_owned()), &at)
        })
    }

    fn list_suggestions(&self, builder: SuggestionsBuilder) -> Suggestions {
        suggest(DisplaySlot::ALL.map(DisplaySlot::serialized_name), builder)
    }

    fn examples(&self) -> &'static [&'static str] {
        Self::EXAMPLES
    }
}

/// Lets the argument be used directly as `#[arg(value_parser = ScoreboardSlotArgument::display_slot())]`.
impl TypedValueParser for ScoreboardSlotArgument {
    type Value = DisplaySlot;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let Some(value) = value.to_str() else {
            return Err(clap::Error::new(ErrorKind::InvalidUtf8).with_cmd(cmd));
        };

        self.parse_complete(value)
            .map_err(|e| clap::Error::raw(ErrorKind::InvalidValue, format!("{}\n", e.kind)))
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        Some(Box::new(
            DisplaySlot::ALL
                .into_iter()
                .map(|slot| PossibleValue::new(slot.serialized_name())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_protocol_order() {
        for (index, slot) in DisplaySlot::ALL.into_iter().enumerate() {
            assert_eq!(usize::from(slot.id()), index);
            assert_eq!(DisplaySlot::by_id(slot.id()), Some(slot));
        }
        assert_eq!(DisplaySlot::by_id(19), None);
    }

    #[test]
    fn team_slots_are_named_after_their_colour() {
        let slot = DisplaySlot::TeamSidebar(TeamColor::LightPurple);
        assert_eq!(slot.serialized_name(), "sidebar.team.light_purple");
        assert_eq!(slot.id(), 16);
        assert_eq!(slot.team_color(), Some(TeamColor::LightPurple));
        assert_eq!(DisplaySlot::Sidebar.team_color(), None);
    }

    #[test]
    fn parse_leaves_the_reader_after_the_word() {
        let mut reader = StringReader::new("below_name extra");
        let slot = ArgumentType::parse(&ScoreboardSlotArgument::display_slot(), &mut reader).unwrap();
        assert_eq!(slot, DisplaySlot::BelowName);
        assert_eq!(reader.remaining(), " extra");
    }

    #[test]
    fn unknown_slot_points_at_the_word() {
        let mut reader = StringReader::new("foo.bar");
        let error = ArgumentType::parse(&ScoreboardSlotArgument, &mut reader).unwrap_err();
        assert_eq!(
            error.kind,
            SyntaxErrorKind::InvalidDisplaySlot("foo.bar".to_owned())
        );
        assert_eq!(error.cursor, 0);
        assert_eq!(error.kind.to_string(), "Unknown display slot 'foo.bar'");
    }
}
