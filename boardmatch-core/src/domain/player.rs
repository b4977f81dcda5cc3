use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque player identifier, unique per connection.
///
/// Assigned by the matchmaking server (the reference deployment hands out
/// socket IDs), so this stays a string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        PlayerId(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        PlayerId(id)
    }
}

/// Side assigned to a player for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A seated participant of one game session.
///
/// Immutable once the match notification assigns it; the wire field for the
/// display name is `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Player {
    id: PlayerId,
    #[serde(rename = "username")]
    name: String,
    color: Color,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, color: Color) -> Self {
        Player {
            id,
            name: name.into(),
            color,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }
}
