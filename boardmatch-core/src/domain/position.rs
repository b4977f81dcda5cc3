use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Board height the canonical two-character codec assumes.
pub const DEFAULT_BOARD_HEIGHT: u8 = 8;
/// Board width the canonical two-character codec assumes.
pub const DEFAULT_BOARD_WIDTH: u8 = 8;

/// A square on the board, column 0 at file `a`, row 0 at the top rank.
///
/// The canonical text encoding is file letter (`'a' + col`) followed by the
/// rank digit (`height - row`), so `(3, 6)` on an 8×8 board is `"d2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    col: u8,
    row: u8,
}

/// Errors produced when decoding a position from its text form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("position must be two characters, got {0:?}")]
    InvalidLength(String),

    #[error("file out of range: {0:?}")]
    FileOutOfRange(char),

    #[error("rank out of range: {0:?}")]
    RankOutOfRange(char),
}

impl Position {
    pub fn new(col: u8, row: u8) -> Self {
        Position { col, row }
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    /// Encode for the default 8×8 board.
    pub fn encode(&self) -> String {
        self.encode_for(DEFAULT_BOARD_HEIGHT)
    }

    /// Encode for a board of the given height (rank digit is `height - row`).
    pub fn encode_for(&self, height: u8) -> String {
        let file = (b'a' + self.col) as char;
        let rank = height - self.row;
        format!("{}{}", file, rank)
    }

    /// Decode from the canonical form for the default 8×8 board.
    pub fn decode(s: &str) -> Result<Self, PositionError> {
        Self::decode_for(s, DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT)
    }

    /// Decode for a board of the given dimensions.
    pub fn decode_for(s: &str, width: u8, height: u8) -> Result<Self, PositionError> {
        let mut chars = s.chars();
        let (file, rank) = match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => (file, rank),
            _ => return Err(PositionError::InvalidLength(s.to_string())),
        };

        let col = (file as u32).wrapping_sub('a' as u32);
        if !file.is_ascii_lowercase() || col >= width as u32 {
            return Err(PositionError::FileOutOfRange(file));
        }

        let rank_value = match rank.to_digit(10) {
            Some(d) if d >= 1 && d <= height as u32 => d,
            _ => return Err(PositionError::RankOutOfRange(rank)),
        };

        Ok(Position {
            col: col as u8,
            row: height - rank_value as u8,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for Position {
    type Error = PositionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::decode(&s)
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> String {
        pos.encode()
    }
}

impl JsonSchema for Position {
    fn schema_name() -> String {
        "Position".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}
