use crate::domain::{Color, Position};
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One square of the grid: empty, or a piece code.
///
/// Piece codes are side + kind in one character: uppercase for white,
/// lowercase for black (`KQRBNP` / `kqrbnp` in the chess deployment). The
/// wire form is a single-character string, `"."` for empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Piece(char),
}

/// Errors raised while building or decoding a board.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid piece code: {0:?}")]
    InvalidPieceCode(char),

    #[error("board must have at least one row and one column")]
    EmptyBoard,

    #[error("board rows must all have the same length")]
    NotRectangular,
}

impl Cell {
    /// Parse a cell from its single-character code.
    pub fn from_code(code: char) -> Result<Self, BoardError> {
        match code {
            '.' => Ok(Cell::Empty),
            c if c.is_ascii_alphabetic() => Ok(Cell::Piece(c)),
            c => Err(BoardError::InvalidPieceCode(c)),
        }
    }

    /// The single-character code, `'.'` for empty.
    pub fn code(&self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Piece(c) => *c,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn piece(&self) -> Option<char> {
        match self {
            Cell::Empty => None,
            Cell::Piece(c) => Some(*c),
        }
    }

    /// Which side owns the piece: uppercase is white, lowercase is black.
    pub fn side(&self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Piece(c) if c.is_ascii_uppercase() => Some(Color::White),
            Cell::Piece(_) => Some(Color::Black),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0u8; 4];
        serializer.serialize_str(self.code().encode_utf8(&mut buf))
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Cell::from_code(code).map_err(D::Error::custom),
            _ => Err(D::Error::custom(format!(
                "cell must be a single character, got {:?}",
                s
            ))),
        }
    }
}

impl JsonSchema for Cell {
    fn schema_name() -> String {
        "Cell".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// The full playing surface: a rectangular, row-major grid of cells with
/// row 0 at the top (rank 8 in chess terms).
///
/// A board replica is only ever replaced wholesale from a relayed snapshot,
/// never patched cell-by-cell, so a dropped intermediate update cannot leave
/// it half-applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Board {
    rows: Vec<Vec<Cell>>,
}

impl Board {
    /// An all-empty grid of the given dimensions.
    pub fn empty(width: u8, height: u8) -> Self {
        Board {
            rows: vec![vec![Cell::Empty; width as usize]; height as usize],
        }
    }

    /// The standard chess starting layout.
    pub fn standard_chess() -> Self {
        const ROWS: [&str; 8] = [
            "rnbqkbnr", "pppppppp", "........", "........", "........", "........", "PPPPPPPP",
            "RNBQKBNR",
        ];
        let rows = ROWS
            .iter()
            .map(|line| {
                line.chars()
                    .map(|c| if c == '.' { Cell::Empty } else { Cell::Piece(c) })
                    .collect()
            })
            .collect();
        Board { rows }
    }

    /// The standard checkers starting layout: men on the dark squares of
    /// the three back rows on each side.
    pub fn standard_checkers() -> Self {
        let mut board = Board::empty(8, 8);
        for row in 0..8u8 {
            for col in 0..8u8 {
                if (row + col) % 2 == 1 {
                    let cell = match row {
                        0..=2 => Some(Cell::Piece('m')),
                        5..=7 => Some(Cell::Piece('M')),
                        _ => None,
                    };
                    if let Some(cell) = cell {
                        board.set(Position::new(col, row), cell);
                    }
                }
            }
        }
        board
    }

    /// Build a board from one string per row (test and demo helper).
    pub fn from_rows(rows: &[&str]) -> Result<Self, BoardError> {
        let rows = rows
            .iter()
            .map(|line| line.chars().map(Cell::from_code).collect())
            .collect::<Result<Vec<Vec<Cell>>, BoardError>>()?;
        Board::try_from(rows)
    }

    pub fn width(&self) -> u8 {
        self.rows.first().map(|r| r.len() as u8).unwrap_or(0)
    }

    pub fn height(&self) -> u8 {
        self.rows.len() as u8
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.rows
            .get(pos.row() as usize)
            .and_then(|row| row.get(pos.col() as usize))
            .copied()
    }

    /// Overwrite one cell. Authoritative-side helper (the relay server and
    /// its test doubles); session replicas never call this.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        match self
            .rows
            .get_mut(pos.row() as usize)
            .and_then(|row| row.get_mut(pos.col() as usize))
        {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        let Some(first) = rows.first() else {
            return Err(BoardError::EmptyBoard);
        };
        if first.is_empty() {
            return Err(BoardError::EmptyBoard);
        }
        if rows.iter().any(|row| row.len() != first.len()) {
            return Err(BoardError::NotRectangular);
        }
        Ok(Board { rows })
    }
}

impl From<Board> for Vec<Vec<Cell>> {
    fn from(board: Board) -> Vec<Vec<Cell>> {
        board.rows
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.code())?;
            }
        }
        Ok(())
    }
}

impl JsonSchema for Board {
    fn schema_name() -> String {
        "Board".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <Vec<Vec<Cell>>>::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_codes() {
        assert_eq!(Cell::from_code('.').unwrap(), Cell::Empty);
        assert_eq!(Cell::from_code('P').unwrap(), Cell::Piece('P'));
        assert_eq!(Cell::from_code('k').unwrap(), Cell::Piece('k'));
        assert_eq!(Cell::from_code('#'), Err(BoardError::InvalidPieceCode('#')));
    }

    #[test]
    fn test_cell_side() {
        assert_eq!(Cell::Piece('P').side(), Some(Color::White));
        assert_eq!(Cell::Piece('q').side(), Some(Color::Black));
        assert_eq!(Cell::Empty.side(), None);
    }

    #[test]
    fn test_cell_serde() {
        assert_eq!(serde_json::to_string(&Cell::Empty).unwrap(), "\".\"");
        assert_eq!(serde_json::to_string(&Cell::Piece('N')).unwrap(), "\"N\"");

        let cell: Cell = serde_json::from_str("\"p\"").unwrap();
        assert_eq!(cell, Cell::Piece('p'));

        assert!(serde_json::from_str::<Cell>("\"pp\"").is_err());
        assert!(serde_json::from_str::<Cell>("\"\"").is_err());
    }

    #[test]
    fn test_standard_chess_layout() {
        let board = Board::standard_chess();
        assert_eq!(board.width(), 8);
        assert_eq!(board.height(), 8);

        // White pawn on d2, black rook on a8.
        assert_eq!(
            board.get(Position::decode("d2").unwrap()),
            Some(Cell::Piece('P'))
        );
        assert_eq!(
            board.get(Position::decode("a8").unwrap()),
            Some(Cell::Piece('r'))
        );
        assert_eq!(
            board.get(Position::decode("e4").unwrap()),
            Some(Cell::Empty)
        );
    }

    #[test]
    fn test_from_rows_validation() {
        assert_eq!(Board::from_rows(&[]), Err(BoardError::EmptyBoard));
        assert_eq!(
            Board::from_rows(&["..", "..."]),
            Err(BoardError::NotRectangular)
        );
        assert_eq!(
            Board::from_rows(&["..", ".!"]),
            Err(BoardError::InvalidPieceCode('!'))
        );

        let board = Board::from_rows(&["...", "...", "..."]).unwrap();
        assert_eq!(board.width(), 3);
        assert_eq!(board.height(), 3);
    }

    #[test]
    fn test_board_wire_shape() {
        let board = Board::from_rows(&[".k", "K."]).unwrap();
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json, serde_json::json!([[".", "k"], ["K", "."]]));

        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_deserialize_rejects_ragged_board() {
        let ragged = serde_json::json!([[".", "."], ["."]]);
        assert!(serde_json::from_value::<Board>(ragged).is_err());

        let empty = serde_json::json!([]);
        assert!(serde_json::from_value::<Board>(empty).is_err());
    }

    #[test]
    fn test_set_and_get() {
        let mut board = Board::empty(8, 8);
        let d4 = Position::decode("d4").unwrap();

        assert!(board.set(d4, Cell::Piece('P')));
        assert_eq!(board.get(d4), Some(Cell::Piece('P')));

        // Out of range is reported, not panicked on.
        assert!(!board.set(Position::new(9, 9), Cell::Empty));
        assert_eq!(board.get(Position::new(9, 9)), None);
    }

    #[test]
    fn test_display_grid() {
        let board = Board::from_rows(&[".k", "K."]).unwrap();
        assert_eq!(board.to_string(), ".k\nK.");
    }
}
