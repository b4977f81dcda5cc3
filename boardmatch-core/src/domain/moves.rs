use crate::domain::{Cell, Position};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One move submission: source square, destination square, and the piece
/// being moved.
///
/// Ephemeral by design: constructed for a single relay submission and not
/// retained after the acknowledgment. Wire shape is
/// `{"from": "d2", "to": "d4", "piece": "P"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub piece: Cell,
}

impl Move {
    pub fn new(from: Position, to: Position, piece: Cell) -> Self {
        Move { from, to, piece }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_wire_shape() {
        let mv = Move::new(
            Position::decode("d2").unwrap(),
            Position::decode("d4").unwrap(),
            Cell::Piece('P'),
        );

        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"from": "d2", "to": "d4", "piece": "P"})
        );

        let back: Move = serde_json::from_value(json).unwrap();
        assert_eq!(back, mv);
    }

    #[test]
    fn test_move_display() {
        let mv = Move::new(
            Position::decode("e2").unwrap(),
            Position::decode("e4").unwrap(),
            Cell::Piece('P'),
        );
        assert_eq!(mv.to_string(), "e2 → e4");
    }
}
