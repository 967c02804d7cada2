//! Board layouts and cell state.
//!
//! Three static 10×10 plates. Corners hold no card and never hold a chip,
//! but count as wild for every team's sequences. Every non-Jack card
//! appears exactly twice on each plate (Jacks are never printed on the
//! board).

use super::cards::Card;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_SIZE: usize = 10;

/// Scan directions: horizontal, vertical, the two diagonals.
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    Classic,
    Alternative,
    Advanced,
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Classic => "classic",
            Self::Alternative => "alternative",
            Self::Advanced => "advanced",
        };
        write!(f, "{repr}")
    }
}

/// Chip colors. Team 1 plays green, team 2 plays blue. `Red` exists for a
/// client-only local mode and is never assigned by this server.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    Green,
    Blue,
    Red,
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chip {
    pub color: TeamColor,
    pub part_of_sequence: bool,
}

impl Chip {
    pub fn new(color: TeamColor) -> Self {
        Self {
            color,
            part_of_sequence: false,
        }
    }
}

/// One board position. `card` is `None` only on the four corners.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCell {
    pub card: Option<Card>,
    pub chip: Option<Chip>,
    pub row: usize,
    pub col: usize,
}

impl BoardCell {
    pub fn is_corner(&self) -> bool {
        self.card.is_none()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Board {
    cells: Vec<Vec<BoardCell>>,
}

impl Board {
    /// Materialize the plate for a board type.
    pub fn new(board_type: BoardType) -> Self {
        let plate = plate(board_type);
        let cells = (0..BOARD_SIZE)
            .map(|row| {
                (0..BOARD_SIZE)
                    .map(|col| {
                        let code = plate[row][col];
                        let card = if code == "--" {
                            None
                        } else {
                            // The plates are validated by tests; a bad code here
                            // is a compile-time data bug, not a runtime input.
                            Some(code.parse().expect("board plate holds valid card codes"))
                        };
                        BoardCell {
                            card,
                            chip: None,
                            row,
                            col,
                        }
                    })
                    .collect()
            })
            .collect();
        Self { cells }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&BoardCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut BoardCell> {
        self.cells.get_mut(row).and_then(|r| r.get_mut(col))
    }

    pub fn cells(&self) -> impl Iterator<Item = &BoardCell> {
        self.cells.iter().flatten()
    }

    /// Whether the cell at signed coordinates counts toward `color`:
    /// in-bounds and either a corner (wild) or chipped in that color.
    pub fn counts_for(&self, row: isize, col: isize, color: TeamColor) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        match self.cell(row as usize, col as usize) {
            Some(cell) if cell.is_corner() => true,
            Some(cell) => cell.chip.is_some_and(|chip| chip.color == color),
            None => false,
        }
    }

    /// Empty, non-corner cells (legal two-eyed Jack targets).
    pub fn open_cells(&self) -> impl Iterator<Item = &BoardCell> {
        self.cells()
            .filter(|c| !c.is_corner() && c.chip.is_none())
    }
}

fn plate(board_type: BoardType) -> &'static [[&'static str; BOARD_SIZE]; BOARD_SIZE] {
    match board_type {
        BoardType::Classic => &CLASSIC_PLATE,
        BoardType::Alternative => &ALTERNATIVE_PLATE,
        BoardType::Advanced => &ADVANCED_PLATE,
    }
}

const CLASSIC_PLATE: [[&str; 10]; 10] = [
    ["--", "2S", "3S", "4S", "5S", "6S", "7S", "8S", "9S", "--"],
    ["6C", "5C", "4C", "3C", "2C", "AH", "KH", "QH", "TH", "TS"],
    ["7C", "AS", "2D", "3D", "4D", "5D", "6D", "7D", "9H", "QS"],
    ["8C", "KS", "6C", "5C", "4C", "3C", "2C", "8D", "8H", "KS"],
    ["9C", "QS", "7C", "6H", "5H", "4H", "AH", "9D", "7H", "AS"],
    ["TC", "TS", "8C", "7H", "2H", "3H", "KH", "TD", "6H", "2D"],
    ["QC", "9S", "9C", "8H", "9H", "TH", "QH", "QD", "5H", "3D"],
    ["KC", "8S", "TC", "QC", "KC", "AC", "AD", "KD", "4H", "4D"],
    ["AC", "7S", "6S", "5S", "4S", "3S", "2S", "2H", "3H", "5D"],
    ["--", "AD", "KD", "QD", "TD", "9D", "8D", "7D", "6D", "--"],
];

const ALTERNATIVE_PLATE: [[&str; 10]; 10] = [
    ["--", "9H", "8H", "7H", "6H", "5H", "4H", "3H", "2H", "--"],
    ["TH", "TS", "QS", "KS", "AS", "2D", "3D", "4D", "5D", "6D"],
    ["QH", "9S", "7C", "6C", "5C", "4C", "3C", "2C", "AH", "7D"],
    ["KH", "8S", "8C", "2D", "3D", "4D", "5D", "6D", "KH", "8D"],
    ["AH", "7S", "9C", "AS", "4S", "5S", "6S", "7D", "QH", "9D"],
    ["2C", "6S", "TC", "KS", "3S", "2S", "7S", "8D", "TH", "TD"],
    ["3C", "5S", "QC", "QS", "TS", "9S", "8S", "9D", "9H", "QD"],
    ["4C", "4S", "KC", "AC", "AD", "KD", "QD", "TD", "8H", "KD"],
    ["5C", "3S", "2S", "2H", "3H", "4H", "5H", "6H", "7H", "AD"],
    ["--", "6C", "7C", "8C", "9C", "TC", "QC", "KC", "AC", "--"],
];

const ADVANCED_PLATE: [[&str; 10]; 10] = [
    ["--", "7C", "6C", "5C", "4C", "3C", "2C", "AC", "KC", "--"],
    ["QS", "8C", "KS", "AS", "2S", "3S", "4S", "5S", "6S", "KD"],
    ["TS", "9C", "QD", "7C", "6C", "5C", "4C", "3C", "7S", "AD"],
    ["9S", "TC", "TD", "8C", "7H", "6H", "5H", "2C", "8S", "2D"],
    ["8S", "QC", "9D", "9C", "8H", "QH", "4H", "AC", "9S", "3D"],
    ["7S", "KH", "8D", "TC", "9H", "TH", "3H", "KC", "TS", "4D"],
    ["6S", "AH", "7D", "QC", "KH", "AH", "2H", "KD", "QS", "5D"],
    ["5S", "2H", "6D", "5D", "4D", "3D", "2D", "AD", "QH", "6D"],
    ["4S", "3H", "4H", "5H", "6H", "7H", "8H", "9H", "TH", "7D"],
    ["--", "3S", "2S", "AS", "KS", "QD", "TD", "9D", "8D", "--"],
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn assert_plate_invariants(board_type: BoardType) {
        let board = Board::new(board_type);
        let mut counts: HashMap<Card, usize> = HashMap::new();
        for cell in board.cells() {
            let corner = (cell.row == 0 || cell.row == 9) && (cell.col == 0 || cell.col == 9);
            assert_eq!(cell.is_corner(), corner, "{board_type} ({},{})", cell.row, cell.col);
            if let Some(card) = cell.card {
                assert!(!card.is_jack(), "{board_type} prints a Jack at ({},{})", cell.row, cell.col);
                *counts.entry(card).or_default() += 1;
            }
        }
        assert_eq!(counts.len(), 48, "{board_type} card variety");
        for (card, n) in counts {
            assert_eq!(n, 2, "{board_type} card {card} appears {n} times");
        }
    }

    #[test]
    fn all_plates_hold_each_card_twice() {
        assert_plate_invariants(BoardType::Classic);
        assert_plate_invariants(BoardType::Alternative);
        assert_plate_invariants(BoardType::Advanced);
    }

    #[test]
    fn corners_count_for_every_color() {
        let board = Board::new(BoardType::Classic);
        assert!(board.counts_for(0, 0, TeamColor::Green));
        assert!(board.counts_for(0, 0, TeamColor::Blue));
        assert!(board.counts_for(9, 9, TeamColor::Red));
        assert!(!board.counts_for(-1, 0, TeamColor::Green));
        assert!(!board.counts_for(4, 4, TeamColor::Green));
    }

    #[test]
    fn open_cells_excludes_corners_and_chips() {
        let mut board = Board::new(BoardType::Classic);
        assert_eq!(board.open_cells().count(), 96);
        board.cell_mut(4, 4).unwrap().chip = Some(Chip::new(TeamColor::Green));
        assert_eq!(board.open_cells().count(), 95);
    }
}
