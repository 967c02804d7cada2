//! Greedy move policies at three difficulty levels.
//!
//! No lookahead; each policy walks its preference ladder and falls back
//! to a uniformly random legal move. With a double deck and Jacks always
//! playable, a live game always has at least one legal move, so `None`
//! from the selector indicates a server-side invariant violation.

use super::lines::{existing_lines, playable_card_for, potential_lines, removable_chips};
use crate::game::board::{Board, TeamColor};
use crate::game::cards::Card;
use rand::{Rng, rngs::ThreadRng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A fully resolved move: which hand card to play and where.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AiMove {
    pub card_index: usize,
    pub row: usize,
    pub col: usize,
}

pub struct MoveSelector {
    rng: ThreadRng,
}

impl MoveSelector {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }

    /// Pick a legal move for the AI's turn.
    ///
    /// `turn_number` is how many turns this AI has already taken in the
    /// game; the easy policy alternates behavior on its parity.
    pub fn select_move(
        &mut self,
        difficulty: Difficulty,
        hand: &[Card],
        board: &Board,
        ai_color: TeamColor,
        opponent_color: TeamColor,
        turn_number: usize,
    ) -> Option<AiMove> {
        match difficulty {
            Difficulty::Easy => self.select_easy(hand, board, ai_color, opponent_color, turn_number),
            Difficulty::Medium => self.select_medium(hand, board, ai_color, opponent_color),
            Difficulty::Hard => self.select_hard(hand, board, ai_color, opponent_color),
        }
    }

    fn select_easy(
        &mut self,
        hand: &[Card],
        board: &Board,
        ai_color: TeamColor,
        opponent_color: TeamColor,
        turn_number: usize,
    ) -> Option<AiMove> {
        // A held one-eyed Jack is spent on the first removable chip
        // available, with no regard for its strategic value.
        if let Some(card_index) = hand.iter().position(|c| c.is_one_eyed_jack()) {
            let removable = removable_chips(board, opponent_color);
            if !removable.is_empty() {
                let (row, col) = removable[self.rng.random_range(0..removable.len())];
                return Some(AiMove {
                    card_index,
                    row,
                    col,
                });
            }
        }

        if turn_number % 2 == 0
            && let Some(ai_move) = self.extend_any_line(hand, board, ai_color, 1)
        {
            return Some(ai_move);
        }

        self.random_legal_move(hand, board, opponent_color)
    }

    fn select_medium(
        &mut self,
        hand: &[Card],
        board: &Board,
        ai_color: TeamColor,
        opponent_color: TeamColor,
    ) -> Option<AiMove> {
        if let Some(ai_move) = self.grow_existing_line(hand, board, ai_color) {
            return Some(ai_move);
        }
        if let Some(ai_move) = self.extend_any_line(hand, board, ai_color, 3) {
            return Some(ai_move);
        }
        if let Some(ai_move) = self.extend_any_line(hand, board, ai_color, 1) {
            return Some(ai_move);
        }
        self.random_legal_move(hand, board, opponent_color)
    }

    fn select_hard(
        &mut self,
        hand: &[Card],
        board: &Board,
        ai_color: TeamColor,
        opponent_color: TeamColor,
    ) -> Option<AiMove> {
        // Push an established sequence line toward the 10-cell double.
        if let Some(ai_move) = self.grow_existing_line(hand, board, ai_color) {
            return Some(ai_move);
        }

        // Complete a 4-chip window to a fresh sequence.
        if let Some(ai_move) = self.extend_exact_count(hand, board, ai_color, 4) {
            return Some(ai_move);
        }

        // Cut the opponent's strongest developing line with a one-eyed Jack.
        if let Some(card_index) = hand.iter().position(|c| c.is_one_eyed_jack())
            && let Some((row, col)) = self.threatened_chip(board, opponent_color, 4)
        {
            return Some(AiMove {
                card_index,
                row,
                col,
            });
        }

        // Block a developing opponent window with an exact (non-Jack) card.
        if let Some(ai_move) = self.block_opponent_line(hand, board, opponent_color) {
            return Some(ai_move);
        }

        if let Some(ai_move) = self.extend_any_line(hand, board, ai_color, 1) {
            return Some(ai_move);
        }
        self.random_legal_move(hand, board, opponent_color)
    }

    /// Extend an existing 5..9-cell line at either end.
    fn grow_existing_line(
        &mut self,
        hand: &[Card],
        board: &Board,
        color: TeamColor,
    ) -> Option<AiMove> {
        for line in existing_lines(board, color) {
            if line.cells.len() >= 10 {
                continue;
            }
            let (dr, dc) = line.dir;
            let ends = [
                (
                    line.cells[0].0 as isize - dr,
                    line.cells[0].1 as isize - dc,
                ),
                (
                    line.cells[line.cells.len() - 1].0 as isize + dr,
                    line.cells[line.cells.len() - 1].1 as isize + dc,
                ),
            ];
            for (r, c) in ends {
                if r < 0 || c < 0 {
                    continue;
                }
                let (row, col) = (r as usize, c as usize);
                if let Some(card_index) = playable_card_for(hand, board, row, col) {
                    return Some(AiMove {
                        card_index,
                        row,
                        col,
                    });
                }
            }
        }
        None
    }

    /// Play into the strongest open window holding at least `min_chips`.
    fn extend_any_line(
        &mut self,
        hand: &[Card],
        board: &Board,
        color: TeamColor,
        min_chips: usize,
    ) -> Option<AiMove> {
        for window in potential_lines(board, color) {
            if window.own_chips < min_chips {
                break;
            }
            for &(row, col) in &window.cells {
                if let Some(card_index) = playable_card_for(hand, board, row, col) {
                    return Some(AiMove {
                        card_index,
                        row,
                        col,
                    });
                }
            }
        }
        None
    }

    /// Play into a window holding exactly `chips` own chips.
    fn extend_exact_count(
        &mut self,
        hand: &[Card],
        board: &Board,
        color: TeamColor,
        chips: usize,
    ) -> Option<AiMove> {
        for window in potential_lines(board, color) {
            if window.own_chips < chips {
                break;
            }
            if window.own_chips != chips {
                continue;
            }
            for &(row, col) in &window.cells {
                if let Some(card_index) = playable_card_for(hand, board, row, col) {
                    return Some(AiMove {
                        card_index,
                        row,
                        col,
                    });
                }
            }
        }
        None
    }

    /// A removable opponent chip sitting on an opponent window holding at
    /// least `min_chips`.
    fn threatened_chip(
        &mut self,
        board: &Board,
        opponent_color: TeamColor,
        min_chips: usize,
    ) -> Option<(usize, usize)> {
        for window in potential_lines(board, opponent_color) {
            if window.own_chips < min_chips {
                break;
            }
            for &(row, col) in &window.cells {
                let removable = board.cell(row, col).and_then(|c| c.chip).is_some_and(|chip| {
                    chip.color == opponent_color && !chip.part_of_sequence
                });
                if removable {
                    return Some((row, col));
                }
            }
        }
        None
    }

    /// Drop an exact-match card onto an empty cell of a developing
    /// opponent window.
    fn block_opponent_line(
        &mut self,
        hand: &[Card],
        board: &Board,
        opponent_color: TeamColor,
    ) -> Option<AiMove> {
        for window in potential_lines(board, opponent_color) {
            if window.own_chips < 3 {
                break;
            }
            for &(row, col) in &window.cells {
                let cell = board.cell(row, col)?;
                if cell.is_corner() || cell.chip.is_some() {
                    continue;
                }
                let layout_card = cell.card?;
                if let Some(card_index) = hand
                    .iter()
                    .position(|&c| c == layout_card && !c.is_jack())
                {
                    return Some(AiMove {
                        card_index,
                        row,
                        col,
                    });
                }
            }
        }
        None
    }

    /// Uniformly random pick over every legal (card, cell) pairing.
    fn random_legal_move(
        &mut self,
        hand: &[Card],
        board: &Board,
        opponent_color: TeamColor,
    ) -> Option<AiMove> {
        let moves = legal_moves(hand, board, opponent_color);
        if moves.is_empty() {
            return None;
        }
        Some(moves[self.rng.random_range(0..moves.len())])
    }
}

impl Default for MoveSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Every legal move for a hand: ordinary cards onto their open layout
/// cells, two-eyed Jacks onto any open cell, one-eyed Jacks onto any
/// removable opponent chip.
pub fn legal_moves(hand: &[Card], board: &Board, opponent_color: TeamColor) -> Vec<AiMove> {
    let mut moves = Vec::new();
    for (card_index, card) in hand.iter().enumerate() {
        if card.is_one_eyed_jack() {
            for (row, col) in removable_chips(board, opponent_color) {
                moves.push(AiMove {
                    card_index,
                    row,
                    col,
                });
            }
        } else if card.is_two_eyed_jack() {
            for cell in board.open_cells() {
                moves.push(AiMove {
                    card_index,
                    row: cell.row,
                    col: cell.col,
                });
            }
        } else {
            for cell in board.open_cells() {
                if cell.card == Some(*card) {
                    moves.push(AiMove {
                        card_index,
                        row: cell.row,
                        col: cell.col,
                    });
                }
            }
        }
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{BoardType, Chip};
    use crate::game::cards::{Rank, Suit};

    fn is_legal(board: &Board, hand: &[Card], opponent: TeamColor, m: &AiMove) -> bool {
        legal_moves(hand, board, opponent).contains(m)
    }

    #[test]
    fn every_difficulty_returns_a_legal_move() {
        let mut board = Board::new(BoardType::Classic);
        board.cell_mut(5, 5).unwrap().chip = Some(Chip::new(TeamColor::Blue));
        let hand = [
            Card::new(Rank::Jack, Suit::Spades),
            Card::new(Rank::Jack, Suit::Diamonds),
            Card::new(Rank::Ace, Suit::Clubs),
        ];
        let mut selector = MoveSelector::new();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for turn in 0..4 {
                let m = selector
                    .select_move(difficulty, &hand, &board, TeamColor::Green, TeamColor::Blue, turn)
                    .expect("a legal move always exists");
                assert!(is_legal(&board, &hand, TeamColor::Blue, &m), "{difficulty:?} produced {m:?}");
            }
        }
    }

    #[test]
    fn easy_spends_one_eyed_jack_when_chip_removable() {
        let mut board = Board::new(BoardType::Classic);
        board.cell_mut(3, 7).unwrap().chip = Some(Chip::new(TeamColor::Blue));
        let hand = [
            Card::new(Rank::Two, Suit::Spades),
            Card::new(Rank::Jack, Suit::Hearts),
        ];
        let mut selector = MoveSelector::new();
        let m = selector
            .select_move(Difficulty::Easy, &hand, &board, TeamColor::Green, TeamColor::Blue, 1)
            .unwrap();
        assert_eq!(m, AiMove { card_index: 1, row: 3, col: 7 });
    }

    #[test]
    fn medium_extends_its_strongest_window() {
        let mut board = Board::new(BoardType::Classic);
        // Three green chips in row 6; the AI holds a two-eyed Jack.
        for col in 2..5 {
            board.cell_mut(6, col).unwrap().chip = Some(Chip::new(TeamColor::Green));
        }
        let hand = [Card::new(Rank::Jack, Suit::Clubs)];
        let mut selector = MoveSelector::new();
        let m = selector
            .select_move(Difficulty::Medium, &hand, &board, TeamColor::Green, TeamColor::Blue, 0)
            .unwrap();
        // The move lands on the row-6 line the window enumeration ranked first.
        assert_eq!(m.card_index, 0);
        assert_eq!(m.row, 6);
    }

    #[test]
    fn hard_completes_a_four_window() {
        let mut board = Board::new(BoardType::Classic);
        for col in 2..6 {
            board.cell_mut(4, col).unwrap().chip = Some(Chip::new(TeamColor::Green));
        }
        let hand = [Card::new(Rank::Jack, Suit::Diamonds)];
        let mut selector = MoveSelector::new();
        let m = selector
            .select_move(Difficulty::Hard, &hand, &board, TeamColor::Green, TeamColor::Blue, 0)
            .unwrap();
        assert_eq!(m.row, 4);
        assert!(m.col == 1 || m.col == 6, "completes the line at an end, got {m:?}");
    }

    #[test]
    fn hard_cuts_a_four_chip_threat() {
        let mut board = Board::new(BoardType::Classic);
        for col in 3..7 {
            board.cell_mut(2, col).unwrap().chip = Some(Chip::new(TeamColor::Blue));
        }
        let hand = [Card::new(Rank::Jack, Suit::Spades)];
        let mut selector = MoveSelector::new();
        let m = selector
            .select_move(Difficulty::Hard, &hand, &board, TeamColor::Green, TeamColor::Blue, 0)
            .unwrap();
        assert_eq!(m.card_index, 0);
        assert_eq!(m.row, 2);
        assert!((3..7).contains(&m.col));
    }

    #[test]
    fn no_legal_move_only_when_hand_is_dead() {
        let mut board = Board::new(BoardType::Classic);
        // Fill the whole board with locked green chips: nothing is open and
        // nothing is removable.
        for row in 0..10 {
            for col in 0..10 {
                if let Some(cell) = board.cell_mut(row, col)
                    && !cell.is_corner()
                {
                    cell.chip = Some(Chip {
                        color: TeamColor::Green,
                        part_of_sequence: true,
                    });
                }
            }
        }
        let hand = [Card::new(Rank::Jack, Suit::Hearts)];
        let mut selector = MoveSelector::new();
        let m = selector.select_move(
            Difficulty::Medium,
            &hand,
            &board,
            TeamColor::Blue,
            TeamColor::Green,
            0,
        );
        assert!(m.is_none());
    }
}
