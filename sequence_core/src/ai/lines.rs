//! Line enumeration helpers shared by the move policies.

use crate::game::board::{Board, BOARD_SIZE, DIRECTIONS, TeamColor};
use crate::game::cards::Card;

/// A 5-to-10-cell window with no blocking opponent chip: every cell is
/// empty, a corner, or already the team's color.
#[derive(Clone, Debug)]
pub struct LineWindow {
    pub cells: Vec<(usize, usize)>,
    pub own_chips: usize,
}

/// A maximal contiguous run of own-or-corner cells of length >= 5.
#[derive(Clone, Debug)]
pub struct ExistingLine {
    pub cells: Vec<(usize, usize)>,
    pub dir: (isize, isize),
}

/// Every open window for `color`, sorted by descending own-chip count.
pub fn potential_lines(board: &Board, color: TeamColor) -> Vec<LineWindow> {
    let mut windows = Vec::new();
    for (dr, dc) in DIRECTIONS {
        for len in 5..=BOARD_SIZE {
            for row in 0..BOARD_SIZE {
                for col in 0..BOARD_SIZE {
                    if let Some(window) = window_at(board, color, row, col, (dr, dc), len) {
                        windows.push(window);
                    }
                }
            }
        }
    }
    windows.sort_by(|a, b| b.own_chips.cmp(&a.own_chips));
    windows
}

fn window_at(
    board: &Board,
    color: TeamColor,
    row: usize,
    col: usize,
    (dr, dc): (isize, isize),
    len: usize,
) -> Option<LineWindow> {
    let mut cells = Vec::with_capacity(len);
    let mut own_chips = 0;
    for step in 0..len as isize {
        let (r, c) = (row as isize + dr * step, col as isize + dc * step);
        if r < 0 || c < 0 {
            return None;
        }
        let cell = board.cell(r as usize, c as usize)?;
        match cell.chip {
            Some(chip) if chip.color == color => own_chips += 1,
            Some(_) => return None,
            None => {}
        }
        cells.push((r as usize, c as usize));
    }
    Some(LineWindow { cells, own_chips })
}

/// Maximal runs of own-or-corner cells of length >= 5.
pub fn existing_lines(board: &Board, color: TeamColor) -> Vec<ExistingLine> {
    let mut lines = Vec::new();
    for (dr, dc) in DIRECTIONS {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let (r, c) = (row as isize, col as isize);
                if !board.counts_for(r, c, color) || board.counts_for(r - dr, c - dc, color) {
                    continue;
                }
                let mut cells = Vec::new();
                let (mut r, mut c) = (r, c);
                while board.counts_for(r, c, color) {
                    cells.push((r as usize, c as usize));
                    r += dr;
                    c += dc;
                }
                if cells.len() >= 5 {
                    lines.push(ExistingLine {
                        cells,
                        dir: (dr, dc),
                    });
                }
            }
        }
    }
    lines
}

/// Hand index playable onto the open cell at `(row, col)`: an exact
/// rank-and-suit match wins, otherwise any two-eyed Jack.
pub fn playable_card_for(hand: &[Card], board: &Board, row: usize, col: usize) -> Option<usize> {
    let cell = board.cell(row, col)?;
    if cell.is_corner() || cell.chip.is_some() {
        return None;
    }
    let layout_card = cell.card?;
    if let Some(idx) = hand.iter().position(|&c| c == layout_card) {
        return Some(idx);
    }
    hand.iter().position(|c| c.is_two_eyed_jack())
}

/// Opponent chips a one-eyed Jack may remove.
pub fn removable_chips(board: &Board, opponent_color: TeamColor) -> Vec<(usize, usize)> {
    board
        .cells()
        .filter(|cell| {
            cell.chip
                .is_some_and(|chip| chip.color == opponent_color && !chip.part_of_sequence)
        })
        .map(|cell| (cell.row, cell.col))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{BoardType, Chip};
    use crate::game::cards::{Rank, Suit};

    #[test]
    fn windows_reject_blocked_lines() {
        let mut board = Board::new(BoardType::Classic);
        board.cell_mut(4, 4).unwrap().chip = Some(Chip::new(TeamColor::Blue));
        let windows = potential_lines(&board, TeamColor::Green);
        assert!(windows.iter().all(|w| !w.cells.contains(&(4, 4))));
    }

    #[test]
    fn windows_sorted_by_own_chips() {
        let mut board = Board::new(BoardType::Classic);
        for col in 2..5 {
            board.cell_mut(6, col).unwrap().chip = Some(Chip::new(TeamColor::Green));
        }
        let windows = potential_lines(&board, TeamColor::Green);
        assert_eq!(windows.first().map(|w| w.own_chips), Some(3));
    }

    #[test]
    fn existing_lines_span_corners() {
        let mut board = Board::new(BoardType::Classic);
        for col in 1..5 {
            board.cell_mut(0, col).unwrap().chip = Some(Chip::new(TeamColor::Green));
        }
        let lines = existing_lines(&board, TeamColor::Green);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].cells.len(), 5);
        assert_eq!(lines[0].cells[0], (0, 0));
    }

    #[test]
    fn exact_match_beats_wild_jack() {
        let board = Board::new(BoardType::Classic);
        let target = board.cell(4, 4).unwrap().card.unwrap();
        let hand = [Card::new(Rank::Jack, Suit::Diamonds), target];
        assert_eq!(playable_card_for(&hand, &board, 4, 4), Some(1));

        let jack_only = [Card::new(Rank::Jack, Suit::Clubs)];
        assert_eq!(playable_card_for(&jack_only, &board, 4, 4), Some(0));

        let unrelated = [Card::new(Rank::Jack, Suit::Spades)];
        assert_eq!(playable_card_for(&unrelated, &board, 4, 4), None);
    }

    #[test]
    fn sequence_chips_are_not_removable() {
        let mut board = Board::new(BoardType::Classic);
        board.cell_mut(3, 3).unwrap().chip = Some(Chip::new(TeamColor::Blue));
        board.cell_mut(3, 4).unwrap().chip = Some(Chip {
            color: TeamColor::Blue,
            part_of_sequence: true,
        });
        assert_eq!(removable_chips(&board, TeamColor::Blue), vec![(3, 3)]);
    }
}
