//! Sequence detection over the board.
//!
//! A sequence is 5+ chips of one team in an unbroken line; corners are
//! wild for every team. A line of exactly 10 counts as two sequences.
//! Detection is delta-based: the full-board count for a team is compared
//! against the records already on file, and the difference is attributed
//! to lines holding a freshly placed chip.

use super::board::{Board, BOARD_SIZE, DIRECTIONS, TeamColor};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SequenceCell {
    pub row: usize,
    pub col: usize,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub team_color: TeamColor,
    pub cells: Vec<SequenceCell>,
}

/// Sequences required to win.
pub const SEQUENCES_TO_WIN: usize = 2;

/// Total sequence count for a team across the whole board.
///
/// Maximal runs are scanned once per direction; identity is the run's
/// start coordinate plus the direction, so overlapping windows inside one
/// run are not double counted.
pub fn count_sequences(board: &Board, color: TeamColor) -> usize {
    let mut total = 0;
    for (dr, dc) in DIRECTIONS {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if !is_run_start(board, row, col, (dr, dc), color) {
                    continue;
                }
                let len = run_from(board, row, col, (dr, dc), color).len();
                total += score_for_len(len);
            }
        }
    }
    total
}

/// Detect sequences created by the most recent move, append-ready.
///
/// Returns the new records (two for a fresh 10-line) and marks every chip
/// they lock, including the full maximal line trace through each record's
/// first cell. Calling again without board changes returns nothing.
pub fn detect_new_sequences(
    board: &mut Board,
    color: TeamColor,
    recorded: &[Sequence],
) -> Vec<Sequence> {
    let total = count_sequences(board, color);
    let recorded_count = recorded.iter().filter(|s| s.team_color == color).count();
    let mut remaining = total.saturating_sub(recorded_count);
    if remaining == 0 {
        return Vec::new();
    }

    let mut new_sequences = Vec::new();
    for run in fresh_runs(board, color) {
        if remaining == 0 {
            break;
        }
        let contributions = score_for_len(run.len()).min(remaining);
        for _ in 0..contributions {
            new_sequences.push(Sequence {
                team_color: color,
                cells: run.clone(),
            });
        }
        remaining -= contributions;
    }

    for sequence in &new_sequences {
        mark_sequence(board, sequence);
    }
    new_sequences
}

fn score_for_len(len: usize) -> usize {
    if len >= BOARD_SIZE {
        2
    } else if len >= 5 {
        1
    } else {
        0
    }
}

fn is_run_start(
    board: &Board,
    row: usize,
    col: usize,
    (dr, dc): (isize, isize),
    color: TeamColor,
) -> bool {
    board.counts_for(row as isize, col as isize, color)
        && !board.counts_for(row as isize - dr, col as isize - dc, color)
}

fn run_from(
    board: &Board,
    row: usize,
    col: usize,
    (dr, dc): (isize, isize),
    color: TeamColor,
) -> Vec<SequenceCell> {
    let mut cells = Vec::new();
    let (mut r, mut c) = (row as isize, col as isize);
    while board.counts_for(r, c, color) {
        cells.push(SequenceCell {
            row: r as usize,
            col: c as usize,
        });
        r += dr;
        c += dc;
    }
    cells
}

/// Maximal runs of length >= 5 holding at least one unmarked chip of the
/// team, i.e. the only lines a new sequence can live on.
fn fresh_runs(board: &Board, color: TeamColor) -> Vec<Vec<SequenceCell>> {
    let mut runs = Vec::new();
    for (dr, dc) in DIRECTIONS {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if !is_run_start(board, row, col, (dr, dc), color) {
                    continue;
                }
                let run = run_from(board, row, col, (dr, dc), color);
                if run.len() >= 5 && run.iter().any(|cell| has_fresh_chip(board, cell, color)) {
                    runs.push(run);
                }
            }
        }
    }
    runs
}

fn has_fresh_chip(board: &Board, cell: &SequenceCell, color: TeamColor) -> bool {
    board
        .cell(cell.row, cell.col)
        .and_then(|c| c.chip)
        .is_some_and(|chip| chip.color == color && !chip.part_of_sequence)
}

fn mark_chip(board: &mut Board, row: usize, col: usize, color: TeamColor) {
    if let Some(cell) = board.cell_mut(row, col)
        && let Some(chip) = cell.chip.as_mut()
        && chip.color == color
    {
        chip.part_of_sequence = true;
    }
}

/// Lock every chip in the sequence, then trace the maximal line through
/// its first cell in all four directions so a 10-line locks all ten chips.
fn mark_sequence(board: &mut Board, sequence: &Sequence) {
    let color = sequence.team_color;
    for cell in &sequence.cells {
        mark_chip(board, cell.row, cell.col, color);
    }
    let Some(first) = sequence.cells.first().copied() else {
        return;
    };
    for (dr, dc) in DIRECTIONS {
        // Step back to the line's start, then mark forward along it.
        let (mut r, mut c) = (first.row as isize, first.col as isize);
        while board.counts_for(r - dr, c - dc, color) {
            r -= dr;
            c -= dc;
        }
        while board.counts_for(r, c, color) {
            mark_chip(board, r as usize, c as usize, color);
            r += dr;
            c += dc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{BoardType, Chip};

    fn place(board: &mut Board, row: usize, col: usize, color: TeamColor) {
        board.cell_mut(row, col).unwrap().chip = Some(Chip::new(color));
    }

    #[test]
    fn five_in_a_row_is_one_sequence() {
        let mut board = Board::new(BoardType::Classic);
        for col in 2..7 {
            place(&mut board, 4, col, TeamColor::Green);
        }
        assert_eq!(count_sequences(&board, TeamColor::Green), 1);
        assert_eq!(count_sequences(&board, TeamColor::Blue), 0);
    }

    #[test]
    fn four_chips_through_a_corner_score() {
        let mut board = Board::new(BoardType::Classic);
        // (0,0) is a corner; four green chips complete the line of five.
        for col in 1..5 {
            place(&mut board, 0, col, TeamColor::Green);
        }
        assert_eq!(count_sequences(&board, TeamColor::Green), 1);

        let new = detect_new_sequences(&mut board, TeamColor::Green, &[]);
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].cells.first(), Some(&SequenceCell { row: 0, col: 0 }));
        assert!(board.cell(0, 0).unwrap().chip.is_none(), "corners never hold chips");
    }

    #[test]
    fn ten_in_a_row_counts_exactly_two() {
        let mut board = Board::new(BoardType::Classic);
        for col in 0..10 {
            if !board.cell(5, col).unwrap().is_corner() {
                place(&mut board, 5, col, TeamColor::Blue);
            }
        }
        assert_eq!(count_sequences(&board, TeamColor::Blue), 2);

        let mut recorded = detect_new_sequences(&mut board, TeamColor::Blue, &[]);
        assert_eq!(recorded.len(), 2);

        // All ten chips are locked and re-detection never inflates the count.
        for col in 0..10 {
            let cell = board.cell(5, col).unwrap();
            if let Some(chip) = cell.chip {
                assert!(chip.part_of_sequence);
            }
        }
        let more = detect_new_sequences(&mut board, TeamColor::Blue, &recorded);
        assert!(more.is_empty());
        recorded.extend(more);
        assert_eq!(count_sequences(&board, TeamColor::Blue), recorded.len());
    }

    #[test]
    fn detection_is_idempotent() {
        let mut board = Board::new(BoardType::Classic);
        for row in 3..8 {
            place(&mut board, row, 2, TeamColor::Green);
        }
        let first = detect_new_sequences(&mut board, TeamColor::Green, &[]);
        assert_eq!(first.len(), 1);
        let second = detect_new_sequences(&mut board, TeamColor::Green, &first);
        assert!(second.is_empty());
    }

    #[test]
    fn extending_nine_to_ten_adds_one_record() {
        let mut board = Board::new(BoardType::Classic);
        // Vertical line down column 4, rows 0..9 (no corners in this column).
        for row in 0..9 {
            place(&mut board, row, 4, TeamColor::Green);
        }
        let mut recorded = detect_new_sequences(&mut board, TeamColor::Green, &[]);
        assert_eq!(recorded.len(), 1, "a 9-run is one sequence");

        place(&mut board, 9, 4, TeamColor::Green);
        let new = detect_new_sequences(&mut board, TeamColor::Green, &recorded);
        assert_eq!(new.len(), 1, "completing the 10-line adds exactly one more");
        recorded.extend(new);
        assert_eq!(recorded.len(), SEQUENCES_TO_WIN);
    }

    #[test]
    fn diagonal_sequences_detected() {
        let mut board = Board::new(BoardType::Advanced);
        for i in 5..10 {
            if !board.cell(i, i).unwrap().is_corner() {
                place(&mut board, i, i, TeamColor::Blue);
            }
        }
        // (9,9) is a corner, so chips sit on (5,5)..(8,8) plus the wild corner.
        assert_eq!(count_sequences(&board, TeamColor::Blue), 1);
    }

    #[test]
    fn opponent_chip_breaks_the_line() {
        let mut board = Board::new(BoardType::Classic);
        for col in 2..7 {
            place(&mut board, 6, col, TeamColor::Green);
        }
        board.cell_mut(6, 4).unwrap().chip = Some(Chip::new(TeamColor::Blue));
        assert_eq!(count_sequences(&board, TeamColor::Green), 0);
    }
}
