//! Core game logic: cards, boards, the deck engine, and sequence
//! detection.

pub mod board;
pub mod cards;
pub mod deck;
pub mod detector;

pub use board::{Board, BoardCell, BoardType, Chip, TeamColor, BOARD_SIZE};
pub use cards::{Card, ParseCardError, Rank, Suit};
pub use deck::{DECK_SIZE, generate_seed, hand_size, shuffled_deck};
pub use detector::{Sequence, SequenceCell, SEQUENCES_TO_WIN};
