//! Seeded double-deck engine.
//!
//! Clients reconstruct the deck from `(seed, cursor)` after a reconnect,
//! so the shuffle must be reproduced bit-for-bit across implementations:
//! mulberry32 with 32-bit wrapping arithmetic driving a Fisher-Yates pass.

use super::cards::{Card, Rank, Suit};
use rand::Rng;

/// Two standard 52-card decks.
pub const DECK_SIZE: usize = 104;

/// mulberry32, matching the JavaScript reference: `imul` maps to 32-bit
/// wrapping multiplication and `>>>` to logical shifts on `u32`.
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / 4_294_967_296.0
    }
}

/// The 104-card deck in pre-shuffle order: two copies of suits
/// {S, H, D, C} × ranks {A, 2..9, T, J, Q, K}, concatenated.
fn base_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for _ in 0..2 {
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
    }
    cards
}

/// Deterministic shuffled deck for a seed.
pub fn shuffled_deck(seed: u32) -> Vec<Card> {
    let mut cards = base_deck();
    let mut rng = Mulberry32::new(seed);
    for i in (1..cards.len()).rev() {
        let j = (rng.next_f64() * (i as f64 + 1.0)) as usize;
        cards.swap(i, j);
    }
    cards
}

/// Cards per hand: 7 heads-up, 6 otherwise.
pub fn hand_size(player_count: usize) -> usize {
    if player_count == 2 { 7 } else { 6 }
}

/// Fresh deck seed, uniform in `[0, 2^31)`.
pub fn generate_seed() -> u32 {
    rand::rng().random_range(0..(1u32 << 31))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn mulberry32_matches_reference_stream() {
        let mut rng = Mulberry32::new(1);
        // First four outputs of the JavaScript reference for seed 1.
        assert_eq!(rng.next_f64(), 0.6270739405881613);
        assert_eq!(rng.next_f64(), 0.002735721180215478);
        assert_eq!(rng.next_f64(), 0.5274470399599522);
        assert_eq!(rng.next_f64(), 0.9810509674716741);
    }

    #[test]
    fn shuffle_matches_reference_ordering() {
        let deck = shuffled_deck(1);
        let head: Vec<String> = deck[..10].iter().map(|c| c.code()).collect();
        assert_eq!(
            head,
            ["8H", "TD", "KH", "8C", "TS", "KS", "QC", "AC", "TC", "AD"]
        );
        let tail: Vec<String> = deck[100..].iter().map(|c| c.code()).collect();
        assert_eq!(tail, ["9C", "2S", "AS", "AH"]);

        let other = shuffled_deck(42);
        let head: Vec<String> = other[..4].iter().map(|c| c.code()).collect();
        assert_eq!(head, ["9C", "JS", "KC", "AC"]);
    }

    #[test]
    fn shuffle_is_a_permutation_of_the_double_deck() {
        let deck = shuffled_deck(777);
        assert_eq!(deck.len(), DECK_SIZE);
        let mut counts: HashMap<Card, usize> = HashMap::new();
        for card in deck {
            *counts.entry(card).or_default() += 1;
        }
        assert_eq!(counts.len(), 52);
        assert!(counts.values().all(|&n| n == 2));
    }

    #[test]
    fn same_seed_same_deck() {
        assert_eq!(shuffled_deck(123_456), shuffled_deck(123_456));
        assert_ne!(shuffled_deck(1), shuffled_deck(2));
    }

    #[test]
    fn hand_sizes() {
        assert_eq!(hand_size(2), 7);
        assert_eq!(hand_size(3), 6);
        assert_eq!(hand_size(4), 6);
    }

    #[test]
    fn seeds_stay_in_31_bits() {
        for _ in 0..64 {
            assert!(generate_seed() < (1 << 31));
        }
    }
}
