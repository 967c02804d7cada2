//! Card primitives and the wire codec.
//!
//! Cards travel as two-character code strings: rank then suit initial,
//! e.g. `"AS"`, `"TD"`, `"JC"`. The codec is deterministic in both
//! directions because clients rebuild hands and decks from these codes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    /// Suit order used when building a fresh deck.
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn initial(self) -> char {
        match self {
            Self::Spades => 'S',
            Self::Hearts => 'H',
            Self::Diamonds => 'D',
            Self::Clubs => 'C',
        }
    }

    fn from_initial(c: char) -> Option<Self> {
        match c {
            'S' => Some(Self::Spades),
            'H' => Some(Self::Hearts),
            'D' => Some(Self::Diamonds),
            'C' => Some(Self::Clubs),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.initial())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    /// Rank order used when building a fresh deck.
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn initial(self) -> char {
        match self {
            Self::Ace => 'A',
            Self::Two => '2',
            Self::Three => '3',
            Self::Four => '4',
            Self::Five => '5',
            Self::Six => '6',
            Self::Seven => '7',
            Self::Eight => '8',
            Self::Nine => '9',
            Self::Ten => 'T',
            Self::Jack => 'J',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    fn from_initial(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::Ace),
            '2' => Some(Self::Two),
            '3' => Some(Self::Three),
            '4' => Some(Self::Four),
            '5' => Some(Self::Five),
            '6' => Some(Self::Six),
            '7' => Some(Self::Seven),
            '8' => Some(Self::Eight),
            '9' => Some(Self::Nine),
            'T' => Some(Self::Ten),
            'J' => Some(Self::Jack),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.initial())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// One-eyed Jacks (♠J, ♥J) remove an opponent chip.
    pub fn is_one_eyed_jack(self) -> bool {
        self.rank == Rank::Jack && matches!(self.suit, Suit::Spades | Suit::Hearts)
    }

    /// Two-eyed Jacks (♦J, ♣J) place a chip on any empty non-corner cell.
    pub fn is_two_eyed_jack(self) -> bool {
        self.rank == Rank::Jack && matches!(self.suit, Suit::Diamonds | Suit::Clubs)
    }

    pub fn is_jack(self) -> bool {
        self.rank == Rank::Jack
    }

    /// Two-character wire code, e.g. `"QH"`.
    pub fn code(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.initial(), self.suit.initial())
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid card code: {0:?}")]
pub struct ParseCardError(pub String);

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(r), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseCardError(s.to_string()));
        };
        match (Rank::from_initial(r), Suit::from_initial(su)) {
            (Some(rank), Some(suit)) => Ok(Card { rank, suit }),
            _ => Err(ParseCardError(s.to_string())),
        }
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn codec_formats_ranks_and_suits() {
        let card = Card::new(Rank::Ten, Suit::Diamonds);
        assert_eq!(card.code(), "TD");
        assert_eq!("TD".parse::<Card>().unwrap(), card);
    }

    #[test]
    fn jack_classification() {
        assert!("JS".parse::<Card>().unwrap().is_one_eyed_jack());
        assert!("JH".parse::<Card>().unwrap().is_one_eyed_jack());
        assert!("JD".parse::<Card>().unwrap().is_two_eyed_jack());
        assert!("JC".parse::<Card>().unwrap().is_two_eyed_jack());
        assert!(!"JD".parse::<Card>().unwrap().is_one_eyed_jack());
        assert!(!"QS".parse::<Card>().unwrap().is_jack());
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!("".parse::<Card>().is_err());
        assert!("A".parse::<Card>().is_err());
        assert!("1S".parse::<Card>().is_err());
        assert!("AX".parse::<Card>().is_err());
        assert!("ASS".parse::<Card>().is_err());
    }

    #[test]
    fn serde_uses_code_strings() {
        let card: Card = serde_json::from_str("\"JC\"").unwrap();
        assert_eq!(card, Card::new(Rank::Jack, Suit::Clubs));
        assert_eq!(serde_json::to_string(&card).unwrap(), "\"JC\"");
    }

    proptest! {
        #[test]
        fn parse_format_round_trip(rank_idx in 0usize..13, suit_idx in 0usize..4) {
            let card = Card::new(Rank::ALL[rank_idx], Suit::ALL[suit_idx]);
            prop_assert_eq!(card.code().parse::<Card>().unwrap(), card);
        }
    }
}
