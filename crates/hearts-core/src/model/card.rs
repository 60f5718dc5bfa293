use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::cmp::Ordering;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const TWO_OF_CLUBS: Card = Card::new(Rank::Two, Suit::Clubs);
    pub const QUEEN_OF_SPADES: Card = Card::new(Rank::Queen, Suit::Spades);
    pub const JACK_OF_DIAMONDS: Card = Card::new(Rank::Jack, Suit::Diamonds);

    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Dense id in `0..52`, grouped by suit in canonical order.
    pub const fn to_id(self) -> u8 {
        self.suit as u8 * 13 + self.rank.ordinal()
    }

    pub fn from_id(id: u8) -> Option<Self> {
        if id >= 52 {
            return None;
        }
        let suit = match Suit::from_index((id / 13) as usize) {
            Some(suit) => suit,
            None => return None,
        };
        match Rank::from_value(id % 13 + 2) {
            Some(rank) => Some(Self { rank, suit }),
            None => None,
        }
    }

    /// Canonical ordering key used for tie-breaks: suit first, then rank.
    pub const fn sort_key(self) -> (u8, u8) {
        (self.suit as u8, self.rank.value())
    }

    pub const fn is_penalty(self) -> bool {
        matches!(self.suit, Suit::Hearts) || self.is_queen_of_spades()
    }

    pub const fn is_queen_of_spades(self) -> bool {
        matches!(self.rank, Rank::Queen) && matches!(self.suit, Suit::Spades)
    }

    pub const fn is_jack_of_diamonds(self) -> bool {
        matches!(self.rank, Rank::Jack) && matches!(self.suit, Suit::Diamonds)
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}
