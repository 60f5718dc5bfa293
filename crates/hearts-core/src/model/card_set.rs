use crate::model::card::Card;
use crate::model::suit::Suit;
use core::fmt;

/// Set of cards packed into the low 52 bits of a `u64`, indexed by [`Card::to_id`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CardSet(u64);

const FULL_MASK: u64 = (1u64 << 52) - 1;
const SUIT_MASK: u64 = (1u64 << 13) - 1;

impl CardSet {
    pub const EMPTY: CardSet = CardSet(0);
    pub const FULL: CardSet = CardSet(FULL_MASK);

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, card: Card) -> bool {
        self.0 & (1u64 << card.to_id()) != 0
    }

    /// Adds `card`, returning `false` if it was already present.
    pub fn insert(&mut self, card: Card) -> bool {
        let bit = 1u64 << card.to_id();
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    pub fn remove(&mut self, card: Card) -> bool {
        let bit = 1u64 << card.to_id();
        let present = self.0 & bit != 0;
        self.0 &= !bit;
        present
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn union(self, other: CardSet) -> CardSet {
        CardSet(self.0 | other.0)
    }

    pub const fn intersection(self, other: CardSet) -> CardSet {
        CardSet(self.0 & other.0)
    }

    pub const fn difference(self, other: CardSet) -> CardSet {
        CardSet(self.0 & !other.0)
    }

    pub const fn complement(self) -> CardSet {
        CardSet(!self.0 & FULL_MASK)
    }

    pub const fn of_suit(self, suit: Suit) -> CardSet {
        CardSet(self.0 & (SUIT_MASK << (suit as u8 * 13)))
    }

    pub const fn count_suit(self, suit: Suit) -> usize {
        self.of_suit(suit).len()
    }

    pub const fn has_suit(self, suit: Suit) -> bool {
        !self.of_suit(suit).is_empty()
    }

    /// Iterates in canonical order (suit, then rank).
    pub fn iter(self) -> CardSetIter {
        CardSetIter(self.0)
    }

    pub fn to_vec(self) -> Vec<Card> {
        self.iter().collect()
    }
}

impl FromIterator<Card> for CardSet {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        let mut set = CardSet::EMPTY;
        for card in iter {
            set.insert(card);
        }
        set
    }
}

impl<'a> FromIterator<&'a Card> for CardSet {
    fn from_iter<I: IntoIterator<Item = &'a Card>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}

impl IntoIterator for CardSet {
    type Item = Card;
    type IntoIter = CardSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct CardSetIter(u64);

impl Iterator for CardSetIter {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        while self.0 != 0 {
            let id = self.0.trailing_zeros() as u8;
            self.0 &= self.0 - 1;
            if let Some(card) = Card::from_id(id) {
                return Some(card);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.0.count_ones() as usize;
        (remaining, Some(remaining))
    }
}

impl fmt::Debug for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|card| card.to_string())).finish()
    }
}
