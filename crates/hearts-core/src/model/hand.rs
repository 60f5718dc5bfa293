use crate::model::card::Card;
use crate::model::card_set::CardSet;

/// Cards held by one seat, kept in canonical (suit, rank) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(mut cards: Vec<Card>) -> Self {
        cards.sort();
        Self { cards }
    }

    pub fn remove(&mut self, card: Card) -> bool {
        match self.cards.binary_search(&card) {
            Ok(index) => {
                self.cards.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.binary_search(&card).is_ok()
    }

    /// First card that appears twice, if any.
    pub fn duplicate(&self) -> Option<Card> {
        self.cards
            .windows(2)
            .find(|pair| pair[0] == pair[1])
            .map(|pair| pair[0])
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn to_set(&self) -> CardSet {
        self.cards.iter().collect()
    }
}
