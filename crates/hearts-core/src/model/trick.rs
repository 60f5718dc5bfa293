use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trick {
    leader: PlayerPosition,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub position: PlayerPosition,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrickError {
    TrickComplete,
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
}

impl fmt::Display for TrickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrickError::TrickComplete => write!(f, "trick already has four cards"),
            TrickError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to play next but got {actual}")
            }
        }
    }
}

impl std::error::Error for TrickError {}

impl Trick {
    pub fn new(leader: PlayerPosition) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(4),
        }
    }

    /// Builds a trick from plays listed in table order, rejecting out-of-turn entries.
    pub fn from_plays<I>(leader: PlayerPosition, plays: I) -> Result<Self, TrickError>
    where
        I: IntoIterator<Item = (PlayerPosition, Card)>,
    {
        let mut trick = Trick::new(leader);
        for (position, card) in plays {
            trick.play(position, card)?;
        }
        Ok(trick)
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.plays.iter().map(|play| play.card)
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    pub fn has_played(&self, position: PlayerPosition) -> bool {
        self.plays.iter().any(|play| play.position == position)
    }

    /// Seat expected to play next; `None` once the trick is complete.
    pub fn next_to_play(&self) -> Option<PlayerPosition> {
        if self.is_complete() {
            None
        } else {
            Some(self.leader.advance(self.plays.len()))
        }
    }

    pub fn play(&mut self, position: PlayerPosition, card: Card) -> Result<(), TrickError> {
        let expected = self.next_to_play().ok_or(TrickError::TrickComplete)?;
        if expected != position {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }

        self.plays.push(Play { position, card });
        Ok(())
    }

    pub fn winner(&self) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        self.leading_play().map(|play| play.position)
    }

    /// Highest card of the led suit played so far.
    pub fn leading_play(&self) -> Option<Play> {
        let lead_suit = self.lead_suit()?;
        self.plays
            .iter()
            .filter(|play| play.card.suit == lead_suit)
            .max_by_key(|play| play.card.rank)
            .copied()
    }
}
