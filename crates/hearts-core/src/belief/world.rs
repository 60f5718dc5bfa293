//! A fully determined deal that can be played forward to the end of the hand.

use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::player::PlayerPosition;
use crate::model::trick::Trick;
use crate::model::variant::RuleSet;
use crate::rules::{self, IllegalStateError};

#[derive(Debug, Clone)]
pub struct World {
    hands: [CardSet; 4],
    trick: Trick,
    hearts_broken: bool,
    first_trick: bool,
    taken: [CardSet; 4],
    tricks_won: [u8; 4],
    rules: RuleSet,
    scores: [f64; 4],
}

impl World {
    pub fn new(
        hands: [CardSet; 4],
        trick: Trick,
        hearts_broken: bool,
        first_trick: bool,
        taken: [CardSet; 4],
        tricks_won: [u8; 4],
        rules: RuleSet,
    ) -> Self {
        Self {
            hands,
            trick,
            hearts_broken,
            first_trick,
            taken,
            tricks_won,
            rules,
            scores: [0.0; 4],
        }
    }

    /// Attaches the match scores standing before this hand.
    pub fn with_scores(mut self, scores: [f64; 4]) -> Self {
        self.scores = scores;
        self
    }

    pub fn scores(&self) -> [f64; 4] {
        self.scores
    }

    pub fn hand(&self, seat: PlayerPosition) -> CardSet {
        self.hands[seat.index()]
    }

    pub fn current_trick(&self) -> &Trick {
        &self.trick
    }

    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    pub fn is_first_trick(&self) -> bool {
        self.first_trick
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn taken(&self, seat: PlayerPosition) -> CardSet {
        self.taken[seat.index()]
    }

    pub fn tricks_won(&self, seat: PlayerPosition) -> u8 {
        self.tricks_won[seat.index()]
    }

    /// Seat due to play, or `None` once that seat has nothing left to play.
    pub fn to_move(&self) -> Option<PlayerPosition> {
        let seat = self.trick.next_to_play()?;
        if self.hands[seat.index()].is_empty() {
            None
        } else {
            Some(seat)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.to_move().is_none()
    }

    pub fn legal_moves(&self, seat: PlayerPosition) -> Result<CardSet, IllegalStateError> {
        rules::legal_set(
            self.hands[seat.index()],
            &self.trick,
            self.hearts_broken,
            self.first_trick,
            self.rules,
        )
    }

    /// Plays `card` for `seat`. Returns the winner when the play completes a trick.
    pub fn play(
        &mut self,
        seat: PlayerPosition,
        card: Card,
    ) -> Result<Option<PlayerPosition>, IllegalStateError> {
        let expected = self.to_move().ok_or(IllegalStateError::EmptyHand)?;
        if expected != seat {
            return Err(IllegalStateError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        if !self.legal_moves(seat)?.contains(card) {
            return Err(IllegalStateError::IllegalCard { seat, card });
        }

        self.hands[seat.index()].remove(card);
        self.trick
            .play(seat, card)
            .map_err(|_| IllegalStateError::TrickComplete)?;

        let Some(winner) = self.trick.winner() else {
            return Ok(None);
        };
        self.hearts_broken = rules::updates_hearts_broken(&self.trick, self.hearts_broken, self.rules);
        let slot = &mut self.taken[winner.index()];
        *slot = slot.union(self.trick.cards().collect());
        self.tricks_won[winner.index()] += 1;
        self.first_trick = false;
        self.trick = Trick::new(winner);
        Ok(Some(winner))
    }

    /// Points already won by `seat`, before end-of-hand adjustments.
    pub fn taken_points(&self, seat: PlayerPosition) -> i32 {
        self.taken[seat.index()]
            .iter()
            .map(|card| rules::card_points(card, self.rules))
            .sum()
    }

    /// End-of-hand scoring of the cards won so far.
    pub fn hand_points(&self) -> [i32; 4] {
        rules::hand_points(&self.taken, &self.tricks_won, self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn set(cards: &[Card]) -> CardSet {
        cards.iter().collect()
    }

    fn two_card_world() -> World {
        let hands = [
            set(&[card(Rank::Two, Suit::Clubs), card(Rank::Ace, Suit::Hearts)]),
            set(&[card(Rank::King, Suit::Clubs), card(Rank::Three, Suit::Hearts)]),
            set(&[Card::QUEEN_OF_SPADES, card(Rank::Four, Suit::Hearts)]),
            set(&[card(Rank::Three, Suit::Clubs), card(Rank::Five, Suit::Hearts)]),
        ];
        World::new(
            hands,
            Trick::new(PlayerPosition::North),
            false,
            false,
            [CardSet::EMPTY; 4],
            [0; 4],
            RuleSet::standard(),
        )
    }

    #[test]
    fn completed_trick_goes_to_winner_who_leads_next() {
        let mut world = two_card_world();
        assert_eq!(world.play(PlayerPosition::North, card(Rank::Two, Suit::Clubs)), Ok(None));
        assert_eq!(world.play(PlayerPosition::East, card(Rank::King, Suit::Clubs)), Ok(None));
        assert_eq!(world.play(PlayerPosition::South, Card::QUEEN_OF_SPADES), Ok(None));
        assert_eq!(
            world.play(PlayerPosition::West, card(Rank::Three, Suit::Clubs)),
            Ok(Some(PlayerPosition::East))
        );
        assert_eq!(world.to_move(), Some(PlayerPosition::East));
        assert_eq!(world.taken_points(PlayerPosition::East), 13);
        assert!(world.hearts_broken());
    }

    #[test]
    fn out_of_turn_and_illegal_cards_rejected() {
        let mut world = two_card_world();
        assert!(matches!(
            world.play(PlayerPosition::East, card(Rank::King, Suit::Clubs)),
            Err(IllegalStateError::OutOfTurn { .. })
        ));
        assert!(matches!(
            world.play(PlayerPosition::North, card(Rank::Ace, Suit::Hearts)),
            Err(IllegalStateError::IllegalCard { .. })
        ));
    }

    #[test]
    fn playing_out_finishes_the_hand() {
        let mut world = two_card_world();
        while let Some(seat) = world.to_move() {
            let legal = world.legal_moves(seat).unwrap();
            let card = legal.iter().next().unwrap();
            world.play(seat, card).unwrap();
        }
        assert!(world.is_finished());
        let total: i32 = world.hand_points().iter().sum();
        assert_eq!(total, 4 + 13);
    }
}
