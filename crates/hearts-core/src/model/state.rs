//! Read-only snapshot of a hand in progress, as seen by the seat to act.

use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::hand::Hand;
use crate::model::passing::PassDirection;
use crate::model::player::PlayerPosition;
use crate::model::trick::Trick;
use crate::model::variant::RuleSet;
use crate::rules;
use std::fmt;

const CARDS_PER_HAND: usize = 13;

#[derive(Debug, Clone)]
pub struct GameState {
    acting: PlayerPosition,
    hand: Hand,
    other_hands: [Option<Hand>; 4],
    current_trick: Trick,
    trick_history: Vec<Trick>,
    taken: [CardSet; 4],
    scores: [f64; 4],
    hearts_broken: bool,
    pass_direction: PassDirection,
    rules: RuleSet,
}

impl GameState {
    /// Fresh state with an empty current trick led by `acting` and the standard rules.
    pub fn new(acting: PlayerPosition, hand: Hand) -> Self {
        Self {
            acting,
            hand,
            other_hands: [None, None, None, None],
            current_trick: Trick::new(acting),
            trick_history: Vec::new(),
            taken: [CardSet::EMPTY; 4],
            scores: [0.0; 4],
            hearts_broken: false,
            pass_direction: PassDirection::Hold,
            rules: RuleSet::standard(),
        }
    }

    pub fn with_current_trick(mut self, trick: Trick) -> Self {
        self.current_trick = trick;
        self
    }

    pub fn with_history(mut self, history: Vec<Trick>) -> Self {
        self.trick_history = history;
        self
    }

    pub fn with_taken(mut self, taken: [CardSet; 4]) -> Self {
        self.taken = taken;
        self
    }

    pub fn with_scores(mut self, scores: [f64; 4]) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_hearts_broken(mut self, broken: bool) -> Self {
        self.hearts_broken = broken;
        self
    }

    pub fn with_pass_direction(mut self, direction: PassDirection) -> Self {
        self.pass_direction = direction;
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Records a fully observed hand for `seat`. Supplying the acting seat replaces its hand.
    pub fn with_known_hand(mut self, seat: PlayerPosition, hand: Hand) -> Self {
        if seat == self.acting {
            self.hand = hand;
        } else {
            self.other_hands[seat.index()] = Some(hand);
        }
        self
    }

    pub fn acting(&self) -> PlayerPosition {
        self.acting
    }

    pub fn acting_hand(&self) -> &Hand {
        &self.hand
    }

    pub fn hand(&self, seat: PlayerPosition) -> Option<&Hand> {
        if seat == self.acting {
            Some(&self.hand)
        } else {
            self.other_hands[seat.index()].as_ref()
        }
    }

    /// True when every seat's hand is known (multi-hand observation mode).
    pub fn is_fully_observed(&self) -> bool {
        PlayerPosition::LOOP
            .iter()
            .all(|seat| self.hand(*seat).is_some())
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn trick_history(&self) -> &[Trick] {
        &self.trick_history
    }

    pub fn taken(&self, seat: PlayerPosition) -> CardSet {
        self.taken[seat.index()]
    }

    pub fn scores(&self) -> [f64; 4] {
        self.scores
    }

    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    pub fn pass_direction(&self) -> PassDirection {
        self.pass_direction
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Trick one: nothing recorded as played or won and the acting seat still holds a full hand.
    pub fn is_first_trick(&self) -> bool {
        self.trick_history.is_empty()
            && self.taken.iter().all(|set| set.is_empty())
            && self.hand.len() == CARDS_PER_HAND
    }

    /// Every card known to have left a hand: history, current trick and won cards.
    pub fn played_cards(&self) -> CardSet {
        let mut played: CardSet = self
            .trick_history
            .iter()
            .flat_map(|trick| trick.cards())
            .collect();
        played = played.union(self.current_trick.cards().collect());
        for set in self.taken {
            played = played.union(set);
        }
        played
    }

    /// Input flag, or any played card that breaks hearts under the active rules.
    pub fn effective_hearts_broken(&self) -> bool {
        self.hearts_broken
            || self
                .played_cards()
                .iter()
                .any(|card| rules::card_breaks_hearts(card, self.rules))
    }

    pub fn validate(&self) -> Result<(), StateError> {
        let unknown = self.rules.unknown_bits();
        if unknown != 0 {
            return Err(StateError::UnknownRuleBits(unknown));
        }

        let mut in_hands = CardSet::EMPTY;
        for seat in PlayerPosition::LOOP {
            let Some(hand) = self.hand(seat) else {
                continue;
            };
            if let Some(card) = hand.duplicate() {
                return Err(StateError::DuplicateCard(card));
            }
            for &card in hand.cards() {
                if !in_hands.insert(card) {
                    return Err(StateError::DuplicateCard(card));
                }
            }
        }

        let mut in_history = CardSet::EMPTY;
        let mut history_winner: [Option<PlayerPosition>; 52] = [None; 52];
        let mut previous_winner: Option<PlayerPosition> = None;
        for (index, trick) in self.trick_history.iter().enumerate() {
            let winner = trick
                .winner()
                .ok_or(StateError::IncompleteHistoryTrick { index })?;
            if let Some(expected) = previous_winner {
                if trick.leader() != expected {
                    return Err(StateError::HistoryLeaderMismatch {
                        index,
                        expected,
                        actual: trick.leader(),
                    });
                }
            }
            previous_winner = Some(winner);
            for card in trick.cards() {
                if in_hands.contains(card) || !in_history.insert(card) {
                    return Err(StateError::DuplicateCard(card));
                }
                history_winner[card.to_id() as usize] = Some(winner);
            }
        }

        let expected = self
            .current_trick
            .next_to_play()
            .ok_or(StateError::CurrentTrickComplete)?;
        if expected != self.acting {
            return Err(StateError::NotActingTurn {
                expected,
                acting: self.acting,
            });
        }
        let mut in_current = CardSet::EMPTY;
        for card in self.current_trick.cards() {
            if in_hands.contains(card) || in_history.contains(card) || !in_current.insert(card) {
                return Err(StateError::DuplicateCard(card));
            }
        }

        let mut in_taken = CardSet::EMPTY;
        for seat in PlayerPosition::LOOP {
            for card in self.taken[seat.index()] {
                if in_hands.contains(card) || in_current.contains(card) || !in_taken.insert(card)
                {
                    return Err(StateError::DuplicateCard(card));
                }
                if let Some(winner) = history_winner[card.to_id() as usize] {
                    if winner != seat {
                        return Err(StateError::TakenByWrongSeat {
                            card,
                            recorded: seat,
                            winner,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    DuplicateCard(Card),
    IncompleteHistoryTrick {
        index: usize,
    },
    HistoryLeaderMismatch {
        index: usize,
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    CurrentTrickComplete,
    NotActingTurn {
        expected: PlayerPosition,
        acting: PlayerPosition,
    },
    TakenByWrongSeat {
        card: Card,
        recorded: PlayerPosition,
        winner: PlayerPosition,
    },
    UnknownRuleBits(u32),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::DuplicateCard(card) => write!(f, "card {card} appears more than once"),
            StateError::IncompleteHistoryTrick { index } => {
                write!(f, "trick_history[{index}] does not contain four plays")
            }
            StateError::HistoryLeaderMismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "trick_history[{index}] led by {actual}, but the previous trick went to {expected}"
            ),
            StateError::CurrentTrickComplete => {
                write!(f, "current trick already holds four cards")
            }
            StateError::NotActingTurn { expected, acting } => {
                write!(f, "current trick expects {expected} to play, not {acting}")
            }
            StateError::TakenByWrongSeat {
                card,
                recorded,
                winner,
            } => write!(
                f,
                "card {card} recorded as won by {recorded} but its trick went to {winner}"
            ),
            StateError::UnknownRuleBits(bits) => write!(f, "unknown rule bits {bits:#x}"),
        }
    }
}

impl std::error::Error for StateError {}

#[cfg(test)]
mod tests {
    use super::{GameState, StateError};
    use crate::model::card::Card;
    use crate::model::card_set::CardSet;
    use crate::model::hand::Hand;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::model::trick::Trick;
    use crate::model::variant::RuleSet;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn club_trick(leader: PlayerPosition, ranks: [Rank; 4]) -> Trick {
        let plays = (0..4).map(|step| (leader.advance(step), card(ranks[step], Suit::Clubs)));
        Trick::from_plays(leader, plays).unwrap()
    }

    #[test]
    fn fresh_state_is_first_trick_with_full_hand() {
        let hand: Vec<Card> = Rank::ORDERED.iter().map(|r| card(*r, Suit::Spades)).collect();
        let state = GameState::new(PlayerPosition::North, Hand::with_cards(hand));
        assert!(state.is_first_trick());
        assert!(state.validate().is_ok());
        assert!(!state.effective_hearts_broken());
    }

    #[test]
    fn short_hand_without_history_is_not_first_trick() {
        let state = GameState::new(
            PlayerPosition::North,
            Hand::with_cards(vec![card(Rank::Five, Suit::Clubs)]),
        );
        assert!(!state.is_first_trick());
    }

    #[test]
    fn duplicate_between_hand_and_trick_is_rejected() {
        let trick = Trick::from_plays(
            PlayerPosition::West,
            [(PlayerPosition::West, Card::TWO_OF_CLUBS)],
        )
        .unwrap();
        let state = GameState::new(
            PlayerPosition::North,
            Hand::with_cards(vec![Card::TWO_OF_CLUBS]),
        )
        .with_current_trick(trick);
        assert_eq!(
            state.validate(),
            Err(StateError::DuplicateCard(Card::TWO_OF_CLUBS))
        );
    }

    #[test]
    fn acting_seat_must_be_next_in_trick() {
        let trick = Trick::from_plays(
            PlayerPosition::East,
            [(PlayerPosition::East, card(Rank::Nine, Suit::Clubs))],
        )
        .unwrap();
        let state = GameState::new(
            PlayerPosition::North,
            Hand::with_cards(vec![card(Rank::Five, Suit::Clubs)]),
        )
        .with_current_trick(trick);
        assert!(matches!(
            state.validate(),
            Err(StateError::NotActingTurn {
                expected: PlayerPosition::South,
                ..
            })
        ));
    }

    #[test]
    fn incomplete_history_trick_is_rejected() {
        let partial = Trick::from_plays(
            PlayerPosition::North,
            [(PlayerPosition::North, card(Rank::Three, Suit::Clubs))],
        )
        .unwrap();
        let state = GameState::new(
            PlayerPosition::North,
            Hand::with_cards(vec![card(Rank::Five, Suit::Diamonds)]),
        )
        .with_history(vec![partial]);
        assert_eq!(
            state.validate(),
            Err(StateError::IncompleteHistoryTrick { index: 0 })
        );
    }

    #[test]
    fn history_tricks_are_led_by_the_previous_winner() {
        // North wins the first trick with the ace.
        let first = club_trick(
            PlayerPosition::North,
            [Rank::Ace, Rank::Two, Rank::Three, Rank::Four],
        );
        let wrong_leader = club_trick(
            PlayerPosition::East,
            [Rank::Five, Rank::Six, Rank::Seven, Rank::Eight],
        );
        let acting_hand = Hand::with_cards(vec![card(Rank::King, Suit::Hearts)]);
        let state = GameState::new(PlayerPosition::North, acting_hand.clone())
            .with_history(vec![first.clone(), wrong_leader]);
        assert_eq!(
            state.validate(),
            Err(StateError::HistoryLeaderMismatch {
                index: 1,
                expected: PlayerPosition::North,
                actual: PlayerPosition::East,
            })
        );

        let right_leader = club_trick(
            PlayerPosition::North,
            [Rank::Five, Rank::Six, Rank::Seven, Rank::Eight],
        );
        let state = GameState::new(PlayerPosition::North, acting_hand)
            .with_history(vec![first, right_leader]);
        assert_eq!(state.validate(), Ok(()));
    }

    #[test]
    fn taken_cards_must_match_history_winner() {
        let trick = club_trick(
            PlayerPosition::North,
            [Rank::Two, Rank::Ace, Rank::Three, Rank::Four],
        );
        let mut taken = [CardSet::EMPTY; 4];
        taken[PlayerPosition::East.index()] = trick.cards().collect();
        let base = GameState::new(
            PlayerPosition::East,
            Hand::with_cards(vec![card(Rank::Five, Suit::Diamonds)]),
        )
        .with_current_trick(Trick::new(PlayerPosition::East))
        .with_history(vec![trick.clone()]);
        assert!(base.clone().with_taken(taken).validate().is_ok());

        let mut wrong = [CardSet::EMPTY; 4];
        wrong[PlayerPosition::South.index()] = trick.cards().collect();
        assert!(matches!(
            base.with_taken(wrong).validate(),
            Err(StateError::TakenByWrongSeat { .. })
        ));
    }

    #[test]
    fn unknown_rule_bits_fail_validation() {
        let state = GameState::new(
            PlayerPosition::North,
            Hand::with_cards(vec![card(Rank::Five, Suit::Clubs)]),
        )
        .with_rules(RuleSet::from_bits(0x8000));
        assert_eq!(state.validate(), Err(StateError::UnknownRuleBits(0x8000)));
    }

    #[test]
    fn queen_in_history_breaks_hearts_under_standard_rules() {
        let trick = Trick::from_plays(
            PlayerPosition::North,
            [
                (PlayerPosition::North, card(Rank::Two, Suit::Diamonds)),
                (PlayerPosition::East, Card::QUEEN_OF_SPADES),
                (PlayerPosition::South, card(Rank::Three, Suit::Diamonds)),
                (PlayerPosition::West, card(Rank::Four, Suit::Diamonds)),
            ],
        )
        .unwrap();
        let state = GameState::new(
            PlayerPosition::West,
            Hand::with_cards(vec![card(Rank::Five, Suit::Hearts)]),
        )
        .with_current_trick(Trick::new(PlayerPosition::West))
        .with_history(vec![trick]);
        assert!(state.effective_hearts_broken());
        assert!(
            !state
                .clone()
                .with_rules(RuleSet::standard().with(RuleSet::QUEEN_BREAKS_HEARTS, false))
                .effective_hearts_broken()
        );
    }
}
