//! Legality, trick resolution and scoring for a single hand of Hearts.

use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use crate::model::variant::RuleSet;
use std::fmt;

const HEART_POINTS: i32 = 1;
const QUEEN_POINTS: i32 = 13;
const JACK_POINTS: i32 = -10;
const NO_TRICK_POINTS: i32 = -5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IllegalStateError {
    EmptyHand,
    TrickComplete,
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    IllegalCard {
        seat: PlayerPosition,
        card: Card,
    },
}

impl fmt::Display for IllegalStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalStateError::EmptyHand => write!(f, "hand holds no cards"),
            IllegalStateError::TrickComplete => write!(f, "trick already has four cards"),
            IllegalStateError::OutOfTurn { expected, actual } => {
                write!(f, "{actual} played but {expected} was to move")
            }
            IllegalStateError::IllegalCard { seat, card } => {
                write!(f, "{card} is not a legal play for {seat}")
            }
        }
    }
}

impl std::error::Error for IllegalStateError {}

/// Cards `hand` may play into `trick`, in canonical order.
pub fn legal_moves(
    hand: &Hand,
    trick: &Trick,
    hearts_broken: bool,
    is_first_trick: bool,
    rules: RuleSet,
) -> Result<Vec<Card>, IllegalStateError> {
    Ok(legal_set(hand.to_set(), trick, hearts_broken, is_first_trick, rules)?.to_vec())
}

pub fn legal_moves_standard(
    hand: &Hand,
    trick: &Trick,
    hearts_broken: bool,
    is_first_trick: bool,
) -> Result<Vec<Card>, IllegalStateError> {
    legal_moves(hand, trick, hearts_broken, is_first_trick, RuleSet::standard())
}

/// Set form of [`legal_moves`], used on the playout hot path.
pub fn legal_set(
    hand: CardSet,
    trick: &Trick,
    hearts_broken: bool,
    is_first_trick: bool,
    rules: RuleSet,
) -> Result<CardSet, IllegalStateError> {
    if hand.is_empty() {
        return Err(IllegalStateError::EmptyHand);
    }
    if trick.is_complete() {
        return Err(IllegalStateError::TrickComplete);
    }

    if let Some(lead) = trick.lead_suit() {
        let follow = hand.of_suit(lead);
        if !follow.is_empty() {
            return Ok(follow);
        }
        if is_first_trick {
            return Ok(first_trick_filter(hand, rules));
        }
        return Ok(hand);
    }

    if is_first_trick {
        if hand.contains(Card::TWO_OF_CLUBS) {
            let mut only = CardSet::EMPTY;
            only.insert(Card::TWO_OF_CLUBS);
            return Ok(only);
        }
        let clubs = hand.of_suit(Suit::Clubs);
        if rules.has(RuleSet::LEAD_CLUBS) && !clubs.is_empty() {
            return Ok(clubs);
        }
        return Ok(lead_filter(first_trick_filter(hand, rules), hearts_broken));
    }

    Ok(lead_filter(hand, hearts_broken))
}

/// Hearts stay out of a lead until broken, whatever the rule bits say, unless nothing else is held.
fn lead_filter(hand: CardSet, hearts_broken: bool) -> CardSet {
    if hearts_broken {
        return hand;
    }
    let non_hearts = hand.difference(hand.of_suit(Suit::Hearts));
    if non_hearts.is_empty() { hand } else { non_hearts }
}

/// Drops Q♠ then hearts on trick one, each only while something playable remains.
fn first_trick_filter(hand: CardSet, rules: RuleSet) -> CardSet {
    let mut allowed = hand;
    if rules.has(RuleSet::NO_QUEEN_FIRST_TRICK) && allowed.contains(Card::QUEEN_OF_SPADES) {
        let mut without = allowed;
        without.remove(Card::QUEEN_OF_SPADES);
        if !without.is_empty() {
            allowed = without;
        }
    }
    if rules.has(RuleSet::NO_HEARTS_FIRST_TRICK) {
        let without = allowed.difference(allowed.of_suit(Suit::Hearts));
        if !without.is_empty() {
            allowed = without;
        }
    }
    allowed
}

pub fn trick_winner(trick: &Trick) -> Option<PlayerPosition> {
    trick.winner()
}

/// Q♠ always carries 13; clients sending a bare `0` mask still count it.
pub fn card_points(card: Card, rules: RuleSet) -> i32 {
    if card.suit == Suit::Hearts {
        HEART_POINTS
    } else if card.is_queen_of_spades() {
        QUEEN_POINTS
    } else if card.is_jack_of_diamonds() && rules.has(RuleSet::JACK_BONUS) {
        JACK_POINTS
    } else {
        0
    }
}

/// Points awarded per seat for a finished trick; all zero while it is incomplete.
pub fn score_trick(trick: &Trick, rules: RuleSet) -> [i32; 4] {
    let mut points = [0; 4];
    if let Some(winner) = trick.winner() {
        points[winner.index()] = trick.cards().map(|card| card_points(card, rules)).sum();
    }
    points
}

pub fn card_breaks_hearts(card: Card, rules: RuleSet) -> bool {
    card.suit == Suit::Hearts
        || (card.is_queen_of_spades() && rules.has(RuleSet::QUEEN_BREAKS_HEARTS))
}

pub fn updates_hearts_broken(trick: &Trick, previous: bool, rules: RuleSet) -> bool {
    previous || trick.cards().any(|card| card_breaks_hearts(card, rules))
}

/// End-of-hand totals from the cards each seat won, applying shoot-the-moon and
/// the no-trick bonus.
pub fn hand_points(taken: &[CardSet; 4], tricks_won: &[u8; 4], rules: RuleSet) -> [i32; 4] {
    let penalty = |set: CardSet| -> i32 {
        let hearts = set.count_suit(Suit::Hearts) as i32 * HEART_POINTS;
        let queen = if set.contains(Card::QUEEN_OF_SPADES) {
            QUEEN_POINTS
        } else {
            0
        };
        hearts + queen
    };
    let bonus = |set: CardSet| -> i32 {
        if rules.has(RuleSet::JACK_BONUS) && set.contains(Card::JACK_OF_DIAMONDS) {
            JACK_POINTS
        } else {
            0
        }
    };

    let moon_total = 13 * HEART_POINTS + QUEEN_POINTS;
    let shooter = PlayerPosition::LOOP
        .into_iter()
        .find(|seat| penalty(taken[seat.index()]) == moon_total);

    let mut points = [0; 4];
    for seat in PlayerPosition::LOOP {
        let set = taken[seat.index()];
        let base = match shooter {
            Some(moon) if moon == seat => 0,
            Some(_) => moon_total,
            None => penalty(set),
        };
        let mut total = base + bonus(set);
        if rules.has(RuleSet::NO_TRICK_BONUS) && tricks_won[seat.index()] == 0 {
            total += NO_TRICK_POINTS;
        }
        points[seat.index()] = total;
    }
    points
}
