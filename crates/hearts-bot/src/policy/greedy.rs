//! Deterministic risk-averse play used inside playouts.

use hearts_core::belief::World;
use hearts_core::model::card::Card;
use hearts_core::model::card_set::CardSet;
use hearts_core::model::player::PlayerPosition;
use hearts_core::model::rank::Rank;
use hearts_core::model::suit::Suit;
use hearts_core::rules;
use std::cmp::Ordering;

/// Greedy choice for `seat`; `None` when the seat has nothing legal to play.
pub fn choose(world: &World, seat: PlayerPosition) -> Option<Card> {
    let legal = world.legal_moves(seat).ok()?;
    if legal.len() <= 1 {
        return legal.iter().next();
    }

    let trick = world.current_trick();
    let Some(lead) = trick.lead_suit() else {
        return choose_lead(world, seat, legal);
    };

    let following = legal.of_suit(lead);
    if following.is_empty() {
        return choose_discard(world, legal);
    }

    let high = trick
        .leading_play()
        .map(|play| play.card.rank)
        .unwrap_or(Rank::Two);
    let last_to_play = trick.len() == 3;

    // Duck with the highest card that still loses.
    if let Some(card) = best_by(following.iter().filter(|card| card.rank < high), |card| {
        card.rank as i32
    }) {
        return Some(card);
    }

    if last_to_play {
        // Taking it anyway: shed the highest card, keeping Q♠ out of it.
        best_by(following.iter(), |card| {
            if card.is_queen_of_spades() {
                -1
            } else {
                card.rank as i32
            }
        })
    } else {
        best_by(following.iter(), |card| -(card.rank as i32))
    }
}

fn choose_lead(world: &World, seat: PlayerPosition, legal: CardSet) -> Option<Card> {
    let queen_elsewhere = queen_with_opponent(world, seat);
    best_by(legal.iter(), |card| {
        let mut score = -(card.rank as i32);
        if card.is_penalty() {
            score -= 30;
        }
        if queen_elsewhere && card.suit == Suit::Spades && card.rank > Rank::Queen {
            score -= 40;
        }
        if card.is_queen_of_spades() {
            score -= 60;
        }
        score
    })
}

fn choose_discard(world: &World, legal: CardSet) -> Option<Card> {
    best_by(legal.iter(), |card| {
        let points = rules::card_points(card, world.rules());
        points * 100 + card.rank as i32
    })
}

pub(crate) fn queen_with_opponent(world: &World, seat: PlayerPosition) -> bool {
    seat.others()
        .iter()
        .any(|other| world.hand(*other).contains(Card::QUEEN_OF_SPADES))
}

/// Highest-scoring card, ties going to the canonically smaller card.
fn best_by<I, F>(cards: I, mut score: F) -> Option<Card>
where
    I: Iterator<Item = Card>,
    F: FnMut(Card) -> i32,
{
    let mut best: Option<(Card, i32)> = None;
    for card in cards {
        let value = score(card);
        match best {
            None => best = Some((card, value)),
            Some((best_card, best_value)) => {
                if value > best_value
                    || (value == best_value
                        && card.sort_key().cmp(&best_card.sort_key()) == Ordering::Less)
                {
                    best = Some((card, value));
                }
            }
        }
    }
    best.map(|(card, _)| card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearts_core::model::trick::Trick;
    use hearts_core::model::variant::RuleSet;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn world(hands: [&[Card]; 4], trick: Trick) -> World {
        World::new(
            hands.map(|cards| cards.iter().collect::<CardSet>()),
            trick,
            false,
            false,
            [CardSet::EMPTY; 4],
            [0; 4],
            RuleSet::standard(),
        )
    }

    #[test]
    fn ducks_under_the_winning_card() {
        let trick = Trick::from_plays(
            PlayerPosition::North,
            [(PlayerPosition::North, card(Rank::Ten, Suit::Diamonds))],
        )
        .unwrap();
        let w = world(
            [
                &[],
                &[
                    card(Rank::Four, Suit::Diamonds),
                    card(Rank::Nine, Suit::Diamonds),
                    card(Rank::King, Suit::Diamonds),
                ],
                &[card(Rank::Two, Suit::Clubs)],
                &[card(Rank::Three, Suit::Clubs)],
            ],
            trick,
        );
        assert_eq!(
            choose(&w, PlayerPosition::East),
            Some(card(Rank::Nine, Suit::Diamonds))
        );
    }

    #[test]
    fn void_dumps_queen_first() {
        let trick = Trick::from_plays(
            PlayerPosition::North,
            [(PlayerPosition::North, card(Rank::Ten, Suit::Diamonds))],
        )
        .unwrap();
        let w = world(
            [
                &[],
                &[
                    Card::QUEEN_OF_SPADES,
                    card(Rank::Ace, Suit::Hearts),
                    card(Rank::Ace, Suit::Clubs),
                ],
                &[card(Rank::Two, Suit::Clubs)],
                &[card(Rank::Three, Suit::Clubs)],
            ],
            trick,
        );
        assert_eq!(choose(&w, PlayerPosition::East), Some(Card::QUEEN_OF_SPADES));
    }

    #[test]
    fn leads_low_and_avoids_high_spades_when_queen_is_out() {
        let w = world(
            [
                &[
                    card(Rank::King, Suit::Spades),
                    card(Rank::Nine, Suit::Diamonds),
                    card(Rank::Two, Suit::Spades),
                ],
                &[Card::QUEEN_OF_SPADES],
                &[card(Rank::Two, Suit::Clubs)],
                &[card(Rank::Three, Suit::Clubs)],
            ],
            Trick::new(PlayerPosition::North),
        );
        assert_eq!(
            choose(&w, PlayerPosition::North),
            Some(card(Rank::Two, Suit::Spades))
        );
    }

    #[test]
    fn single_option_is_returned() {
        let w = world(
            [&[card(Rank::Five, Suit::Hearts)], &[], &[], &[]],
            Trick::new(PlayerPosition::North),
        );
        assert_eq!(
            choose(&w, PlayerPosition::North),
            Some(card(Rank::Five, Suit::Hearts))
        );
        assert_eq!(choose(&w, PlayerPosition::East), None);
    }
}
