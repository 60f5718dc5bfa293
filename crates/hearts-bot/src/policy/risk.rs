use super::greedy::queen_with_opponent;
use hearts_core::belief::World;
use hearts_core::model::card::Card;
use hearts_core::model::player::PlayerPosition;
use hearts_core::model::rank::Rank;
use hearts_core::model::suit::Suit;

/// Match ends once any seat reaches this total.
pub const MATCH_LIMIT: f64 = 100.0;

const QUEEN_LEAD_PENALTY: f64 = 13.0;
const QUEEN_EXPOSED_PENALTY: f64 = 6.0;
const HIGH_SPADE_LEAD_PENALTY: f64 = 4.0;
const EARLY_HEART_PENALTY: f64 = 2.0;

/// Heuristic cost of `candidate` beyond the points the trick itself shows.
pub fn safety_penalty(world: &World, seat: PlayerPosition, candidate: Card) -> f64 {
    let trick = world.current_trick();
    let mut penalty = 0.0;

    if candidate.is_queen_of_spades() {
        match trick.lead_suit() {
            None => penalty += QUEEN_LEAD_PENALTY,
            Some(Suit::Spades) => {
                let beaten = trick
                    .plays()
                    .iter()
                    .any(|play| play.card.suit == Suit::Spades && play.card.rank > Rank::Queen);
                // Someone after us may still cover it; last to play wins for sure.
                if !beaten && trick.len() < 3 {
                    penalty += QUEEN_EXPOSED_PENALTY;
                }
            }
            Some(_) => {}
        }
    }

    if trick.is_empty()
        && candidate.suit == Suit::Spades
        && candidate.rank > Rank::Queen
        && queen_with_opponent(world, seat)
    {
        penalty += HIGH_SPADE_LEAD_PENALTY;
    }

    if candidate.suit == Suit::Hearts && !world.hearts_broken() {
        let remaining = world.hand(seat).len() as f64;
        penalty += EARLY_HEART_PENALTY * remaining / 13.0;
    }

    penalty
}

/// Estimated probability that `seat` eventually wins the match.
///
/// Once anyone reaches `limit` the lowest total wins outright (ties split).
/// Otherwise each seat's share is its distance to the limit over the sum of
/// all distances.
pub fn match_equity(scores: &[f64; 4], limit: f64, seat: PlayerPosition) -> f64 {
    let own = scores[seat.index()];
    if scores.iter().any(|&score| score >= limit) {
        let lowest = scores.iter().copied().fold(f64::INFINITY, f64::min);
        if own > lowest {
            return 0.0;
        }
        let leaders = scores.iter().filter(|&&score| score == lowest).count();
        return 1.0 / leaders as f64;
    }
    let total: f64 = scores.iter().map(|score| limit - score).sum();
    if total <= 0.0 {
        return 0.25;
    }
    (limit - own) / total
}
