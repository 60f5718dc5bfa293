//! Uniform world sampling under hard constraints.
//!
//! Hidden cards are dealt to the unknown opponents plus one extra holder that
//! absorbs cards played out of view. Hands must match the required sizes and
//! honour void suits. Sampling first picks how many cards of each suit every
//! holder receives, weighted by the number of deals producing that split,
//! then shuffles the cards of each suit into the chosen slots. The result is
//! uniform over all consistent deals.

use super::known::KnownState;
use super::world::World;
use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

const HOLDERS: usize = 4;
const OUT_OF_VIEW: usize = 3;
const DIM: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InconsistentStateError {
    NotEnoughUnseenCards { needed: usize, available: usize },
    OversizedHand { seat: PlayerPosition, size: usize },
    NoConsistentDeal,
}

impl fmt::Display for InconsistentStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconsistentStateError::NotEnoughUnseenCards { needed, available } => write!(
                f,
                "opponents must hold {needed} cards but only {available} are unaccounted for"
            ),
            InconsistentStateError::OversizedHand { seat, size } => {
                write!(f, "{seat} would need {size} cards")
            }
            InconsistentStateError::NoConsistentDeal => {
                write!(f, "no deal satisfies the observed voids and hand sizes")
            }
        }
    }
}

impl std::error::Error for InconsistentStateError {}

/// Precomputed counting table for one observation.
#[derive(Debug, Clone)]
pub struct Determinizer {
    known: KnownState,
    holders: [Option<PlayerPosition>; HOLDERS],
    capacity: [usize; HOLDERS],
    allowed: [[bool; 4]; HOLDERS],
    suit_cards: [Vec<Card>; 4],
    suffix: [usize; 5],
    table: Vec<f64>,
    factorial: [f64; DIM],
}

impl Determinizer {
    pub fn new(known: KnownState) -> Result<Self, InconsistentStateError> {
        let hidden: Vec<PlayerPosition> = PlayerPosition::LOOP
            .into_iter()
            .filter(|seat| known.known_hand(*seat).is_none())
            .collect();

        let mut holders = [None; HOLDERS];
        let mut capacity = [0usize; HOLDERS];
        let mut allowed = [[true; 4]; HOLDERS];
        for (slot, seat) in hidden.iter().enumerate() {
            let size = known.hand_size(*seat);
            if size >= DIM {
                return Err(InconsistentStateError::OversizedHand { seat: *seat, size });
            }
            holders[slot] = Some(*seat);
            capacity[slot] = size;
            let voids = known.void_mask(*seat);
            for suit in Suit::ALL {
                allowed[slot][suit.index()] = !voids.contains(suit);
            }
        }

        let unseen = known.unseen();
        let needed: usize = capacity[..OUT_OF_VIEW].iter().sum();
        if unseen.len() < needed {
            return Err(InconsistentStateError::NotEnoughUnseenCards {
                needed,
                available: unseen.len(),
            });
        }
        capacity[OUT_OF_VIEW] = known.out_of_view();

        let suit_cards: [Vec<Card>; 4] = Suit::ALL.map(|suit| unseen.of_suit(suit).to_vec());
        let mut suffix = [0usize; 5];
        for k in (0..4).rev() {
            suffix[k] = suffix[k + 1] + suit_cards[k].len();
        }

        let mut factorial = [1.0f64; DIM];
        for n in 1..DIM {
            factorial[n] = factorial[n - 1] * n as f64;
        }

        let mut determinizer = Self {
            known,
            holders,
            capacity,
            allowed,
            suit_cards,
            suffix,
            table: vec![0.0; 5 * DIM * DIM * DIM],
            factorial,
        };
        determinizer.fill_table();

        if determinizer.total_weight() <= 0.0 {
            return Err(InconsistentStateError::NoConsistentDeal);
        }
        Ok(determinizer)
    }

    pub fn known(&self) -> &KnownState {
        &self.known
    }

    /// Number of consistent deals, as a float.
    pub fn total_weight(&self) -> f64 {
        if self.known.is_fully_observed() {
            return 1.0;
        }
        self.table[index(0, self.capacity[0], self.capacity[1], self.capacity[2])]
    }

    pub fn sample_world<R: Rng + ?Sized>(&self, rng: &mut R) -> World {
        let mut hands = [CardSet::EMPTY; 4];
        for seat in PlayerPosition::LOOP {
            if let Some(set) = self.known.known_hand(seat) {
                hands[seat.index()] = set;
            }
        }

        let mut remaining = [self.capacity[0], self.capacity[1], self.capacity[2]];
        for k in 0..4 {
            let split = self.choose_split(k, remaining, rng);
            let mut cards = self.suit_cards[k].clone();
            cards.shuffle(rng);
            let mut dealt = cards.into_iter();
            for holder in 0..HOLDERS {
                let take = split[holder];
                let Some(seat) = self.holders[holder] else {
                    dealt.by_ref().take(take).for_each(drop);
                    continue;
                };
                let slot = &mut hands[seat.index()];
                for card in dealt.by_ref().take(take) {
                    slot.insert(card);
                }
            }
            for holder in 0..OUT_OF_VIEW {
                remaining[holder] -= split[holder];
            }
        }

        World::new(
            hands,
            self.known.current_trick().clone(),
            self.known.hearts_broken(),
            self.known.first_trick(),
            self.known.taken(),
            self.known.tricks_won(),
            self.known.rules(),
        )
        .with_scores(self.known.scores())
    }

    fn choose_split<R: Rng + ?Sized>(
        &self,
        k: usize,
        remaining: [usize; 3],
        rng: &mut R,
    ) -> [usize; HOLDERS] {
        let mut options = Vec::new();
        let mut total = 0.0;
        self.for_each_split(k, remaining, |split, weight| {
            total += weight;
            options.push((split, weight));
        });

        if options.is_empty() {
            return [0; HOLDERS];
        }
        let mut pick = rng.gen_range(0.0..total);
        for (split, weight) in &options {
            if pick < *weight {
                return *split;
            }
            pick -= weight;
        }
        options[options.len() - 1].0
    }

    fn fill_table(&mut self) {
        self.table[index(4, 0, 0, 0)] = 1.0;
        for k in (0..4).rev() {
            for r0 in 0..=self.capacity[0] {
                for r1 in 0..=self.capacity[1] {
                    for r2 in 0..=self.capacity[2] {
                        let mut sum = 0.0;
                        self.for_each_split(k, [r0, r1, r2], |_, weight| sum += weight);
                        self.table[index(k, r0, r1, r2)] = sum;
                    }
                }
            }
        }
    }

    /// Visits every feasible split of suit `k` with its weight
    /// (multinomial count times the number of completions for later suits).
    fn for_each_split<F>(&self, k: usize, remaining: [usize; 3], mut visit: F)
    where
        F: FnMut([usize; HOLDERS], f64),
    {
        let cards = self.suit_cards[k].len();
        let rest = self.suffix[k];
        let seated: usize = remaining.iter().sum();
        if seated > rest || rest - seated > self.capacity[OUT_OF_VIEW] {
            return;
        }
        let spare = rest - seated;

        let upper = |holder: usize, limit: usize| -> usize {
            if self.allowed[holder][k] {
                limit.min(cards)
            } else {
                0
            }
        };

        for a0 in 0..=upper(0, remaining[0]) {
            for a1 in 0..=upper(1, remaining[1]).min(cards - a0) {
                for a2 in 0..=upper(2, remaining[2]).min(cards - a0 - a1) {
                    let a3 = cards - a0 - a1 - a2;
                    if a3 > spare {
                        continue;
                    }
                    let later = self.table[index(
                        k + 1,
                        remaining[0] - a0,
                        remaining[1] - a1,
                        remaining[2] - a2,
                    )];
                    if later <= 0.0 {
                        continue;
                    }
                    let ways = self.factorial[cards]
                        / (self.factorial[a0]
                            * self.factorial[a1]
                            * self.factorial[a2]
                            * self.factorial[a3]);
                    visit([a0, a1, a2, a3], ways * later);
                }
            }
        }
    }
}

fn index(k: usize, r0: usize, r1: usize, r2: usize) -> usize {
    ((k * DIM + r0) * DIM + r1) * DIM + r2
}

/// Builds a determinizer for one draw.
pub fn sample_world<R: Rng + ?Sized>(
    known: &KnownState,
    rng: &mut R,
) -> Result<World, InconsistentStateError> {
    Ok(Determinizer::new(known.clone())?.sample_world(rng))
}
