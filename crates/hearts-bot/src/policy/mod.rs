mod greedy;
mod risk;

pub use risk::{MATCH_LIMIT, match_equity, safety_penalty};

use hearts_core::belief::World;
use hearts_core::model::card::Card;
use hearts_core::model::player::PlayerPosition;
use hearts_core::rules::IllegalStateError;
use rand::Rng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weight of the match-equity term in `Global3`, in hand points per unit of equity.
const EQUITY_WEIGHT: f64 = 26.0;

/// Policy used to score a candidate move inside one sampled world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Simple,
    #[default]
    SafeSimple,
    Global,
    Global2,
    Global3,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::Simple,
        PolicyKind::SafeSimple,
        PolicyKind::Global,
        PolicyKind::Global2,
        PolicyKind::Global3,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Simple => "simple",
            PolicyKind::SafeSimple => "safe_simple",
            PolicyKind::Global => "global",
            PolicyKind::Global2 => "global2",
            PolicyKind::Global3 => "global3",
        }
    }

    /// Value of `candidate` for `seat` in `world`; higher is better.
    pub fn evaluate<R: Rng + ?Sized>(
        self,
        world: &World,
        seat: PlayerPosition,
        candidate: Card,
        playout: &mut Playout<'_, R>,
    ) -> Result<f64, IllegalStateError> {
        let mut sim = world.clone();
        sim.play(seat, candidate)?;

        let value = match self {
            PolicyKind::Simple | PolicyKind::SafeSimple => {
                let before = world.taken_points(seat);
                finish_trick(&mut sim, seat, playout)?;
                -f64::from(sim.taken_points(seat) - before)
            }
            PolicyKind::Global | PolicyKind::Global2 | PolicyKind::Global3 => {
                finish_hand(&mut sim, seat, playout)?;
                let points = sim.hand_points();
                let own = f64::from(points[seat.index()]);
                if self == PolicyKind::Global {
                    -own
                } else {
                    let others: f64 = seat
                        .others()
                        .iter()
                        .map(|other| f64::from(points[other.index()]))
                        .sum();
                    let relative = others / 3.0 - own;
                    if self == PolicyKind::Global2 {
                        relative
                    } else {
                        let mut projected = world.scores();
                        for (slot, gained) in projected.iter_mut().zip(points) {
                            *slot += f64::from(gained);
                        }
                        relative + EQUITY_WEIGHT * match_equity(&projected, MATCH_LIMIT, seat)
                    }
                }
            }
        };

        let penalty = match self {
            PolicyKind::SafeSimple | PolicyKind::Global3 => safety_penalty(world, seat, candidate),
            _ => 0.0,
        };
        Ok(value - penalty)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = PolicyKind::ALL.iter().map(|kind| kind.as_str()).collect();
        write!(
            f,
            "unknown player_type '{}' (expected one of {})",
            self.0,
            names.join(", ")
        )
    }
}

impl std::error::Error for UnknownPolicy {}

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| UnknownPolicy(value.to_string()))
    }
}

/// Playout scratch state: opponent noise and the generator that drives it.
pub struct Playout<'a, R: Rng + ?Sized> {
    pub epsilon: f64,
    pub rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> Playout<'a, R> {
    pub fn new(epsilon: f64, rng: &'a mut R) -> Self {
        Self { epsilon, rng }
    }

    /// Greedy move, replaced by a uniformly random legal card for opponents with
    /// probability `epsilon`.
    fn pick(
        &mut self,
        world: &World,
        seat: PlayerPosition,
        perspective: PlayerPosition,
    ) -> Result<Option<Card>, IllegalStateError> {
        if seat != perspective && self.epsilon > 0.0 && self.rng.gen_bool(self.epsilon.min(1.0)) {
            let legal = world.legal_moves(seat)?;
            return Ok(legal.iter().choose(&mut *self.rng));
        }
        Ok(greedy::choose(world, seat))
    }
}

fn finish_trick<R: Rng + ?Sized>(
    world: &mut World,
    perspective: PlayerPosition,
    playout: &mut Playout<'_, R>,
) -> Result<(), IllegalStateError> {
    while !world.current_trick().is_empty() {
        if !step(world, perspective, playout)? {
            break;
        }
    }
    Ok(())
}

fn finish_hand<R: Rng + ?Sized>(
    world: &mut World,
    perspective: PlayerPosition,
    playout: &mut Playout<'_, R>,
) -> Result<(), IllegalStateError> {
    while step(world, perspective, playout)? {}
    Ok(())
}

fn step<R: Rng + ?Sized>(
    world: &mut World,
    perspective: PlayerPosition,
    playout: &mut Playout<'_, R>,
) -> Result<bool, IllegalStateError> {
    let Some(seat) = world.to_move() else {
        return Ok(false);
    };
    let Some(card) = playout.pick(world, seat, perspective)? else {
        return Ok(false);
    };
    world.play(seat, card)?;
    Ok(true)
}
