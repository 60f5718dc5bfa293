//! Determinized Monte Carlo evaluation of the acting seat's legal moves.
//!
//! Each world task samples one deal consistent with the observation and runs
//! its share of the simulation budget on it, scoring every candidate once per
//! simulation. Tasks are seeded up front so threaded and sequential runs agree.

use crate::policy::{Playout, PolicyKind};
use hearts_core::belief::{Determinizer, InconsistentStateError, KnownState};
use hearts_core::model::card::Card;
use hearts_core::model::player::PlayerPosition;
use hearts_core::model::state::GameState;
use hearts_core::rules::{self, IllegalStateError};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub simulations: usize,
    pub worlds: usize,
    pub use_threads: bool,
    pub policy: PolicyKind,
    pub playout_epsilon: f64,
    /// Worker cap for threaded mode; defaults to the available parallelism.
    pub threads: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: 1000,
            worlds: 30,
            use_threads: true,
            policy: PolicyKind::default(),
            playout_epsilon: 0.0,
            threads: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("inconsistent observation: {0}")]
    Inconsistent(#[from] InconsistentStateError),
    #[error("illegal position: {0}")]
    Illegal(#[from] IllegalStateError),
    #[error("search needs at least one world")]
    EmptyBudget,
    #[error("{requested} asked to act but the state belongs to {acting}")]
    NotActing {
        requested: PlayerPosition,
        acting: PlayerPosition,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateStats {
    pub card: Card,
    pub total: f64,
    pub samples: u64,
}

impl CandidateStats {
    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            f64::NEG_INFINITY
        } else {
            self.total / self.samples as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveStatistics {
    candidates: Vec<CandidateStats>,
    worlds: usize,
}

impl MoveStatistics {
    fn new(cards: &[Card]) -> Self {
        Self {
            candidates: cards
                .iter()
                .map(|&card| CandidateStats {
                    card,
                    total: 0.0,
                    samples: 0,
                })
                .collect(),
            worlds: 0,
        }
    }

    /// Candidates in canonical card order.
    pub fn candidates(&self) -> &[CandidateStats] {
        &self.candidates
    }

    pub fn get(&self, card: Card) -> Option<&CandidateStats> {
        self.candidates.iter().find(|stats| stats.card == card)
    }

    /// Number of sampled worlds merged into these totals.
    pub fn worlds(&self) -> usize {
        self.worlds
    }

    pub fn simulations(&self) -> u64 {
        self.candidates.first().map_or(0, |stats| stats.samples)
    }

    /// Highest mean; the canonically smaller card wins ties.
    pub fn best(&self) -> Option<&CandidateStats> {
        let mut best: Option<&CandidateStats> = None;
        for stats in &self.candidates {
            match best {
                Some(current) if stats.mean() <= current.mean() => {}
                _ => best = Some(stats),
            }
        }
        best
    }

    fn absorb(&mut self, partial: &WorldResult) {
        for (stats, total) in self.candidates.iter_mut().zip(&partial.totals) {
            stats.total += total;
            stats.samples += partial.simulations;
        }
        self.worlds += 1;
    }
}

#[derive(Debug, Clone, Copy)]
struct WorldTask {
    index: usize,
    seed: u64,
    simulations: u64,
}

#[derive(Debug)]
struct WorldResult {
    index: usize,
    totals: Vec<f64>,
    simulations: u64,
}

/// Simulation count for each world: an even split, remainder to the first
/// worlds. Worlds beyond the simulation budget are dropped so the total
/// never exceeds `simulations` (a zero budget still runs one simulation).
fn split_budget(simulations: usize, worlds: usize) -> Vec<u64> {
    let worlds = worlds.min(simulations.max(1));
    let base = simulations / worlds;
    let remainder = simulations % worlds;
    (0..worlds)
        .map(|index| {
            let share = base + usize::from(index < remainder);
            share.max(1) as u64
        })
        .collect()
}

pub fn search<R: Rng + ?Sized>(
    state: &GameState,
    acting: PlayerPosition,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<MoveStatistics, SearchError> {
    if config.worlds == 0 {
        return Err(SearchError::EmptyBudget);
    }
    if state.acting() != acting {
        return Err(SearchError::NotActing {
            requested: acting,
            acting: state.acting(),
        });
    }

    let candidates = rules::legal_moves(
        state.acting_hand(),
        state.current_trick(),
        state.effective_hearts_broken(),
        state.is_first_trick(),
        state.rules(),
    )?;
    let determinizer = Determinizer::new(KnownState::from_game(state))?;

    let tasks: Vec<WorldTask> = split_budget(config.simulations, config.worlds)
        .into_iter()
        .enumerate()
        .map(|(index, simulations)| WorldTask {
            index,
            seed: rng.next_u64(),
            simulations,
        })
        .collect();

    let workers = worker_count(config, tasks.len());
    let mut results = if workers > 1 {
        run_threaded(&determinizer, acting, &candidates, config, tasks, workers)?
    } else {
        tasks
            .into_iter()
            .map(|task| run_world(&determinizer, acting, &candidates, config, task))
            .collect::<Result<Vec<_>, _>>()?
    };
    results.sort_by_key(|result| result.index);

    let mut statistics = MoveStatistics::new(&candidates);
    for result in &results {
        statistics.absorb(result);
    }

    log_search(acting, config, workers, &statistics);
    Ok(statistics)
}

fn worker_count(config: &SearchConfig, tasks: usize) -> usize {
    if !config.use_threads {
        return 1;
    }
    let available = config.threads.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(1)
    });
    available.clamp(1, tasks.max(1))
}

fn run_world(
    determinizer: &Determinizer,
    acting: PlayerPosition,
    candidates: &[Card],
    config: &SearchConfig,
    task: WorldTask,
) -> Result<WorldResult, IllegalStateError> {
    let mut rng = StdRng::seed_from_u64(task.seed);
    let world = determinizer.sample_world(&mut rng);
    let mut totals = vec![0.0; candidates.len()];
    let mut playout = Playout::new(config.playout_epsilon, &mut rng);
    for _ in 0..task.simulations {
        for (total, &card) in totals.iter_mut().zip(candidates) {
            *total += config.policy.evaluate(&world, acting, card, &mut playout)?;
        }
    }
    Ok(WorldResult {
        index: task.index,
        totals,
        simulations: task.simulations,
    })
}

fn run_threaded(
    determinizer: &Determinizer,
    acting: PlayerPosition,
    candidates: &[Card],
    config: &SearchConfig,
    tasks: Vec<WorldTask>,
    workers: usize,
) -> Result<Vec<WorldResult>, IllegalStateError> {
    let expected = tasks.len();
    let (task_tx, task_rx) = mpsc::channel::<WorldTask>();
    for task in tasks {
        // Receiver is alive until the scope below ends.
        let _ = task_tx.send(task);
    }
    drop(task_tx);
    let task_rx = Mutex::new(task_rx);
    let (result_tx, result_rx) = mpsc::channel::<Result<WorldResult, IllegalStateError>>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let result_tx = result_tx.clone();
            let task_rx = &task_rx;
            scope.spawn(move || {
                loop {
                    let next = task_rx.lock().recv();
                    let Ok(task) = next else {
                        break;
                    };
                    let outcome = run_world(determinizer, acting, candidates, config, task);
                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut results = Vec::with_capacity(expected);
    for outcome in result_rx {
        results.push(outcome?);
    }
    Ok(results)
}

fn log_search(
    acting: PlayerPosition,
    config: &SearchConfig,
    workers: usize,
    statistics: &MoveStatistics,
) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let best = statistics
        .best()
        .map(|stats| format!("{}:{:.3}", stats.card, stats.mean()))
        .unwrap_or_default();
    event!(
        target: "hearts_bot::search",
        Level::DEBUG,
        seat = ?acting,
        policy = %config.policy,
        worlds = statistics.worlds(),
        simulations = statistics.simulations(),
        candidates = statistics.candidates().len(),
        workers,
        best = %best,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearts_core::model::card_set::CardSet;
    use hearts_core::model::hand::Hand;
    use hearts_core::model::rank::Rank;
    use hearts_core::model::suit::Suit;
    use hearts_core::model::trick::Trick;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    /// Second trick: West has sloughed a heart and North can duck or overtake.
    fn mid_hand_state() -> GameState {
        let history = vec![
            Trick::from_plays(
                PlayerPosition::North,
                [
                    (PlayerPosition::North, card(Rank::Two, Suit::Clubs)),
                    (PlayerPosition::East, card(Rank::Ace, Suit::Clubs)),
                    (PlayerPosition::South, card(Rank::Five, Suit::Clubs)),
                    (PlayerPosition::West, card(Rank::Six, Suit::Clubs)),
                ],
            )
            .unwrap(),
        ];
        let trick = Trick::from_plays(
            PlayerPosition::East,
            [
                (PlayerPosition::East, card(Rank::Ten, Suit::Diamonds)),
                (PlayerPosition::South, card(Rank::Jack, Suit::Diamonds)),
                (PlayerPosition::West, card(Rank::Three, Suit::Hearts)),
            ],
        )
        .unwrap();
        let hand = Hand::with_cards(vec![
            card(Rank::Four, Suit::Diamonds),
            card(Rank::King, Suit::Diamonds),
            Card::QUEEN_OF_SPADES,
            card(Rank::Three, Suit::Spades),
            card(Rank::Eight, Suit::Clubs),
            card(Rank::Nine, Suit::Clubs),
            card(Rank::Two, Suit::Hearts),
            card(Rank::Seven, Suit::Hearts),
            card(Rank::Nine, Suit::Hearts),
            card(Rank::Ten, Suit::Hearts),
            card(Rank::Queen, Suit::Hearts),
            card(Rank::Four, Suit::Clubs),
        ]);
        GameState::new(PlayerPosition::North, hand)
            .with_history(history)
            .with_current_trick(trick)
    }

    fn config(use_threads: bool) -> SearchConfig {
        SearchConfig {
            simulations: 40,
            worlds: 8,
            use_threads,
            policy: PolicyKind::SafeSimple,
            playout_epsilon: 0.1,
            threads: Some(4),
        }
    }

    #[test]
    fn budget_split_is_even_with_front_loaded_remainder() {
        assert_eq!(split_budget(10, 4), vec![3, 3, 2, 2]);
        assert_eq!(split_budget(4, 4), vec![1, 1, 1, 1]);
        assert_eq!(split_budget(2, 4), vec![1, 1]);
        assert_eq!(split_budget(0, 3), vec![1]);
    }

    #[test]
    fn small_budgets_run_fewer_worlds_not_extra_simulations() {
        let state = mid_hand_state();
        let small = SearchConfig {
            simulations: 3,
            ..config(false)
        };
        let mut rng = StdRng::seed_from_u64(21);
        let stats = search(&state, PlayerPosition::North, &small, &mut rng).unwrap();
        assert_eq!(stats.worlds(), 3);
        assert!(stats.candidates().iter().all(|stats| stats.samples == 3));
    }

    #[test]
    fn every_candidate_gets_every_simulation() {
        let state = mid_hand_state();
        let mut rng = StdRng::seed_from_u64(11);
        let stats = search(&state, PlayerPosition::North, &config(false), &mut rng).unwrap();
        let cards: Vec<Card> = stats.candidates().iter().map(|stats| stats.card).collect();
        assert_eq!(
            cards,
            vec![card(Rank::Four, Suit::Diamonds), card(Rank::King, Suit::Diamonds)]
        );
        assert!(stats.candidates().iter().all(|stats| stats.samples == 40));
        assert_eq!(stats.worlds(), 8);
    }

    #[test]
    fn ducking_beats_overtaking() {
        let state = mid_hand_state();
        let mut rng = StdRng::seed_from_u64(5);
        let stats = search(&state, PlayerPosition::North, &config(false), &mut rng).unwrap();
        assert_eq!(
            stats.best().map(|stats| stats.card),
            Some(card(Rank::Four, Suit::Diamonds))
        );
    }

    #[test]
    fn threaded_matches_sequential_for_the_same_seed() {
        let state = mid_hand_state();
        let sequential = search(
            &state,
            PlayerPosition::North,
            &config(false),
            &mut StdRng::seed_from_u64(99),
        )
        .unwrap();
        let threaded = search(
            &state,
            PlayerPosition::North,
            &config(true),
            &mut StdRng::seed_from_u64(99),
        )
        .unwrap();
        assert_eq!(sequential, threaded);
    }

    #[test]
    fn ties_resolve_to_the_canonical_card() {
        let mut stats = MoveStatistics::new(&[
            card(Rank::Two, Suit::Clubs),
            card(Rank::Three, Suit::Clubs),
        ]);
        stats.absorb(&WorldResult {
            index: 0,
            totals: vec![-1.0, -1.0],
            simulations: 1,
        });
        assert_eq!(
            stats.best().map(|stats| stats.card),
            Some(card(Rank::Two, Suit::Clubs))
        );
    }

    #[test]
    fn zero_worlds_and_wrong_seat_are_rejected() {
        let state = mid_hand_state();
        let mut rng = StdRng::seed_from_u64(1);
        let empty = SearchConfig {
            worlds: 0,
            ..config(false)
        };
        assert!(matches!(
            search(&state, PlayerPosition::North, &empty, &mut rng),
            Err(SearchError::EmptyBudget)
        ));
        assert!(matches!(
            search(&state, PlayerPosition::East, &config(false), &mut rng),
            Err(SearchError::NotActing { .. })
        ));
    }

    #[test]
    fn impossible_observation_surfaces_as_inconsistent() {
        // Five won cards with no history leave too few unseen cards for full opponent hands.
        let hand: Vec<Card> = CardSet::FULL.of_suit(Suit::Clubs).to_vec();
        let mut taken = [CardSet::EMPTY; 4];
        taken[PlayerPosition::East.index()] = CardSet::FULL.of_suit(Suit::Diamonds).iter().take(5).collect();
        let state = GameState::new(PlayerPosition::North, Hand::with_cards(hand)).with_taken(taken);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            search(&state, PlayerPosition::North, &config(false), &mut rng),
            Err(SearchError::Inconsistent(
                InconsistentStateError::NotEnoughUnseenCards { needed: 39, available: 34 }
            ))
        ));
    }
}
