//! Move selection on top of the search engine.

use crate::policy::PolicyKind;
use crate::search::{self, MoveStatistics, SearchConfig, SearchError};
use hearts_core::belief::InconsistentStateError;
use hearts_core::model::card::Card;
use hearts_core::model::player::PlayerPosition;
use hearts_core::model::state::{GameState, StateError};
use hearts_core::rules::{self, IllegalStateError};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{Level, event};

const DEFAULT_SIMULATIONS: i64 = 1000;
const DEFAULT_WORLDS: i64 = 30;
const DEFAULT_EPSILON: f64 = 0.1;

/// Per-request search settings as they arrive on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AIConfig {
    pub simulations: i64,
    pub worlds: i64,
    pub epsilon: f64,
    pub use_threads: bool,
    pub player_type: String,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            worlds: DEFAULT_WORLDS,
            epsilon: DEFAULT_EPSILON,
            use_threads: true,
            player_type: PolicyKind::default().as_str().to_string(),
        }
    }
}

impl AIConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.simulations < 1 {
            return Err(ValidationError::InvalidField {
                field: "simulations".to_string(),
                message: format!("must be at least 1, got {}", self.simulations),
            });
        }
        if self.worlds < 1 {
            return Err(ValidationError::InvalidField {
                field: "worlds".to_string(),
                message: format!("must be at least 1, got {}", self.worlds),
            });
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ValidationError::InvalidField {
                field: "epsilon".to_string(),
                message: format!("must be within [0, 1], got {}", self.epsilon),
            });
        }
        self.policy()?;
        Ok(())
    }

    pub fn policy(&self) -> Result<PolicyKind, ValidationError> {
        self.player_type
            .parse()
            .map_err(|err: crate::policy::UnknownPolicy| ValidationError::InvalidField {
                field: "player_type".to_string(),
                message: err.to_string(),
            })
    }

    /// Validated search settings. Playout noise follows the exploration rate.
    pub fn search_config(&self) -> Result<SearchConfig, ValidationError> {
        self.validate()?;
        Ok(SearchConfig {
            simulations: usize::try_from(self.simulations).unwrap_or(usize::MAX),
            worlds: usize::try_from(self.worlds).unwrap_or(usize::MAX),
            use_threads: self.use_threads,
            policy: self.policy()?,
            playout_epsilon: self.epsilon,
            threads: None,
        })
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::InvalidField { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("invalid ai_config: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid game state: {0}")]
    InvalidState(#[from] StateError),
    #[error("{seat} has no legal moves")]
    NoLegalMove { seat: PlayerPosition },
    #[error("inconsistent game state: {0}")]
    InconsistentState(#[from] InconsistentStateError),
    #[error("illegal game state: {0}")]
    IllegalState(#[from] IllegalStateError),
}

impl From<SearchError> for DecisionError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Inconsistent(inner) => DecisionError::InconsistentState(inner),
            SearchError::Illegal(inner) => DecisionError::IllegalState(inner),
            SearchError::EmptyBudget => DecisionError::Validation(ValidationError::InvalidField {
                field: "worlds".to_string(),
                message: "must be at least 1".to_string(),
            }),
            SearchError::NotActing { requested, acting } => {
                DecisionError::IllegalState(IllegalStateError::OutOfTurn {
                    expected: acting,
                    actual: requested,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveDecision {
    pub card: Card,
    pub player: PlayerPosition,
    pub computation_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailedDecision {
    pub decision: MoveDecision,
    /// `None` when the move was forced and no search ran.
    pub statistics: Option<MoveStatistics>,
    pub explored: bool,
}

pub fn decide<R: Rng + ?Sized>(
    state: &GameState,
    config: &AIConfig,
    rng: &mut R,
) -> Result<MoveDecision, DecisionError> {
    decide_detailed(state, config, rng).map(|detailed| detailed.decision)
}

pub fn decide_detailed<R: Rng + ?Sized>(
    state: &GameState,
    config: &AIConfig,
    rng: &mut R,
) -> Result<DetailedDecision, DecisionError> {
    let started = Instant::now();
    let search_config = config.search_config()?;
    state.validate()?;

    let seat = state.acting();
    let legal = match rules::legal_moves(
        state.acting_hand(),
        state.current_trick(),
        state.effective_hearts_broken(),
        state.is_first_trick(),
        state.rules(),
    ) {
        Ok(legal) => legal,
        Err(IllegalStateError::EmptyHand) => return Err(DecisionError::NoLegalMove { seat }),
        Err(err) => return Err(err.into()),
    };

    let (card, statistics, explored, reason) = match legal.as_slice() {
        [] => return Err(DecisionError::NoLegalMove { seat }),
        [only] => (*only, None, false, "forced"),
        _ => {
            let statistics = search::search(state, seat, &search_config, rng)?;
            let explored = config.epsilon > 0.0 && rng.gen_bool(config.epsilon);
            let chosen = if explored {
                legal.choose(rng).copied()
            } else {
                statistics.best().map(|stats| stats.card)
            };
            let card = chosen.ok_or(DecisionError::NoLegalMove { seat })?;
            let reason = if explored { "explore" } else { "search" };
            (card, Some(statistics), explored, reason)
        }
    };

    let computation_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    log_decision(state, &search_config, &legal, card, reason, computation_time_ms);

    Ok(DetailedDecision {
        decision: MoveDecision {
            card,
            player: seat,
            computation_time_ms,
        },
        statistics,
        explored,
    })
}

fn log_decision(
    state: &GameState,
    config: &SearchConfig,
    legal_moves: &[Card],
    chosen: Card,
    reason: &str,
    elapsed_ms: f64,
) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let legal_preview = if legal_moves.len() <= 6 {
        legal_moves
            .iter()
            .map(|card| card.to_string())
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{} moves", legal_moves.len())
    };

    event!(
        target: "hearts_bot::selector",
        Level::INFO,
        seat = ?state.acting(),
        policy = %config.policy,
        simulations = config.simulations,
        worlds = config.worlds,
        legal_count = legal_moves.len(),
        legal_moves = %legal_preview,
        chosen = %chosen,
        hearts_broken = state.effective_hearts_broken(),
        trick_cards = state.current_trick().len(),
        elapsed_ms,
        reason,
    );
}
