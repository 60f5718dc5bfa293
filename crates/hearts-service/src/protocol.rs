//! Request and response bodies for the decision endpoints.

use crate::wire::{CardEncoding, WireCard, WireError, WireRules};
use hearts_core::model::card::Card;
use hearts_core::model::card_set::CardSet;
use hearts_core::model::hand::Hand;
use hearts_core::model::passing::PassDirection;
use hearts_core::model::player::PlayerPosition;
use hearts_core::model::state::GameState;
use hearts_core::model::trick::Trick;
use hearts_core::model::variant::RuleSet;
use serde::{Deserialize, Serialize};

/// Body of `/api/move`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub game_state: WireGameState,
    /// Partial settings, overlaid on the service defaults.
    #[serde(default)]
    pub ai_config: Option<serde_json::Value>,
}

/// Body of `/api/play-one`: fast defaults with two optional overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayOneRequest {
    pub game_state: WireGameState,
    #[serde(default)]
    pub simulations: Option<i64>,
    #[serde(default)]
    pub player_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireGameState {
    pub player_hand: Option<Vec<WireCard>>,
    pub player_hands: Option<Vec<Vec<WireCard>>>,
    pub current_player: i64,
    pub current_trick: Option<WireTrick>,
    pub trick_history: Vec<WireCompletedTrick>,
    /// Cards already won by each seat.
    pub played_cards: Vec<Vec<WireCard>>,
    pub scores: Vec<f64>,
    pub hearts_broken: bool,
    pub pass_direction: i64,
    pub rules: Option<WireRules>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireTrick {
    pub cards: Vec<WirePlay>,
    pub lead_player: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCompletedTrick {
    pub cards: Vec<WirePlay>,
    pub lead_player: Option<i64>,
    pub winner: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePlay {
    pub player: i64,
    pub card: WireCard,
}

/// A decoded game state together with the card shape to answer in.
#[derive(Debug, Clone)]
pub struct DecodedState {
    pub state: GameState,
    pub encoding: CardEncoding,
}

pub fn seat_from_wire(index: i64) -> Result<PlayerPosition, WireError> {
    usize::try_from(index)
        .ok()
        .and_then(PlayerPosition::from_index)
        .ok_or(WireError::SeatOutOfRange(index))
}

fn decode_cards(cards: &[WireCard]) -> Result<Vec<Card>, WireError> {
    cards.iter().map(WireCard::to_card).collect()
}

fn decode_trick(
    plays: &[WirePlay],
    lead_player: Option<i64>,
    fallback: PlayerPosition,
    context: &str,
) -> Result<Trick, WireError> {
    let leader = match lead_player {
        Some(index) => seat_from_wire(index)?,
        None => match plays.first() {
            Some(play) => seat_from_wire(play.player)?,
            None => fallback,
        },
    };
    let mut decoded = Vec::with_capacity(plays.len());
    for play in plays {
        decoded.push((seat_from_wire(play.player)?, play.card.to_card()?));
    }
    Trick::from_plays(leader, decoded).map_err(|err| WireError::InvalidTrick {
        context: context.to_string(),
        message: err.to_string(),
    })
}

impl WireGameState {
    pub fn decode(&self) -> Result<DecodedState, WireError> {
        let acting = seat_from_wire(self.current_player)?;

        let acting_cards = match (&self.player_hand, &self.player_hands) {
            (Some(hand), _) => hand.as_slice(),
            (None, Some(hands)) => hands
                .get(acting.index())
                .map(Vec::as_slice)
                .ok_or(WireError::MissingField("player_hands[current_player]"))?,
            (None, None) => return Err(WireError::MissingField("player_hand")),
        };
        let encoding = acting_cards
            .first()
            .map(WireCard::encoding)
            .unwrap_or_default();

        let mut state = GameState::new(acting, Hand::with_cards(decode_cards(acting_cards)?));

        if let Some(hands) = &self.player_hands {
            for (index, cards) in hands.iter().enumerate().take(4) {
                let Some(seat) = PlayerPosition::from_index(index) else {
                    continue;
                };
                // An empty entry marks a seat whose cards are not visible.
                if seat == acting || cards.is_empty() {
                    continue;
                }
                state = state.with_known_hand(seat, Hand::with_cards(decode_cards(cards)?));
            }
        }

        let trick = match &self.current_trick {
            Some(trick) => decode_trick(&trick.cards, trick.lead_player, acting, "current_trick")?,
            None => Trick::new(acting),
        };

        let mut history = Vec::with_capacity(self.trick_history.len());
        for (index, entry) in self.trick_history.iter().enumerate() {
            let context = format!("trick_history[{index}]");
            let trick = decode_trick(&entry.cards, entry.lead_player, acting, &context)?;
            if let (Some(claimed), Some(actual)) = (entry.winner, trick.winner()) {
                if seat_from_wire(claimed)? != actual {
                    return Err(WireError::InvalidTrick {
                        context,
                        message: format!("winner {claimed} does not match the cards ({actual})"),
                    });
                }
            }
            history.push(trick);
        }

        let mut taken = [CardSet::EMPTY; 4];
        for (slot, cards) in taken.iter_mut().zip(&self.played_cards) {
            *slot = decode_cards(cards)?.into_iter().collect();
        }

        let mut scores = [0.0; 4];
        for (slot, score) in scores.iter_mut().zip(&self.scores) {
            *slot = *score;
        }

        let pass_direction = PassDirection::from_wire(self.pass_direction)
            .ok_or(WireError::PassDirection(self.pass_direction))?;
        let rules = match &self.rules {
            Some(rules) => rules.to_rules()?,
            None => RuleSet::standard(),
        };

        let state = state
            .with_current_trick(trick)
            .with_history(history)
            .with_taken(taken)
            .with_scores(scores)
            .with_hearts_broken(self.hearts_broken)
            .with_pass_direction(pass_direction)
            .with_rules(rules);
        Ok(DecodedState { state, encoding })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ParseError,
    ValidationError,
    AiConfigError,
    NoLegalMoves,
    InconsistentState,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMove {
    pub card: WireCard,
    pub player: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success {
        #[serde(rename = "move")]
        chosen: WireMove,
        computation_time_ms: f64,
    },
    Error {
        error_code: ErrorCode,
        message: String,
    },
    Ok,
}

impl Response {
    pub fn error(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            error_code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            format!(
                r#"{{"status":"error","error_code":"INTERNAL_ERROR","message":"response encoding failed: {}"}}"#,
                err.to_string().replace('"', "'")
            )
        })
    }
}
