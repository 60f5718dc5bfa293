//! Request handling for the decision endpoints.
//!
//! Every call is independent: the body is parsed, decoded into a
//! `GameState`, handed to the selector with a fresh generator, and the
//! outcome is folded into a [`Response`]. Failures of any kind, panics
//! included, come back as structured error responses.

use crate::config::ServiceConfig;
use crate::protocol::{ErrorCode, MoveRequest, PlayOneRequest, Response, WireGameState, WireMove};
use crate::wire::{WireCard, WireError};
use hearts_bot::{AIConfig, DecisionError, decide};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Move,
    PlayOne,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Move => "/api/move",
            Endpoint::PlayOne => "/api/play-one",
        }
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid game_state: {0}")]
    Wire(#[from] WireError),
    #[error("invalid ai_config: {0}")]
    AiConfig(String),
    #[error(transparent)]
    Decision(#[from] DecisionError),
}

impl HandlerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HandlerError::Parse(_) => ErrorCode::ParseError,
            HandlerError::Wire(_) => ErrorCode::ValidationError,
            HandlerError::AiConfig(_) => ErrorCode::AiConfigError,
            HandlerError::Decision(err) => match err {
                DecisionError::Validation(_) => ErrorCode::AiConfigError,
                DecisionError::InvalidState(_) | DecisionError::IllegalState(_) => {
                    ErrorCode::ValidationError
                }
                DecisionError::NoLegalMove { .. } => ErrorCode::NoLegalMoves,
                DecisionError::InconsistentState(_) => ErrorCode::InconsistentState,
            },
        }
    }
}

pub struct Handler {
    config: ServiceConfig,
}

impl Handler {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn health(&self) -> Response {
        Response::Ok
    }

    /// `/api/move`: full search with the service defaults under any
    /// `ai_config` fields the request carries.
    pub fn handle_move(&self, body: &str) -> Response {
        self.guarded(Endpoint::Move, || {
            let request: MoveRequest = serde_json::from_str(body)?;
            let config = self.move_config(request.ai_config)?;
            self.run(&request.game_state, &config)
        })
    }

    /// `/api/play-one`: the fast preset, with optional top-level
    /// `simulations` and `player_type` overrides.
    pub fn handle_play_one(&self, body: &str) -> Response {
        self.guarded(Endpoint::PlayOne, || {
            let request: PlayOneRequest = serde_json::from_str(body)?;
            let mut config = self.config.play_one.to_ai_config();
            if let Some(simulations) = request.simulations {
                config.simulations = simulations;
            }
            if let Some(player_type) = request.player_type {
                config.player_type = player_type;
            }
            self.run(&request.game_state, &config)
        })
    }

    fn move_config(&self, overrides: Option<Value>) -> Result<AIConfig, HandlerError> {
        let fields = match overrides {
            None => return Ok(self.config.defaults.clone()),
            Some(Value::Object(fields)) => fields,
            Some(other) => {
                return Err(HandlerError::AiConfig(format!(
                    "expected an object, found {other}"
                )));
            }
        };
        let mut merged = serde_json::to_value(&self.config.defaults)
            .map_err(|err| HandlerError::AiConfig(err.to_string()))?;
        if let Value::Object(base) = &mut merged {
            base.extend(fields);
        }
        serde_json::from_value(merged).map_err(|err| HandlerError::AiConfig(err.to_string()))
    }

    fn run(&self, wire: &WireGameState, config: &AIConfig) -> Result<Response, HandlerError> {
        let decoded = wire.decode()?;
        let mut rng = self.rng();
        let decision = decide(&decoded.state, config, &mut rng)?;
        Ok(Response::Success {
            chosen: WireMove {
                card: WireCard::encode(decision.card, decoded.encoding),
                player: decision.player.index(),
            },
            computation_time_ms: decision.computation_time_ms.max(0.0),
        })
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn guarded<F>(&self, endpoint: Endpoint, work: F) -> Response
    where
        F: FnOnce() -> Result<Response, HandlerError>,
    {
        let started = Instant::now();
        let response = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => Response::error(err.code(), err.to_string()),
            Err(payload) => Response::error(
                ErrorCode::InternalError,
                format!("internal error: {}", panic_message(payload.as_ref())),
            ),
        };
        log_request(endpoint, &response, started.elapsed().as_secs_f64() * 1000.0);
        response
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn log_request(endpoint: Endpoint, response: &Response, elapsed_ms: f64) {
    match response {
        Response::Error {
            error_code,
            message,
        } => {
            if !tracing::enabled!(Level::WARN) {
                return;
            }
            event!(
                target: "hearts_service::handler",
                Level::WARN,
                endpoint = endpoint.path(),
                error_code = ?error_code,
                message = %message,
                elapsed_ms,
            );
        }
        _ => {
            if !tracing::enabled!(Level::INFO) {
                return;
            }
            event!(
                target: "hearts_service::handler",
                Level::INFO,
                endpoint = endpoint.path(),
                status = "success",
                elapsed_ms,
            );
        }
    }
}
