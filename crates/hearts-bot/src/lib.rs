pub mod policy;
pub mod search;
pub mod selector;

pub use policy::{Playout, PolicyKind, UnknownPolicy};
pub use search::{CandidateStats, MoveStatistics, SearchConfig, SearchError, search};
pub use selector::{
    AIConfig, DecisionError, DetailedDecision, MoveDecision, ValidationError, decide,
    decide_detailed,
};
