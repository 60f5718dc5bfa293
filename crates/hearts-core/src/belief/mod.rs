//! Hidden-information handling for the seat to act.
//!
//! - `known`: hard facts extracted from the observed state (unseen cards, hand sizes, voids).
//! - `sampler`: uniform sampling of complete deals consistent with those facts.
//! - `world`: a determined deal that can be played to the end of the hand.

mod known;
mod sampler;
mod world;

pub use known::{KnownState, SuitMask};
pub use sampler::{Determinizer, InconsistentStateError, sample_world};
pub use world::World;
