pub mod card;
pub mod card_set;
pub mod hand;
pub mod passing;
pub mod player;
pub mod rank;
pub mod state;
pub mod suit;
pub mod trick;
pub mod variant;
