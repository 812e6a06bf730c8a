pub mod deck;
pub mod flashback_entry;
pub mod health;
pub mod problem;
pub mod quality;
pub mod review_item;
pub mod review_session;
pub mod sm2;

pub use deck::{DeckSummary, ReviewDeck};
pub use flashback_entry::{FlashbackEntry, ReviewLogEntry, rank_by_urgency};
pub use health::{HealthProjection, VisualState};
pub use problem::{Problem, parse_key};
pub use quality::Quality;
pub use review_item::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR, ReviewItem};
pub use review_session::ReviewSession;
