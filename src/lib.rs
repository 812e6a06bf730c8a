pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{FlashbackError, Result};
pub use models::{
    FlashbackEntry, HealthProjection, Problem, Quality, ReviewDeck, ReviewItem, ReviewSession,
    VisualState,
};
