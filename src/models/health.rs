//! Decay projection: how stale an item looks since it was last reviewed.
//!
//! This is a display/sorting signal layered on top of SM-2 and is kept
//! separate from the stored interval. It is recomputed on every read and
//! never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this health an item counts as decayed
pub const DECAY_THRESHOLD: u8 = 90;
/// Below this health an item is rusted
pub const RUST_THRESHOLD: u8 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    Fresh,
    Fading,
    Rusted,
}

impl VisualState {
    pub fn from_health(health: u8) -> Self {
        if health < RUST_THRESHOLD {
            VisualState::Rusted
        } else if health < DECAY_THRESHOLD {
            VisualState::Fading
        } else {
            VisualState::Fresh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualState::Fresh => "fresh",
            VisualState::Fading => "fading",
            VisualState::Rusted => "rusted",
        }
    }

    /// CSS filter used to render a card in this state
    pub fn filter_style(&self) -> &'static str {
        match self {
            VisualState::Fresh => "none",
            VisualState::Fading => "grayscale(50%)",
            VisualState::Rusted => "grayscale(100%) sepia(60%)",
        }
    }
}

impl fmt::Display for VisualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthProjection {
    /// 0-100
    pub health: u8,
    pub visual_state: VisualState,
    pub is_decayed: bool,
}

impl HealthProjection {
    /// Projects health from the last review time. Never-reviewed items are
    /// maximally urgent.
    pub fn compute(last_reviewed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let health = match last_reviewed_at {
            None => 0,
            Some(reviewed_at) => health_after_days(now.signed_duration_since(reviewed_at).num_days()),
        };
        Self::from_health(health)
    }

    pub fn from_health(health: u8) -> Self {
        Self {
            health,
            visual_state: VisualState::from_health(health),
            is_decayed: health < DECAY_THRESHOLD,
        }
    }

    pub fn filter_style(&self) -> &'static str {
        self.visual_state.filter_style()
    }
}

/// Step function over whole days since the last review.
fn health_after_days(days_since: i64) -> u8 {
    if days_since > 7 {
        20
    } else if days_since > 4 {
        50
    } else if days_since > 2 {
        80
    } else if days_since > 0 {
        95
    } else {
        100
    }
}
