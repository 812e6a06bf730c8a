use serde::{Deserialize, Serialize};

/// Ease factor given to an item that has never been reviewed
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
/// Ease factor never drops below this
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// SM-2 state persisted for one (user, problem) pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Days until the next review
    pub interval: u32,
    /// Consecutive successful recalls
    pub repetitions: u32,
    pub ease_factor: f64,
}

impl ReviewItem {
    pub fn new() -> Self {
        Self {
            interval: 0,
            repetitions: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
        }
    }
}

impl Default for ReviewItem {
    fn default() -> Self {
        Self::new()
    }
}
