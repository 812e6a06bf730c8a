//! A solved problem scheduled for spaced review, together with its SM-2 state.
use super::{HealthProjection, MIN_EASE_FACTOR, Problem, ReviewItem, parse_key};
use crate::error::{FlashbackError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashbackEntry {
    pub user_handle: String,
    pub problem: Problem,
    pub item: ReviewItem,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub added_at: DateTime<Utc>,
}

impl FlashbackEntry {
    /// A freshly solved problem: default SM-2 state, due immediately.
    pub fn new(user_handle: &str, problem: Problem, now: DateTime<Utc>) -> Self {
        Self {
            user_handle: user_handle.to_string(),
            problem,
            item: ReviewItem::new(),
            last_reviewed_at: None,
            next_review_at: now,
            added_at: now,
        }
    }

    pub fn health(&self, now: DateTime<Utc>) -> HealthProjection {
        HealthProjection::compute(self.last_reviewed_at, now)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// Checks state coming from outside the scheduler (e.g. an import) and
    /// normalizes the problem index so the entry is found by its key.
    pub fn validated(mut self) -> Result<Self> {
        let (_, index) = parse_key(&format!("{}{}", self.problem.contest_id, self.problem.index))?;
        self.problem.index = index;

        let invalid = |reason: String| FlashbackError::InvalidEntry {
            key: self.problem.key(),
            reason,
        };
        let item = self.item;
        if !item.ease_factor.is_finite() || item.ease_factor < MIN_EASE_FACTOR {
            return Err(invalid(format!(
                "ease factor {} is below {MIN_EASE_FACTOR}",
                item.ease_factor
            )));
        }
        if item.repetitions > 0 && item.interval == 0 {
            return Err(invalid(format!(
                "interval 0 after {} successful recalls",
                item.repetitions
            )));
        }
        Ok(self)
    }
}

/// Orders entries most urgent first: lowest health, then earliest due date,
/// then problem key.
pub fn rank_by_urgency(entries: &mut [FlashbackEntry], now: DateTime<Utc>) {
    entries.sort_by_cached_key(|entry| {
        (
            entry.health(now).health,
            entry.next_review_at,
            entry.problem.contest_id,
            entry.problem.index.clone(),
        )
    });
}

/// One graded review as stored in the review log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    pub problem_key: String,
    pub quality: u8,
    pub interval: u32,
    pub repetitions: u32,
    pub ease_factor: f64,
    pub reviewed_at: DateTime<Utc>,
}
