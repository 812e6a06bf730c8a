//! A Codeforces problem the user has solved and wants to revisit.
use crate::error::{FlashbackError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub contest_id: u32,
    /// Problem letter within the contest, e.g. `A` or `F2`
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Problem {
    pub fn new(contest_id: u32, index: &str, name: &str) -> Self {
        Self {
            contest_id,
            index: index.to_uppercase(),
            name: name.to_string(),
            rating: None,
            tags: Vec::new(),
        }
    }

    /// Short identifier such as `1873A`
    pub fn key(&self) -> String {
        format!("{}{}", self.contest_id, self.index)
    }

    pub fn url(&self) -> String {
        format!(
            "https://codeforces.com/problemset/problem/{}/{}",
            self.contest_id, self.index
        )
    }
}

/// Splits a key like `1873A` or `1881f2` into contest id and (uppercased) index.
pub fn parse_key(key: &str) -> Result<(u32, String)> {
    let key = key.trim();
    let invalid = || FlashbackError::InvalidProblemKey(key.to_string());

    let split = key
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (contest, index) = key.split_at(split);

    let contest_id = contest.parse::<u32>().map_err(|_| invalid())?;
    let starts_with_letter = index.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !index.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }

    Ok((contest_id, index.to_uppercase()))
}
