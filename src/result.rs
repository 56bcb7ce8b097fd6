// File: src/result.rs
use crate::core::types::{LanguageCode, ScoreMap, BEST_RESULTS_THRESHOLD};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Language code -> similarity, kept in the order detection produced (best first).
///
/// Filtering methods (`whitelist`, `blacklist`, `limit`, `best_results`) return
/// fresh copies and leave `self` untouched. `set`, `push` and `remove` only
/// change this instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageResult {
    scores: IndexMap<LanguageCode, f64>,
}

impl LanguageResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.scores.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.scores.contains_key(code)
    }

    /// Overwrites the score of `code` in place, or appends it at the end.
    pub fn set(&mut self, code: impl Into<LanguageCode>, score: f64) {
        self.scores.insert(code.into(), score);
    }

    /// Appends `score` under a generated key: one past the largest integer key
    /// already present, or `"0"`. If that would overflow `u64`, the smallest
    /// unused integer key is taken instead. Returns the key used.
    pub fn push(&mut self, score: f64) -> LanguageCode {
        let used: HashSet<u64> = self
            .scores
            .keys()
            .filter_map(|code| code.parse::<u64>().ok())
            .collect();
        let next = match used.iter().max() {
            None => 0,
            Some(max) => max
                .checked_add(1)
                .unwrap_or_else(|| (0..).find(|n| !used.contains(n)).unwrap_or(0)),
        };
        let code = next.to_string();
        self.scores.insert(code.clone(), score);
        code
    }

    /// Removes `code`, keeping the order of the remaining entries.
    pub fn remove(&mut self, code: &str) -> Option<f64> {
        self.scores.shift_remove(code)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Best-ranked entry.
    pub fn first(&self) -> Option<(&str, f64)> {
        self.scores.first().map(|(code, score)| (code.as_str(), *score))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.scores.iter().map(|(code, score)| (code.as_str(), *score))
    }

    pub fn as_map(&self) -> &IndexMap<LanguageCode, f64> {
        &self.scores
    }

    pub fn into_inner(self) -> IndexMap<LanguageCode, f64> {
        self.scores
    }

    /// JSON object with the entries in stored order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Only the entries whose code is listed, in their current order.
    pub fn whitelist<I, S>(&self, codes: I) -> LanguageResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes: Vec<S> = codes.into_iter().collect();
        self.filter(|code, _| codes.iter().any(|c| c.as_ref() == code))
    }

    /// Every entry except the listed codes, in their current order.
    pub fn blacklist<I, S>(&self, codes: I) -> LanguageResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes: Vec<S> = codes.into_iter().collect();
        self.filter(|code, _| codes.iter().all(|c| c.as_ref() != code))
    }

    /// Up to `length` entries starting at position `offset`; all remaining
    /// entries when `length` is `None`.
    pub fn limit(&self, offset: usize, length: Option<usize>) -> LanguageResult {
        let scores = self
            .scores
            .iter()
            .skip(offset)
            .take(length.unwrap_or(usize::MAX))
            .map(|(code, score)| (code.clone(), *score))
            .collect();
        LanguageResult { scores }
    }

    /// Entries within `BEST_RESULTS_THRESHOLD` of the top score.
    pub fn best_results(&self) -> LanguageResult {
        self.best_results_within(BEST_RESULTS_THRESHOLD)
    }

    /// Entries whose score is at most `threshold` below the first entry's.
    pub fn best_results_within(&self, threshold: f64) -> LanguageResult {
        match self.first() {
            Some((_, top)) => self.filter(|_, score| top - score <= threshold),
            None => LanguageResult::new(),
        }
    }

    fn filter(&self, keep: impl Fn(&str, f64) -> bool) -> LanguageResult {
        let scores = self
            .scores
            .iter()
            .filter(|(code, score)| keep(code, **score))
            .map(|(code, score)| (code.clone(), *score))
            .collect();
        LanguageResult { scores }
    }
}

/// Shows the best-ranked code, or nothing for an empty result.
impl fmt::Display for LanguageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.first().map_or("", |(code, _)| code))
    }
}

impl From<ScoreMap> for LanguageResult {
    fn from(scores: ScoreMap) -> Self {
        scores.into_iter().collect()
    }
}

/// A code that appears more than once keeps its first score and position.
impl FromIterator<(LanguageCode, f64)> for LanguageResult {
    fn from_iter<T: IntoIterator<Item = (LanguageCode, f64)>>(iter: T) -> Self {
        let mut scores = IndexMap::new();
        for (code, score) in iter {
            scores.entry(code).or_insert(score);
        }
        LanguageResult { scores }
    }
}

impl IntoIterator for LanguageResult {
    type Item = (LanguageCode, f64);
    type IntoIter = indexmap::map::IntoIter<LanguageCode, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.into_iter()
    }
}

impl<'a> IntoIterator for &'a LanguageResult {
    type Item = (&'a LanguageCode, &'a f64);
    type IntoIter = indexmap::map::Iter<'a, LanguageCode, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}
