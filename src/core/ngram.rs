// File: src/core/ngram.rs
use crate::core::types::{Ngram, Rank, Token, BOUNDARY_MARKER, MAX_NGRAM_LEN};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A bounded rank table: n-gram -> rank, 1 = most frequent.
///
/// Sample profiles and reference profiles share this shape. A profile is never
/// modified after it is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileRepr", into = "ProfileRepr")]
pub struct RankedProfile {
    /// N-grams in rank order; index 0 holds rank 1.
    ngrams: Vec<Ngram>,
    ranks: HashMap<Ngram, Rank>,
    max_rank: usize,
}

/// Wire shape of a profile: the truncation constant plus the ordered n-grams.
#[derive(Serialize, Deserialize)]
struct ProfileRepr {
    max_rank: usize,
    ngrams: Vec<Ngram>,
}

impl From<ProfileRepr> for RankedProfile {
    fn from(repr: ProfileRepr) -> Self {
        RankedProfile::from_ranked(repr.ngrams, repr.max_rank)
    }
}

impl From<RankedProfile> for ProfileRepr {
    fn from(profile: RankedProfile) -> Self {
        ProfileRepr { max_rank: profile.max_rank, ngrams: profile.ngrams }
    }
}

impl RankedProfile {
    /// An empty profile that would hold at most `max_rank` entries.
    pub fn empty(max_rank: usize) -> Self {
        Self { ngrams: Vec::new(), ranks: HashMap::new(), max_rank }
    }

    /// Builds a profile from n-grams that are already in rank order.
    /// Repeated n-grams keep their first rank; the list is cut at `max_rank`.
    pub fn from_ranked<I, S>(ngrams: I, max_rank: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Ngram>,
    {
        let mut profile = Self::empty(max_rank);
        for ngram in ngrams {
            if profile.ngrams.len() == max_rank {
                break;
            }
            let ngram = ngram.into();
            if profile.ranks.contains_key(&ngram) {
                continue;
            }
            profile.ranks.insert(ngram.clone(), profile.ngrams.len() + 1);
            profile.ngrams.push(ngram);
        }
        profile
    }

    /// Rank of `ngram`, or `None` when it fell outside the top `max_rank`.
    pub fn rank(&self, ngram: &str) -> Option<Rank> {
        self.ranks.get(ngram).copied()
    }

    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }

    pub fn max_rank(&self) -> usize {
        self.max_rank
    }

    /// Iterates `(ngram, rank)` pairs from rank 1 upwards.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Rank)> + '_ {
        self.ngrams.iter().enumerate().map(|(i, ngram)| (ngram.as_str(), i + 1))
    }

    /// The n-grams in rank order.
    pub fn ngrams(&self) -> &[Ngram] {
        &self.ngrams
    }
}

/// Turns a token sequence into a `RankedProfile` of mixed 1..=4-grams.
#[derive(Debug, Clone, Copy)]
pub struct NgramExtractor {
    max_rank: usize,
}

impl NgramExtractor {
    pub fn new(max_rank: usize) -> Self {
        Self { max_rank }
    }

    pub fn max_rank(&self) -> usize {
        self.max_rank
    }

    /// Counts every 1..=4-gram of the boundary-padded sequence in one table and
    /// ranks them by descending count. Equal counts keep first-seen order, so the
    /// same tokens always give the same profile.
    /// O(n) counting plus O(m log m) sorting for m distinct n-grams.
    pub fn build_profile(&self, tokens: &[Token]) -> RankedProfile {
        let units = pad_boundaries(tokens);
        if units.is_empty() || self.max_rank == 0 {
            return RankedProfile::empty(self.max_rank);
        }

        // ngram -> (count, first seen)
        let mut counts: HashMap<Ngram, (u64, usize)> = HashMap::new();
        let mut seen = 0usize;
        for start in 0..units.len() {
            for n in 1..=MAX_NGRAM_LEN {
                let Some(window) = units.get(start..start + n) else { break };
                if !is_word_local(window) {
                    continue;
                }
                let ngram: Ngram = window.concat();
                let entry = counts.entry(ngram).or_insert_with(|| {
                    seen += 1;
                    (0, seen)
                });
                entry.0 += 1;
            }
        }

        let mut ranked: Vec<(Ngram, (u64, usize))> = counts.into_iter().collect();
        ranked.sort_by_key(|&(_, (count, first))| (std::cmp::Reverse(count), first));

        RankedProfile::from_ranked(ranked.into_iter().map(|(ngram, _)| ngram), self.max_rank)
    }
}

/// Collapses each run of non-alphabetic tokens into one boundary marker and
/// pads both ends. Returns nothing when the sequence holds no letters.
fn pad_boundaries(tokens: &[Token]) -> Vec<&str> {
    let mut units = vec![BOUNDARY_MARKER];
    for token in tokens {
        if token.chars().any(char::is_alphabetic) {
            units.push(token.as_str());
        } else if units.last() != Some(&BOUNDARY_MARKER) {
            units.push(BOUNDARY_MARKER);
        }
    }
    if units.len() == 1 {
        return Vec::new();
    }
    if units.last() != Some(&BOUNDARY_MARKER) {
        units.push(BOUNDARY_MARKER);
    }
    units
}

/// A window is counted when it is not a bare marker and markers only sit at
/// its edges, i.e. it never spans two words.
fn is_word_local(window: &[&str]) -> bool {
    match window {
        [only] => *only != BOUNDARY_MARKER,
        [_, inner @ .., _] => !inner.contains(&BOUNDARY_MARKER),
        [] => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tokenizer::{GraphemeTokenizer, Tokenizer};

    fn profile(text: &str, max_rank: usize) -> RankedProfile {
        NgramExtractor::new(max_rank).build_profile(&GraphemeTokenizer.tokenize(text))
    }

    #[test]
    fn counts_mixed_lengths_with_boundaries() {
        let p = profile("ab", 300);
        // _ a b _ -> a b _a ab b_ _ab ab_ _ab_
        let expected = ["a", "_a", "_ab", "_ab_", "ab", "ab_", "b", "b_"];
        assert_eq!(p.len(), expected.len());
        for ngram in expected {
            assert!(p.rank(ngram).is_some(), "missing {ngram}");
        }
        assert_eq!(p.rank("_"), None);
    }

    #[test]
    fn most_frequent_ngram_ranks_first() {
        let p = profile("aaa b", 300);
        assert_eq!(p.rank("a"), Some(1));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let p = profile("xy", 300);
        // every n-gram occurs once, so ranks follow window order
        let order: Vec<&str> = p.iter().map(|(ngram, _)| ngram).collect();
        assert_eq!(order, vec!["_x", "_xy", "_xy_", "x", "xy", "xy_", "y", "y_"]);
    }

    #[test]
    fn ngrams_never_span_words() {
        let p = profile("ab cd", 300);
        assert_eq!(p.rank("b_c"), None);
        assert_eq!(p.rank("b__c"), None);
        assert!(p.rank("b_").is_some());
        assert!(p.rank("_c").is_some());
    }

    #[test]
    fn truncates_to_max_rank() {
        let p = profile("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(p.len(), 10);
        assert_eq!(p.iter().last().map(|(_, rank)| rank), Some(10));
    }

    #[test]
    fn whitespace_only_gives_empty_profile() {
        assert!(profile("", 300).is_empty());
        assert!(profile("  \t\n ", 300).is_empty());
        assert!(profile("123 ?!", 300).is_empty());
    }

    #[test]
    fn zero_max_rank_gives_empty_profile() {
        assert!(profile("hello", 0).is_empty());
    }

    #[test]
    fn from_ranked_dedupes_and_truncates() {
        let p = RankedProfile::from_ranked(["en", "er", "en", "ch", "de"], 3);
        assert_eq!(p.ngrams(), &["en", "er", "ch"]);
        assert_eq!(p.rank("ch"), Some(3));
        assert_eq!(p.rank("de"), None);
    }

    #[test]
    fn profile_serializes_as_ordered_list() {
        let p = RankedProfile::from_ranked(["b", "a"], 5);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"max_rank":5,"ngrams":["b","a"]}"#);
        let back: RankedProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
