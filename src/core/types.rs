// src/core/types.rs

/// An atomic unit of input text (grapheme cluster or word).
pub type Token = String;

/// One to four consecutive tokens joined into a single key.
pub type Ngram = String;

/// Short language identifier such as `"de"` or `"pt-BR"`.
pub type LanguageCode = String;

/// Position of an n-gram inside a profile, 1 = most frequent.
pub type Rank = usize;

/// Scored candidates ordered best-first. Ties keep candidate order.
pub type ScoreMap = Vec<(LanguageCode, f64)>;

/// Stands in for word edges and the start/end of a sample.
pub const BOUNDARY_MARKER: &str = "_";

/// Default profile truncation, shared by sample and reference profiles.
pub const DEFAULT_MAX_RANK: usize = 300;

/// Longest n-gram counted. Lengths 1..=MAX_NGRAM_LEN are mixed into one profile.
pub const MAX_NGRAM_LEN: usize = 4;

/// Scores this close to the top score count as an equally good match.
pub const BEST_RESULTS_THRESHOLD: f64 = 0.025;
