use crate::config::DetectorConfig;
use crate::core::ngram::{NgramExtractor, RankedProfile};
use crate::core::tokenizer::{GraphemeTokenizer, Tokenizer};
use crate::core::types::{LanguageCode, ScoreMap};
use crate::error::{Error, Result};
use crate::result::LanguageResult;
use crate::store::{LanguageProfile, ProfileStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Scores a sample profile against reference profiles with the out-of-place
/// rank distance.
#[derive(Debug, Clone, Copy)]
pub struct DetectionEngine {
    max_rank: usize,
}

impl DetectionEngine {
    pub fn new(max_rank: usize) -> Self {
        Self { max_rank }
    }

    pub fn max_rank(&self) -> usize {
        self.max_rank
    }

    /// Similarity in [0, 1] between `sample` and `candidate`.
    ///
    /// Each sample n-gram costs the distance between its two ranks, or
    /// `max_rank` when the candidate lacks it. The summed distance is normalized
    /// by the worst case `sample.len() * max_rank`. An empty sample scores 0.0.
    pub fn score(&self, sample: &RankedProfile, candidate: &RankedProfile) -> f64 {
        if sample.is_empty() || self.max_rank == 0 {
            return 0.0;
        }

        let distance: usize = sample
            .iter()
            .map(|(ngram, rank)| match candidate.rank(ngram) {
                Some(reference) => reference.abs_diff(rank),
                None => self.max_rank,
            })
            .sum();
        let worst = (sample.len() * self.max_rank) as f64;

        (1.0 - distance as f64 / worst).clamp(0.0, 1.0)
    }

    /// Scores every candidate independently and orders them best-first.
    /// Equal scores keep the order the candidates were given in. A code given
    /// twice is scored once, with its first profile.
    pub fn detect<'a, I>(&self, sample: &RankedProfile, candidates: I) -> ScoreMap
    where
        I: IntoIterator<Item = &'a LanguageProfile>,
    {
        let mut seen = HashSet::new();
        let mut scores: ScoreMap = candidates
            .into_iter()
            .filter(|language| seen.insert(language.code.as_str()))
            .map(|language| (language.code.clone(), self.score(sample, &language.profile)))
            .collect();
        // sort_by is stable
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores
    }
}

/// Text-level entry point: tokenizes, builds the sample profile and scores it
/// against the profiles of a shared `ProfileStore`.
pub struct LanguageDetector {
    store: Arc<ProfileStore>,
    languages: Vec<LanguageCode>,
    tokenizer: Box<dyn Tokenizer>,
    extractor: NgramExtractor,
    engine: DetectionEngine,
    config: DetectorConfig,
}

impl LanguageDetector {
    /// Detector over every language in `store`, sized to the store's profiles.
    pub fn new(store: Arc<ProfileStore>) -> Self {
        let config = DetectorConfig { max_rank: store.max_rank(), ..DetectorConfig::default() };
        Self::assemble(store, config)
    }

    /// Detector with explicit settings. `config.max_rank` must be valid and
    /// equal to the store's, since sample and reference profiles share it.
    pub fn with_config(store: Arc<ProfileStore>, config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        if config.max_rank != store.max_rank() {
            return Err(Error::InvalidConfig(format!(
                "max_rank {} does not match the profile store's {}",
                config.max_rank,
                store.max_rank()
            )));
        }
        Ok(Self::assemble(store, config))
    }

    fn assemble(store: Arc<ProfileStore>, config: DetectorConfig) -> Self {
        let languages = store.codes().map(str::to_string).collect();
        Self {
            store,
            languages,
            tokenizer: Box::new(GraphemeTokenizer),
            extractor: NgramExtractor::new(config.max_rank),
            engine: DetectionEngine::new(config.max_rank),
            config,
        }
    }

    /// Detector limited to `codes`, scored in the given order.
    /// Codes the store does not know are dropped.
    pub fn with_languages<I, S>(store: Arc<ProfileStore>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut detector = Self::new(store);
        detector.set_languages(codes);
        detector
    }

    /// Restricts later `detect` calls to `codes`, scored in the given order.
    /// Codes the store does not know are dropped.
    pub fn set_languages<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.languages = self.known_codes(codes);
    }

    /// Replaces the tokenizer for all later `detect` calls.
    pub fn set_tokenizer<T: Tokenizer + 'static>(&mut self, tokenizer: T) {
        self.tokenizer = Box::new(tokenizer);
    }

    /// Active candidate codes in scoring order.
    pub fn languages(&self) -> &[LanguageCode] {
        &self.languages
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Scores `text` against every active candidate language.
    pub fn detect(&self, text: &str) -> LanguageResult {
        self.detect_codes(text, &self.languages)
    }

    /// Like `detect`, restricted to the active languages listed in `codes`.
    pub fn detect_among<I, S>(&self, text: &str, codes: I) -> LanguageResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let active: HashSet<&str> = self.languages.iter().map(String::as_str).collect();
        let codes: Vec<LanguageCode> = self
            .known_codes(codes)
            .into_iter()
            .filter(|code| active.contains(code.as_str()))
            .collect();
        self.detect_codes(text, &codes)
    }

    /// Builds the profile `detect` would compare for `text`.
    pub fn sample_profile(&self, text: &str) -> RankedProfile {
        self.extractor.build_profile(&self.tokenizer.tokenize(text))
    }

    fn detect_codes(&self, text: &str, codes: &[LanguageCode]) -> LanguageResult {
        let sample = self.sample_profile(text);
        let candidates = codes.iter().filter_map(|code| self.store.get(code));
        let scores = self.engine.detect(&sample, candidates);

        debug!(
            sample_ngrams = sample.len(),
            candidates = scores.len(),
            best = scores.first().map(|(code, _)| code.as_str()).unwrap_or(""),
            "detected language"
        );
        LanguageResult::from(scores)
    }

    /// Keeps the codes the store knows, first occurrence only.
    fn known_codes<I, S>(&self, codes: I) -> Vec<LanguageCode>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut known = Vec::new();
        for code in codes {
            let code = code.as_ref();
            if self.store.get(code).is_none() {
                debug!(code, "ignoring unknown language code");
                continue;
            }
            if seen.insert(code.to_string()) {
                known.push(code.to_string());
            }
        }
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProfileStoreBuilder;

    fn profile(ngrams: &[&str]) -> RankedProfile {
        RankedProfile::from_ranked(ngrams.iter().copied(), 4)
    }

    fn store() -> Arc<ProfileStore> {
        let extractor = NgramExtractor::new(300);
        let mut builder = ProfileStoreBuilder::new(300);
        for (code, text) in [
            ("en", "the cat sat on the mat with the hat"),
            ("de", "der hund und die katze sind nicht da"),
            ("nl", "de hond en de kat zijn niet hier"),
        ] {
            builder.insert(code, extractor.build_profile(&GraphemeTokenizer.tokenize(text)));
        }
        Arc::new(builder.build())
    }

    #[test]
    fn identical_profiles_score_one() {
        let engine = DetectionEngine::new(4);
        let p = profile(&["a", "b", "c"]);
        assert_eq!(engine.score(&p, &p), 1.0);
    }

    #[test]
    fn disjoint_profiles_score_zero() {
        let engine = DetectionEngine::new(4);
        assert_eq!(engine.score(&profile(&["a", "b"]), &profile(&["x", "y"])), 0.0);
    }

    #[test]
    fn rank_shift_costs_rank_difference() {
        let engine = DetectionEngine::new(4);
        // a: |1-2| = 1, b: |2-1| = 1 -> 1 - 2 / (2 * 4)
        let score = engine.score(&profile(&["a", "b"]), &profile(&["b", "a"]));
        assert!((score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn empty_sample_scores_zero() {
        let engine = DetectionEngine::new(4);
        assert_eq!(engine.score(&RankedProfile::empty(4), &profile(&["a"])), 0.0);
    }

    #[test]
    fn ties_keep_candidate_order() {
        let engine = DetectionEngine::new(4);
        let same = profile(&["x"]);
        let candidates = vec![
            LanguageProfile::new("b", same.clone()),
            LanguageProfile::new("a", same.clone()),
            LanguageProfile::new("c", profile(&["q"])),
        ];
        let scores = engine.detect(&profile(&["x"]), &candidates);
        let codes: Vec<&str> = scores.iter().map(|(code, _)| code.as_str()).collect();
        assert_eq!(codes, vec!["b", "a", "c"]);
    }

    #[test]
    fn duplicate_candidates_score_once() {
        let engine = DetectionEngine::new(4);
        let candidates = vec![
            LanguageProfile::new("de", profile(&["a", "b"])),
            LanguageProfile::new("en", profile(&["b", "a"])),
            LanguageProfile::new("de", profile(&["x"])),
        ];
        let scores = engine.detect(&profile(&["a", "b"]), &candidates);
        assert_eq!(scores, vec![("de".to_string(), 1.0), ("en".to_string(), 0.75)]);

        let result = LanguageResult::from(scores);
        assert_eq!(result.first(), Some(("de", 1.0)));
    }

    #[test]
    fn with_config_rejects_bad_or_mismatched_max_rank() {
        let zero = DetectorConfig { max_rank: 0, ..DetectorConfig::default() };
        assert!(matches!(
            LanguageDetector::with_config(store(), zero),
            Err(Error::InvalidConfig(_))
        ));

        let other = DetectorConfig { max_rank: 100, ..DetectorConfig::default() };
        assert!(matches!(
            LanguageDetector::with_config(store(), other),
            Err(Error::InvalidConfig(_))
        ));

        let detector = LanguageDetector::with_config(store(), DetectorConfig::default()).unwrap();
        assert_eq!(detector.config().max_rank, 300);
    }

    #[test]
    fn no_candidates_gives_empty_scores() {
        let engine = DetectionEngine::new(4);
        assert!(engine.detect(&profile(&["a"]), std::iter::empty()).is_empty());
    }

    #[test]
    fn detector_restricts_and_drops_unknown_codes() {
        let detector = LanguageDetector::with_languages(store(), ["nl", "xx", "en", "nl"]);
        assert_eq!(detector.languages(), &["nl", "en"]);
        let result = detector.detect("the hat");
        assert_eq!(result.len(), 2);
        assert_eq!(result.to_string(), "en");
    }

    #[test]
    fn detect_among_only_uses_active_languages() {
        let detector = LanguageDetector::with_languages(store(), ["de", "en"]);
        let result = detector.detect_among("the cat", ["en", "nl"]);
        assert_eq!(result.len(), 1);
        assert!(result.contains("en"));
    }

    #[test]
    fn custom_tokenizer_changes_sample() {
        let mut detector = LanguageDetector::new(store());
        let before = detector.sample_profile("ab");
        detector.set_tokenizer(|s: &str| vec![s.to_string()]);
        let after = detector.sample_profile("ab");
        assert_ne!(before, after);
        // one token: _ab _ab_ ab ab_
        assert_eq!(after.len(), 4);
        assert!(after.rank("ab").is_some());
    }
}
