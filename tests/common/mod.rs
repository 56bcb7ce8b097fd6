#![allow(dead_code)]

use langdetect::{
    GraphemeTokenizer, LanguageDetector, NgramExtractor, ProfileStore, ProfileStoreBuilder,
    Tokenizer,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const MAX_RANK: usize = 300;

/// Short reference texts the fixture profiles are built from.
pub const CORPORA: &[(&str, &str)] = &[
    ("de", include_str!("../fixtures/corpora/de.txt")),
    ("en", include_str!("../fixtures/corpora/en.txt")),
    ("es", include_str!("../fixtures/corpora/es.txt")),
    ("fr", include_str!("../fixtures/corpora/fr.txt")),
    ("nl", include_str!("../fixtures/corpora/nl.txt")),
    ("pl", include_str!("../fixtures/corpora/pl.txt")),
];

pub fn fixture_store() -> Arc<ProfileStore> {
    let extractor = NgramExtractor::new(MAX_RANK);
    let mut builder = ProfileStoreBuilder::new(MAX_RANK);
    for (code, text) in CORPORA {
        builder.insert(*code, extractor.build_profile(&GraphemeTokenizer.tokenize(text)));
    }
    Arc::new(builder.build())
}

pub fn detector() -> LanguageDetector {
    LanguageDetector::new(fixture_store())
}

/// Writes the fixture profiles as `<dir>/<code>/<code>.json` resources.
pub fn write_profile_dir(dir: &Path) {
    for language in fixture_store().iter() {
        let json = serde_json::json!({
            "code": language.code,
            "ngrams": language.profile.ngrams(),
        });
        let path = langdetect::store::resource_path(dir, &language.code);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    }
}
