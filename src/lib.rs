// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod result;
pub mod store;

pub use crate::config::DetectorConfig;
pub use crate::core::engine::{DetectionEngine, LanguageDetector};
pub use crate::core::ngram::{NgramExtractor, RankedProfile};
pub use crate::core::tokenizer::{GraphemeTokenizer, Tokenizer, WordTokenizer};
pub use crate::error::{Error, Result};
pub use crate::result::LanguageResult;
pub use crate::store::{LanguageProfile, ProfileStore, ProfileStoreBuilder};
