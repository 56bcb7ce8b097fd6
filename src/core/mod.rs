// src/core/mod.rs

pub mod engine;
pub mod ngram;
pub mod tokenizer;
pub mod types;
