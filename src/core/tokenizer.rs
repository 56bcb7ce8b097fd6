// File: src/core/tokenizer.rs
use crate::core::types::Token;
use unicode_segmentation::UnicodeSegmentation;

/// Splits raw text into the units n-grams are built from.
///
/// Implementations must be total: any input, including empty or malformed-looking
/// text, produces some (possibly empty) token sequence.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Default tokenizer. Lowercases and yields extended grapheme clusters,
/// whitespace and punctuation included.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphemeTokenizer;

impl Tokenizer for GraphemeTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.to_lowercase()
            .graphemes(true)
            .map(str::to_string)
            .collect()
    }
}

/// Word-level segmentation: lowercased words plus the separators between them.
/// N-grams never cross a boundary marker, so the profile holds single words in
/// their bare and padded forms (`tag`, `_tag`, `tag_`, `_tag_`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.to_lowercase()
            .split_word_bounds()
            .map(str::to_string)
            .collect()
    }
}

/// Any `Fn(&str) -> Vec<String>` closure can be plugged in as a tokenizer.
impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<Token> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<Token> {
        self(text)
    }
}
