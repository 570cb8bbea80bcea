//! # engram-tokens
//!
//! Token counting for context-budget packing. Uses the bundled cl100k
//! encoder when it can be constructed; otherwise every count degrades to
//! the chars/4 estimate, per the dependency-failure contract.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// Rough tokens-per-character ratio used when no encoder is available.
const CHARS_PER_TOKEN: usize = 4;

/// Counts tokens for budget decisions. Cheap to clone; the encoder is
/// process-wide and built lazily on first use.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter;

fn encoder() -> Option<&'static CoreBPE> {
    static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();
    ENCODER
        .get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(error = %e, "tokenizer unavailable, using chars/4 estimate");
                None
            }
        })
        .as_ref()
}

impl TokenCounter {
    pub fn new() -> Self {
        Self
    }

    /// Count tokens in `text`. Falls back to [`estimate_tokens`] when the
    /// encoder could not be constructed.
    pub fn count(&self, text: &str) -> usize {
        match encoder() {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => estimate_tokens(text),
        }
    }

    /// Whether the real encoder is in use (false means estimates).
    pub fn is_exact(&self) -> bool {
        encoder().is_some()
    }
}

/// The chars/4 estimate used when no tokenizer is available. Never returns
/// zero for non-empty text.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.chars().count() / CHARS_PER_TOKEN).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_length() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("ab"), 1);
        assert_eq!(estimate_tokens("a".repeat(400).as_str()), 100);
    }

    #[test]
    fn count_nonzero_for_text() {
        let counter = TokenCounter::new();
        assert!(counter.count("the quick brown fox") > 0);
    }
}
