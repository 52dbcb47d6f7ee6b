//! Token estimation utilities

use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Generic BPE used when the configured model has no tokenizer of its own
pub const GENERIC_ENCODING: &str = "cl100k_base";

#[derive(Clone)]
enum Tokenizer {
    Bpe(Arc<CoreBPE>),
    Heuristic,
}

/// Approximates the context cost of text in model tokens
///
/// Construction never fails: a model without a known tokenizer falls back to
/// [`GENERIC_ENCODING`], and if that cannot be loaded either, to a
/// character-class heuristic. The degradation is logged once, here.
#[derive(Clone)]
pub struct TokenEstimator {
    tokenizer: Tokenizer,
    label: String,
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("label", &self.label)
            .finish()
    }
}

impl TokenEstimator {
    pub fn for_model(model: &str) -> Self {
        if let Ok(bpe) = tiktoken_rs::get_bpe_from_model(model) {
            return Self {
                tokenizer: Tokenizer::Bpe(Arc::new(bpe)),
                label: model.to_string(),
            };
        }

        match tiktoken_rs::cl100k_base() {
            Ok(bpe) => {
                tracing::warn!(
                    "No tokenizer for model {}; estimating with {}",
                    model,
                    GENERIC_ENCODING
                );
                Self {
                    tokenizer: Tokenizer::Bpe(Arc::new(bpe)),
                    label: GENERIC_ENCODING.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    "No tokenizer for model {} and {} unavailable ({}); using heuristic estimates",
                    model,
                    GENERIC_ENCODING,
                    e
                );
                Self::heuristic()
            }
        }
    }

    /// Character-class estimator with no tokenizer data behind it
    pub fn heuristic() -> Self {
        Self {
            tokenizer: Tokenizer::Heuristic,
            label: "heuristic".to_string(),
        }
    }

    /// Name of the tokenizer actually in use
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match &self.tokenizer {
            Tokenizer::Bpe(bpe) => bpe.encode_with_special_tokens(text).len(),
            Tokenizer::Heuristic => heuristic_estimate(text),
        }
    }

    /// Longest prefix of `text` whose estimate fits in `max_tokens`
    ///
    /// Cuts on token boundaries rather than characters.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> String {
        if max_tokens == 0 {
            return String::new();
        }
        match &self.tokenizer {
            Tokenizer::Bpe(bpe) => {
                let tokens = bpe.encode_with_special_tokens(text);
                if tokens.len() <= max_tokens {
                    return text.to_string();
                }
                // A cut can land inside a multi-byte character; back off a
                // few tokens until the prefix decodes.
                let mut end = max_tokens;
                while end > 0 && end + 4 > max_tokens {
                    if let Ok(prefix) = bpe.decode(tokens[..end].to_vec()) {
                        return prefix;
                    }
                    end -= 1;
                }
                heuristic_truncate(text, max_tokens)
            }
            Tokenizer::Heuristic => heuristic_truncate(text, max_tokens),
        }
    }
}

/// Estimate BPE token count from text
///
/// Heuristic estimation based on content type detection:
/// - Code-heavy content: ~2.5 chars/token
/// - Natural language: ~4.0 chars/token
/// - Markdown: ~3.0 chars/token
pub fn heuristic_estimate(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let total_chars = text.len();
    let total_lines = text.lines().count().max(1);

    let code_chars = text
        .chars()
        .filter(|&c| "{}[]();=<>|&!@#$%^*~`\\".contains(c))
        .count();

    let md_chars = text.chars().filter(|&c| "#-*_>".contains(c)).count();

    let indent_lines = text
        .lines()
        .filter(|line| line.starts_with("    ") || line.starts_with('\t'))
        .count();
    let indent_ratio = indent_lines as f64 / total_lines as f64;

    let code_fraction =
        ((code_chars as f64 / total_chars as f64) * 10.0 + indent_ratio * 0.5).min(1.0);
    let md_fraction = ((md_chars as f64 / total_chars as f64) * 8.0).min(1.0 - code_fraction);
    let prose_fraction = 1.0 - code_fraction - md_fraction;

    let chars_per_token = code_fraction * 2.5 + md_fraction * 3.0 + prose_fraction * 4.0;

    (total_chars as f64 / chars_per_token).max(1.0) as usize
}

fn heuristic_truncate(text: &str, max_tokens: usize) -> String {
    if heuristic_estimate(text) <= max_tokens {
        return text.to_string();
    }

    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    bounds.push(text.len());

    // Largest boundary whose prefix still fits
    let (mut lo, mut hi) = (0usize, bounds.len() - 1);
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if heuristic_estimate(&text[..bounds[mid]]) <= max_tokens {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    text[..bounds[lo]].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_empty() {
        assert_eq!(TokenEstimator::heuristic().estimate(""), 0);
        assert_eq!(TokenEstimator::for_model("gpt-4").estimate(""), 0);
    }

    #[test]
    fn test_heuristic_code() {
        let code = "fn main() {\n    println!(\"Hello\");\n}";
        let tokens = heuristic_estimate(code);
        assert!((12..=20).contains(&tokens), "Got {}", tokens);
    }

    #[test]
    fn test_heuristic_prose() {
        let prose = "This is a simple sentence with natural language that should be counted at about four characters per token.";
        let tokens = heuristic_estimate(prose);
        assert!((20..=32).contains(&tokens), "Got {}", tokens);
    }

    #[test]
    fn test_unknown_model_falls_back_to_generic() {
        let estimator = TokenEstimator::for_model("claude-3-5-sonnet-20240620");
        assert_eq!(estimator.label(), GENERIC_ENCODING);
        assert!(estimator.estimate("hello there, how are you today?") > 0);
    }

    #[test]
    fn test_known_model_uses_own_tokenizer() {
        let estimator = TokenEstimator::for_model("gpt-4");
        assert_eq!(estimator.label(), "gpt-4");
    }

    #[test]
    fn test_estimate_grows_with_length() {
        let estimator = TokenEstimator::for_model("claude-3-5-sonnet-20240620");
        let short = "The release moved to Thursday.";
        let long = short.repeat(20);
        assert!(estimator.estimate(&long) > estimator.estimate(short) * 10);
    }

    #[test]
    fn test_bpe_truncate_fits_budget() {
        let estimator = TokenEstimator::for_model("claude-3-5-sonnet-20240620");
        let text = "Alice proposed moving the launch to next week. ".repeat(50);
        let cut = estimator.truncate(&text, 40);
        assert!(estimator.estimate(&cut) <= 40);
        assert!(estimator.estimate(&cut) >= 30);
        assert!(text.starts_with(&cut));
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        let estimator = TokenEstimator::heuristic();
        assert_eq!(estimator.truncate("short", 100), "short");
        assert_eq!(estimator.truncate("short", 0), "");
    }

    #[test]
    fn test_heuristic_truncate_respects_char_boundaries() {
        let estimator = TokenEstimator::heuristic();
        let text = "héllo wörld ñandú ".repeat(40);
        let cut = estimator.truncate(&text, 10);
        assert!(heuristic_estimate(&cut) <= 10);
        assert!(!cut.is_empty());
        assert!(text.starts_with(&cut));
    }
}
