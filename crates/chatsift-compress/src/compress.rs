use crate::tokens::TokenEstimator;

/// Separator between insight texts wherever they are concatenated
pub const INSIGHT_SEPARATOR: &str = "\n\n---\n\n";

/// Per-item allowance for the separator when packing texts into a budget
const SEPARATOR_ALLOWANCE: usize = 5;

/// Newest-first greedy packing of `texts` into `budget` tokens
///
/// Walks from the end of the list and stops at the first text that no longer
/// fits; the kept texts are returned in their original order. When not even
/// the newest text fits, its token-level prefix is returned so the caller
/// still receives some context. A lone text carries no separator, so that
/// prefix gets the whole budget; only a zero budget yields an empty string.
pub fn recent_within_budget(texts: &[String], budget: usize, estimator: &TokenEstimator) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0usize;

    for text in texts.iter().rev() {
        let cost = estimator.estimate(text) + SEPARATOR_ALLOWANCE;
        if used + cost > budget {
            break;
        }
        kept.push(text);
        used += cost;
    }

    if kept.is_empty() {
        return match texts.last() {
            Some(newest) => estimator
                .truncate(newest, budget)
                .trim()
                .to_string(),
            None => String::new(),
        };
    }

    kept.reverse();
    kept.join(INSIGHT_SEPARATOR).trim().to_string()
}
