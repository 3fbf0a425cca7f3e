//! Token estimation.

/// Approximates how many backend tokens a piece of text costs.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Word-count heuristic: `ceil(words * 0.75)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountEstimator;

impl TokenEstimator for WordCountEstimator {
    fn estimate(&self, text: &str) -> usize {
        estimate_tokens(text)
    }
}

/// Estimate tokens by counting whitespace-separated words.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    // ceil(3w / 4) in integer arithmetic
    (words * 3 + 3) / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_blank_text() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("   \n\t "), 0);
    }

    #[test]
    fn test_rounds_up() {
        assert_eq!(estimate_tokens("один"), 1);
        assert_eq!(estimate_tokens("one two"), 2);
        assert_eq!(estimate_tokens("one two three"), 3);
        assert_eq!(estimate_tokens("one two three four"), 3);
        assert_eq!(estimate_tokens("a b c d e"), 4);
    }

    #[test]
    fn test_whitespace_runs_count_once() {
        assert_eq!(
            estimate_tokens("  Привет,   как \n дела?  "),
            estimate_tokens("Привет, как дела?")
        );
    }

    #[test]
    fn test_trait_object() {
        let estimator: &dyn TokenEstimator = &WordCountEstimator;
        assert_eq!(estimator.estimate("one two three four five six seven eight"), 6);
    }
}
