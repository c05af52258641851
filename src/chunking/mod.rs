//! Transcript chunking under an estimated token budget.
//!
//! Words are accumulated greedily: a chunk is closed as soon as the next word
//! would push it past the budget. A single word is never split, so a word whose
//! own cost exceeds the budget becomes a chunk by itself.

/// Default budget for question-answering chunks.
pub const DEFAULT_QA_CHUNK_TOKENS: usize = 3000;

/// Default budget for summary chunks.
pub const DEFAULT_SUMMARY_CHUNK_TOKENS: usize = 4000;

/// Estimated token cost of a single word: one token per four characters, rounded up.
///
/// A rough proxy rather than a real tokenizer. Length is measured in UTF-16 code
/// units, so characters outside the Basic Multilingual Plane (most emoji) count twice.
pub fn estimate_tokens(word: &str) -> usize {
    word.encode_utf16().count().div_ceil(4)
}

/// Estimated token cost of a whitespace-separated text.
pub fn estimate_text_tokens(text: &str) -> usize {
    text.split_whitespace().map(estimate_tokens).sum()
}

/// Split `text` into chunks whose estimated cost stays within `max_chunk_tokens`.
///
/// Empty or whitespace-only input yields no chunks. Words inside a chunk are
/// joined by single spaces.
pub fn chunk_transcript(text: &str, max_chunk_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0;

    for word in text.split_whitespace() {
        let cost = estimate_tokens(word);
        if current_tokens + cost > max_chunk_tokens && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_tokens = 0;
        }
        current.push(word);
        current_tokens += cost;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("héllo"), 2);
    }

    #[test]
    fn test_estimate_tokens_counts_utf16_units() {
        // Each crab is a surrogate pair.
        assert_eq!(estimate_tokens("🦀🦀"), 1);
        assert_eq!(estimate_tokens("🦀🦀🦀"), 2);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_transcript("", 10).is_empty());
        assert!(chunk_transcript("  \n\t ", 10).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_transcript("hello   there\nworld", 100);
        assert_eq!(chunks, vec!["hello there world".to_string()]);
    }

    #[test]
    fn test_greedy_split() {
        // Each word costs 1 token; a budget of 3 gives groups of three.
        let chunks = chunk_transcript("a b c d e f g", 3);
        assert_eq!(chunks, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn test_oversized_word_gets_its_own_chunk() {
        let long = "x".repeat(41); // 11 tokens
        let text = format!("one {} two", long);
        let chunks = chunk_transcript(&text, 10);

        assert_eq!(chunks, vec!["one".to_string(), long.clone(), "two".to_string()]);
    }

    #[test]
    fn test_budget_property() {
        let text = "the quick brown fox jumps over the lazy dog while a considerably \
                    longer word like antidisestablishmentarianism appears among short ones";
        for budget in [1, 2, 3, 5, 8, 13, 100] {
            for chunk in chunk_transcript(text, budget) {
                let cost = estimate_text_tokens(&chunk);
                assert!(
                    cost <= budget || words(&chunk).len() == 1,
                    "chunk {:?} costs {} over budget {}",
                    chunk,
                    cost,
                    budget
                );
            }
        }
    }

    #[test]
    fn test_completeness_property() {
        let text = "  alpha beta\tgamma\n\ndelta epsilon zeta eta theta iota kappa lambda mu ";
        for budget in [1, 2, 4, 7, 50] {
            let chunks = chunk_transcript(text, budget);
            let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split(' ')).collect();
            assert_eq!(rejoined, words(text));
        }
    }
}
