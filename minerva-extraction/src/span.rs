//! Span hydration: locate the byte range in a narrative that supports an
//! extracted claim. Exact case-insensitive match first; otherwise a
//! windowed fuzzy search scored by a token-sort-ratio equivalent, accepted
//! only above a similarity floor. Never fabricates offsets.

use crate::errors::ExtractionError;
use minerva_core::types::Span;

const FUZZY_THRESHOLD: f64 = 75.0;

/// A token and its byte span within the original text.
struct Token<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut end = start + c.len_utf8();
        chars.next();
        while let Some(&(idx, c2)) = chars.peek() {
            if c2.is_whitespace() {
                break;
            }
            end = idx + c2.len_utf8();
            chars.next();
        }
        tokens.push(Token { text: &text[start..end], start, end });
    }
    tokens
}

/// Finds the best supporting span for `target` within `narrative`. Returns
/// `Ok(None)` (never a guessed offset) if no window scores above the fuzzy
/// threshold. An empty `narrative` or `target` is malformed input, not a
/// legitimate no-match, so it raises instead of silently yielding `None`.
pub fn hydrate_span(narrative: &str, target: &str) -> Result<Option<Span>, ExtractionError> {
    if narrative.is_empty() {
        return Err(ExtractionError::InvalidInput("narrative is empty".to_string()));
    }
    if target.trim().is_empty() {
        return Err(ExtractionError::InvalidInput("target is empty".to_string()));
    }

    if let Some(span) = exact_match(narrative, target) {
        return Ok(Some(span));
    }

    Ok(fuzzy_match(narrative, target))
}

fn exact_match(narrative: &str, target: &str) -> Option<Span> {
    let lower_narrative = narrative.to_lowercase();
    let lower_target = target.to_lowercase();
    let byte_idx = lower_narrative.find(&lower_target)?;
    // `find` on the lowercased copy gives a byte offset valid in the
    // original only when lowercasing doesn't change byte lengths for the
    // matched slice; that holds for the Latin-script text this pipeline
    // handles, and fuzzy_match is the fallback otherwise.
    Some(Span::new(byte_idx, byte_idx + lower_target.len()))
}

fn fuzzy_match(narrative: &str, target: &str) -> Option<Span> {
    let narrative_tokens = tokenize(narrative);
    let target_token_count = target.split_whitespace().count().max(1);

    let mut best: Option<(f64, Span)> = None;
    for window_len in [
        target_token_count.saturating_sub(1).max(1),
        target_token_count,
        target_token_count + 1,
    ] {
        if window_len == 0 || window_len > narrative_tokens.len() {
            continue;
        }
        for window in narrative_tokens.windows(window_len) {
            let start = window.first().unwrap().start;
            let end = window.last().unwrap().end;
            let window_text = &narrative[start..end];
            let score = token_sort_ratio(window_text, target);
            if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, Span::new(start, end)));
            }
        }
    }

    match best {
        Some((score, span)) if score >= FUZZY_THRESHOLD => Some(span),
        _ => None,
    }
}

/// Token-sort-ratio equivalent: lowercase, sort whitespace tokens, rejoin,
/// then score by longest-common-subsequence-based similarity. Implemented
/// directly rather than pulling in a fuzzy-matching crate not present in
/// this workspace's dependency stack.
fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted_a = sort_tokens(a);
    let sorted_b = sort_tokens(b);
    char_similarity(&sorted_a, &sorted_b)
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ").to_lowercase()
}

/// `2 * LCS(a, b) / (len(a) + len(b)) * 100`, the same ratio formula
/// `difflib.SequenceMatcher.ratio()` uses for the common case.
fn char_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let lcs = lcs_len(&a, &b);
    (2.0 * lcs as f64 / (a.len() + b.len()) as f64) * 100.0
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_finds_ascii_phrase() {
        let narrative = "Today I talked with Ana about the project.";
        let span = hydrate_span(narrative, "talked with Ana").unwrap().unwrap();
        assert_eq!(span.slice(narrative).unwrap().to_lowercase(), "talked with ana");
    }

    #[test]
    fn empty_inputs_are_rejected_without_panicking() {
        assert!(hydrate_span("", "anything").is_err());
        assert!(hydrate_span("some text", "").is_err());
    }

    #[test]
    fn fuzzy_match_finds_paraphrased_claim() {
        let narrative = "She felt a deep sense of calm after the walk.";
        let span = hydrate_span(narrative, "felt a deep calm sense").unwrap();
        assert!(span.is_some());
    }

    #[test]
    fn unrelated_target_yields_no_span() {
        let narrative = "The weather was cold and grey all day.";
        assert!(hydrate_span(narrative, "quantum entanglement experiment results").unwrap().is_none());
    }
}
