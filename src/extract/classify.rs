use crate::config::FilterConfig;
use crate::extract::Rejection;
use std::collections::BTreeSet;

/// Counts distinct keywords occurring in `text` (case-insensitive substring)
pub fn keyword_hits(text: &str, keywords: &[String]) -> usize {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .map(|keyword| keyword.to_lowercase())
        .collect::<BTreeSet<_>>()
        .iter()
        .filter(|keyword| lowered.contains(keyword.as_str()))
        .count()
}

/// Applies the length gate, then the topical gate
///
/// Returns the word count of accepted text.
pub fn check_gates(text: &str, filter: &FilterConfig) -> Result<usize, Rejection> {
    let words = text.split_whitespace().count();
    if words < filter.min_words {
        return Err(Rejection::TooShort {
            words,
            required: filter.min_words,
        });
    }

    let hits = keyword_hits(text, &filter.keywords);
    if hits < filter.min_keyword_hits {
        return Err(Rejection::OffTopic {
            hits,
            required: filter.min_keyword_hits,
        });
    }

    Ok(words)
}
