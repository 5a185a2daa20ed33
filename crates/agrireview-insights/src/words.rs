//! Word-frequency ranking over user messages.
//!
//! Text is lower-cased and split into maximal runs of Unicode letters,
//! digits and underscore. Tokens shorter than two characters and common English
//! function words are dropped before counting.

use std::collections::HashSet;

use agrireview_core::{Field, RecordSet};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tally::Tally;

/// Default number of words kept by [`top_words`].
pub const TOP_WORD_LIMIT: usize = 50;

/// Minimum token length, in characters.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Common English function words excluded from the ranking.
pub const STOPWORDS: &[&str] = &[
    "the", "and", "to", "a", "of", "in", "is", "for", "it", "on", "that", "this", "with", "as",
    "are", "you", "we", "be", "or", "by", "an", "have", "i", "not", "but", "if", "from", "at",
    "your", "our",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

// Narrower than regex's `\w`: combining marks and connector punctuation
// other than `_` split words.
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}_]+").expect("valid word regex"));

pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Lower-case `text` and yield its countable tokens in order.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|w| !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// The `limit` most frequent tokens across every user message, as
/// `(token, count)` pairs. Equal counts keep first-seen order.
pub fn top_words(set: &RecordSet, limit: usize) -> Vec<(String, u64)> {
    if !set.has_field(Field::UserMessage) {
        return Vec::new();
    }

    let mut tally = Tally::new();
    for message in set
        .records
        .iter()
        .filter_map(|r| r.user_message.as_deref())
        .filter(|m| !m.is_empty())
    {
        for token in tokenize(message) {
            tally.add(token);
        }
    }
    tally.into_ranked(Some(limit)).0
}
