//! Fuzzy matching utilities for spoken names
//!
//! Scores are on a 0–100 scale. A match below [`MIN_CONFIDENCE`] is treated
//! as no match at all.

use strsim::normalized_levenshtein;

/// Lowest score accepted as a match
pub const MIN_CONFIDENCE: u8 = 60;

/// Substring matching only kicks in when one name is this much longer
const PARTIAL_MIN_RATIO: f64 = 1.5;
const PARTIAL_SCALE: f64 = 0.9;
/// Very lopsided pairs get a steeper discount
const PARTIAL_FAR_RATIO: f64 = 8.0;
const PARTIAL_FAR_SCALE: f64 = 0.6;

/// Result of a fuzzy match with the matched value and score
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub value: String,
    pub score: u8,
}

/// Normalize text for matching: lowercase, punctuation to spaces,
/// whitespace collapsed.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn token_sort(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best similarity of the shorter string against every same-length
/// window of the longer one.
fn partial_similarity(short: &str, long: &str) -> f64 {
    let window = short.chars().count();
    let long: Vec<char> = long.chars().collect();
    if window == 0 || window > long.len() {
        return 0.0;
    }
    long.windows(window)
        .map(|w| normalized_levenshtein(short, &w.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

/// Similarity between two strings, 0–100.
///
/// Takes the best of a straight comparison, a word-order independent one,
/// and, when one name is much longer than the other, a discounted
/// substring comparison. "room living" scores 100 against "living room";
/// "bedroom" scores 90 against "master bedroom".
pub fn score(a: &str, b: &str) -> u8 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let plain = normalized_levenshtein(&a, &b);
    let sorted = normalized_levenshtein(&token_sort(&a), &token_sort(&b));
    let mut best = plain.max(sorted);

    let (short, long) = if a.chars().count() <= b.chars().count() {
        (&a, &b)
    } else {
        (&b, &a)
    };
    let length_ratio = long.chars().count() as f64 / short.chars().count() as f64;
    if length_ratio >= PARTIAL_MIN_RATIO {
        let scale = if length_ratio > PARTIAL_FAR_RATIO {
            PARTIAL_FAR_SCALE
        } else {
            PARTIAL_SCALE
        };
        best = best.max(partial_similarity(short, long) * scale);
    }

    (best * 100.0).round() as u8
}

/// Single best candidate for `query`, regardless of score.
///
/// Ties keep the earliest candidate.
pub fn extract_one<'a, I>(query: &str, candidates: I) -> Option<FuzzyMatch>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut best: Option<FuzzyMatch> = None;
    for candidate in candidates {
        let s = score(query, candidate);
        if best.as_ref().map_or(true, |b| s > b.score) {
            best = Some(FuzzyMatch {
                value: candidate.clone(),
                score: s,
            });
        }
    }
    best
}

/// Find the best match at or above [`MIN_CONFIDENCE`]
pub fn find_best_match<'a, I>(query: &str, candidates: I) -> Option<FuzzyMatch>
where
    I: IntoIterator<Item = &'a String>,
{
    extract_one(query, candidates).filter(|m| m.score >= MIN_CONFIDENCE)
}

/// Resolve a spoken name against a name -> id mapping
pub fn resolve<'m, V>(
    candidates: &'m std::collections::BTreeMap<String, V>,
    query: &str,
) -> Option<&'m V> {
    let best = find_best_match(query, candidates.keys())?;
    tracing::debug!("Fuzzy '{}' -> '{}' ({})", query, best.value, best.score);
    candidates.get(&best.value)
}
