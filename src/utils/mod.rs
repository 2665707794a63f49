//! Utility modules

pub mod fuzzy;

pub use fuzzy::{extract_one, find_best_match, normalize_text, resolve, score, FuzzyMatch};
