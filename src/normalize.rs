// SPDX-License-Identifier: MIT

//! Normalization functions.
//!
//! A normalization function receives the raw texts of an old line and a new
//! line and returns the texts that should be compared instead. Functions may
//! treat the two sides differently, which is why the engine always normalizes
//! one side at a time by passing an empty string for the other side.

use itertools::Itertools;

use crate::edit::NormalizedPair;

pub type NormalizeFn<'a> = dyn Fn(&str, &str) -> NormalizedPair + 'a;

pub fn identity(left: &str, right: &str) -> NormalizedPair {
    NormalizedPair::new(left, right)
}

pub fn trim_whitespace(left: &str, right: &str) -> NormalizedPair {
    NormalizedPair::new(left.trim(), right.trim())
}

/// Collapse runs of whitespace into a single space and trim the ends.
pub fn ignore_whitespace(left: &str, right: &str) -> NormalizedPair {
    NormalizedPair::new(
        left.split_whitespace().join(" "),
        right.split_whitespace().join(" "),
    )
}

pub fn ignore_all_whitespace(left: &str, right: &str) -> NormalizedPair {
    NormalizedPair::new(
        left.split_whitespace().collect::<String>(),
        right.split_whitespace().collect::<String>(),
    )
}

pub fn ignore_case(left: &str, right: &str) -> NormalizedPair {
    NormalizedPair::new(left.to_lowercase(), right.to_lowercase())
}

/// Built-in normalization modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    #[default]
    None,
    TrimWhitespace,
    IgnoreWhitespace,
    IgnoreAllWhitespace,
    IgnoreCase,
}
impl Normalization {
    pub fn function(self) -> fn(&str, &str) -> NormalizedPair {
        match self {
        Normalization::None => identity,
        Normalization::TrimWhitespace => trim_whitespace,
        Normalization::IgnoreWhitespace => ignore_whitespace,
        Normalization::IgnoreAllWhitespace => ignore_all_whitespace,
        Normalization::IgnoreCase => ignore_case,
        }
    }
}

pub fn normalize_old(normalize: &NormalizeFn<'_>, text: &str) -> String {
    normalize(text, "").text_left
}

pub fn normalize_new(normalize: &NormalizeFn<'_>, text: &str) -> String {
    normalize("", text).text_right
}
