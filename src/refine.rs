// SPDX-License-Identifier: MIT

//! Refinement pipeline.
//!
//! The patience engine only distinguishes equal lines from inserted and
//! deleted ones. The passes in this module upgrade that raw script: moved
//! lines, substituted lines, grouping into blocks, and reclassification of
//! changes that turn out to be insignificant. Each pass consumes its input
//! and returns a new list.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::edit::*;
use crate::normalize::{NormalizeFn, Normalization};
use crate::patience::{self, FallbackFn};
use crate::utils::*;

mod combine;
mod moves;
mod reclassify;
mod substitution;

pub use combine::combine_to_units;
pub use moves::detect_moves;
pub use reclassify::{reclassify_blank_lines, reclassify_ignored, reclassify_split_lines};
pub use substitution::{
    containment, detect_substitutions, is_enhanced_for_rewrite, is_similar, lcs_length,
    MAX_SIMILARITY_LENGTH, SIMILARITY_THRESHOLD,
};

/// How aggressively deleted and inserted lines are paired up as substitutions.
///
/// Modes are ordered: every mode performs the checks of the modes before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SimilarityMode {
    /// Containment and known refactoring patterns only.
    Contains,
    /// Additionally pair lines with a long common subsequence.
    #[default]
    Similar,
    /// Additionally retry unpaired lines relative to the shorter line.
    Permissive,
}

#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub normalization: Normalization,
    pub detect_moves: bool,
    pub similarity: SimilarityMode,
    /// Merge adjacent inserts, deletes and substitutions into replacement
    /// blocks.
    pub combine_replacements: bool,
    /// Changes that only touch lines matching one of these are ignored.
    pub ignore_patterns: Vec<Regex>,
}
impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            normalization: Normalization::None,
            detect_moves: true,
            similarity: SimilarityMode::Similar,
            combine_replacements: true,
            ignore_patterns: Vec::new(),
        }
    }
}

/// Run the passes that operate on the flat edit list.
pub fn refine_edits(edits: Vec<Edit>, options: &DiffOptions, normalize: &NormalizeFn<'_>) -> Result<Vec<Edit>> {
    let edits = if options.detect_moves {
        detect_moves(edits, normalize)
    } else {
        edits
    };
    detect_substitutions(edits, normalize, options.similarity)
}

/// Diff `old` against `new` and refine the result, without grouping it into
/// units.
pub fn diff_edits_with(old: &[Line], new: &[Line], options: &DiffOptions,
                       normalize: &NormalizeFn<'_>, fallback: &FallbackFn<'_>) -> Result<Vec<Edit>> {
    let edits = patience::diff(old, new, normalize, fallback);
    let edits = refine_edits(edits, options, normalize)?;

    #[cfg(feature = "debug-diff")]
    if let Err(err) = verify_coverage(old, new, &edits) {
        panic!("refined edit script is invalid: {}", err);
    }

    Ok(edits)
}

pub fn diff_edits(old: &[Line], new: &[Line], options: &DiffOptions, fallback: &FallbackFn<'_>) -> Result<Vec<Edit>> {
    let normalize = options.normalization.function();
    diff_edits_with(old, new, options, &normalize, fallback)
}

/// Run the whole pipeline with a custom normalization function. The
/// `normalization` field of `options` is not used.
pub fn compute_with(old: &[Line], new: &[Line], options: &DiffOptions,
                    normalize: &NormalizeFn<'_>, fallback: &FallbackFn<'_>) -> Result<Vec<Unit>> {
    let edits = diff_edits_with(old, new, options, normalize, fallback)?;

    let units = combine_to_units(edits, options.combine_replacements);
    let units = reclassify_split_lines(units, normalize);
    let units = reclassify_blank_lines(units, normalize);
    let units = reclassify_ignored(units, &options.ignore_patterns);

    #[cfg(feature = "debug-diff")]
    if let Err(err) = verify_coverage(old, new, units.iter().flat_map(Unit::edits)) {
        panic!("units do not cover the input: {}", err);
    }

    log::debug!("compute: {}", Stats::of(&units));
    Ok(units)
}

/// Diff `old` against `new` and run the full refinement pipeline.
pub fn compute(old: &[Line], new: &[Line], options: &DiffOptions, fallback: &FallbackFn<'_>) -> Result<Vec<Unit>> {
    let normalize = options.normalization.function();
    compute_with(old, new, options, &normalize, fallback)
}

/// Check that every line on both sides is referenced by exactly one edit, in
/// order on each side except for moves.
///
/// A move appears twice in a refined script (at its old and at its new
/// position), and both copies may have been reclassified. An edit relating
/// the same old and new line as an earlier one is therefore only counted once.
pub fn verify_coverage<'e>(old: &[Line], new: &[Line], edits: impl IntoIterator<Item = &'e Edit>) -> Result<()> {
    let mut seen_pairs = HashSet::new();
    let mut old_seen = vec![false; old.len()];
    let mut new_seen = vec![false; new.len()];

    fn mark(side: &str, lines: &[Line], seen: &mut [bool], line: &Line) -> Result<()> {
        let Some(idx) = line.number().checked_sub(1).filter(|&idx| idx < lines.len()) else {
            return Err(format!("{} line {} is out of range", side, line.number()))?;
        };
        if lines[idx].text() != line.text() {
            Err(format!("{} line {} has the wrong text", side, line.number()))?;
        }
        if std::mem::replace(&mut seen[idx], true) {
            Err(format!("{} line {} is covered twice", side, line.number()))?;
        }
        Ok(())
    }

    for edit in edits {
        if let (Some(old), Some(new)) = (edit.old_number(), edit.new_number()) {
            if !seen_pairs.insert((old, new)) {
                continue;
            }
        }
        if let Some(line) = edit.old_line() {
            mark("old", old, &mut old_seen, line)?;
        }
        if let Some(line) = edit.new_line() {
            mark("new", new, &mut new_seen, line)?;
        }
    }

    if let Some(idx) = old_seen.iter().position(|&seen| !seen) {
        Err(format!("old line {} is not covered", idx + 1))?;
    }
    if let Some(idx) = new_seen.iter().position(|&seen| !seen) {
        Err(format!("new line {} is not covered", idx + 1))?;
    }
    Ok(())
}

/// Number of lines per kind of change in a list of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub equal: usize,
    pub normalized: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub moved: usize,
    pub substituted: usize,
    pub ignored: usize,
}
impl Stats {
    pub fn of(units: &[Unit]) -> Self {
        let mut stats = Stats::default();
        let mut pairs = HashSet::new();
        for unit in units {
            for (kind, edit) in unit.classified_edits() {
                if let (Some(old), Some(new)) = (edit.old_number(), edit.new_number()) {
                    if !pairs.insert((old, new)) {
                        continue;
                    }
                }
                match kind {
                EditKind::Equal => stats.equal += 1,
                EditKind::Normalize => stats.normalized += 1,
                EditKind::Insert => stats.inserted += 1,
                EditKind::Delete => stats.deleted += 1,
                EditKind::Move => stats.moved += 1,
                EditKind::Substitute | EditKind::SubstitutionContains(_) => stats.substituted += 1,
                EditKind::Ignore => stats.ignored += 1,
                EditKind::Replacement => {},
                }
            }
        }
        stats
    }

    pub fn is_unchanged(&self) -> bool {
        self.inserted == 0 && self.deleted == 0 && self.moved == 0 && self.substituted == 0
    }
}
impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} equal, {} normalized, {} inserted, {} deleted, {} moved, {} substituted, {} ignored",
               self.equal, self.normalized, self.inserted, self.deleted, self.moved, self.substituted,
               self.ignored)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::myers;

    fn run(old: &str, new: &str, options: &DiffOptions) -> Result<(Vec<Line>, Vec<Line>, Vec<Unit>)> {
        let old = Line::split_text(old);
        let new = Line::split_text(new);
        let units = compute(&old, &new, options, &myers::diff)?;
        verify_coverage(&old, &new, units.iter().flat_map(Unit::edits))?;
        Ok((old, new, units))
    }

    fn kinds(units: &[Unit]) -> String {
        units.iter().map(|unit| unit.kind().tag()).collect()
    }

    #[test]
    fn trivial() -> Result<()> {
        let options = DiffOptions::default();
        assert!(run("", "", &options)?.2.is_empty());

        let (_, _, units) = run("a\nb\nc", "a\nb\nc", &options)?;
        assert_eq!(kinds(&units), " ");
        assert_eq!(units[0].edits().len(), 3);

        assert_eq!(kinds(&run("a\nb", "", &options)?.2), "-");
        assert_eq!(kinds(&run("", "a\nb", &options)?.2), "+");

        Ok(())
    }

    #[test]
    fn moved_line() -> Result<()> {
        let old = "a\nb\nc\nd\nmoved();\ne\nf\ng\nh";
        let new = "a\nb\nc\nd\ne\nf\ng\nh\nmoved();";
        let (_, _, units) = run(old, new, &DiffOptions::default())?;
        assert_eq!(kinds(&units), " M M");
        assert_eq!(units[1].edits()[0].old_number(), Some(5));
        assert_eq!(units[1].edits()[0].new_number(), Some(9));

        let stats = Stats::of(&units);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.equal, 8);

        let options = DiffOptions {
            detect_moves: false,
            ..Default::default()
        };
        let (_, _, units) = run(old, new, &options)?;
        assert_eq!(kinds(&units), " - +");

        Ok(())
    }

    #[test]
    fn commented_out_line() -> Result<()> {
        let (_, _, units) = run("a\nfoo(bar);\nb", "a\n// foo(bar);\nb", &DiffOptions::default())?;
        assert_eq!(kinds(&units), " C ");
        assert_eq!(units[1].kind().to_string(), "contains(// \u{2192}NEW_CONTAINS_OLD\u{2192})");
        Ok(())
    }

    #[test]
    fn normalization() -> Result<()> {
        let options = DiffOptions {
            normalization: Normalization::TrimWhitespace,
            ..Default::default()
        };
        let (_, _, units) = run("a\n  b\nc", "a\nb\nc", &options)?;
        assert_eq!(kinds(&units), " ~ ");
        Ok(())
    }

    #[test]
    fn ignore_patterns() -> Result<()> {
        let options = DiffOptions {
            ignore_patterns: vec![Regex::new("^#")?],
            ..Default::default()
        };
        let (_, _, units) = run("a\nb", "a\n# note\nb", &options)?;
        assert_eq!(kinds(&units), " I ");
        assert!(Stats::of(&units).is_unchanged());
        Ok(())
    }

    #[test]
    fn moved_blank_line_is_normalized_once() -> Result<()> {
        let (old, new, units) = run("a\n\nb\nc", "a\nb\nc\n\n", &DiffOptions::default())?;
        assert_eq!(kinds(&units), " ~ ~");
        assert_eq!(units[1], units[3]);
        verify_coverage(&old, &new, units.iter().flat_map(Unit::edits))?;

        let stats = Stats::of(&units);
        assert_eq!(stats.normalized, 1);
        assert_eq!(stats.equal, 3);
        assert!(stats.is_unchanged());
        Ok(())
    }

    #[test]
    fn moved_ignored_line() -> Result<()> {
        let options = DiffOptions {
            ignore_patterns: vec![Regex::new("^#")?],
            ..Default::default()
        };
        let (_, _, units) = run("a\n# note\nb\nc", "a\nb\nc\n# note", &options)?;
        assert_eq!(kinds(&units), " I I");
        assert_eq!(Stats::of(&units).ignored, 1);
        assert_eq!(crate::render::render_text(&units).matches("I 2 4 # note").count(), 2);
        Ok(())
    }

    #[test]
    fn custom_callbacks() -> Result<()> {
        let old = Line::split_text("a\nB\nc");
        let new = Line::split_text("a\nb\nc");

        let normalized = std::cell::Cell::new(0);
        let lowercase = |left: &str, right: &str| {
            normalized.set(normalized.get() + 1);
            NormalizedPair::new(left.to_lowercase(), right.to_lowercase())
        };
        let fallbacks = std::cell::Cell::new(0);
        let fallback = |old: &[Line], new: &[Line]| {
            fallbacks.set(fallbacks.get() + 1);
            crate::myers::diff(old, new)
        };

        let units = compute_with(&old, &new, &DiffOptions::default(), &lowercase, &fallback)?;
        assert_eq!(kinds(&units), " ~ ");
        assert!(normalized.get() > 0);
        assert_eq!(fallbacks.get(), 0);
        verify_coverage(&old, &new, units.iter().flat_map(Unit::edits))?;
        Ok(())
    }

    #[test]
    fn coverage_errors() {
        let old = Line::split_text("a\nb");
        let new = Line::split_text("a");
        let equal = Edit::paired(EditKind::Equal, old[0].clone(), new[0].clone());

        assert!(verify_coverage(&old, &new, &[equal.clone()]).is_err());
        assert!(verify_coverage(&old, &new, &[equal.clone(), Edit::delete(old[1].clone())]).is_ok());
        assert!(verify_coverage(&old, &new, &[
            equal.clone(),
            Edit::delete(old[1].clone()),
            Edit::delete(old[1].clone()),
        ]).is_err());
        assert!(verify_coverage(&old, &new, &[equal, Edit::delete(Line::new(2, "x"))]).is_err());
    }
}
