// SPDX-License-Identifier: MIT

//! Recursive patience diff.
//!
//! Lines that occur exactly once on each side of a slice (after
//! normalization) are used as anchors. The longest consistent sequence of
//! anchors is selected with a patience sort, and the gaps between anchors are
//! diffed recursively. Before recursing into a gap, matching lines are
//! scanned greedily from its head and its tail; this picks up common lines
//! that were not anchors because they are not unique.
//!
//! Slices without any anchor are handed to a fallback algorithm, typically
//! [`crate::myers::diff`], whose result is used verbatim.

use std::ops::Range;

use crate::chain::{Match, MatchChain};
use crate::counter::UniquenessCounter;
use crate::edit::*;
use crate::normalize::NormalizeFn;
use crate::utils::*;

pub type FallbackFn<'a> = dyn Fn(&[Line], &[Line]) -> Vec<Edit> + 'a;

/// Slices nested deeper than this are handed to the fallback.
pub const MAX_RECURSION_DEPTH: usize = 256;

/// Half-open ranges of positions (0-based indices into the input lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slice {
    low_old: usize,
    high_old: usize,
    low_new: usize,
    high_new: usize,
}
impl Slice {
    fn old(&self) -> Range<usize> {
        self.low_old..self.high_old
    }

    fn new(&self) -> Range<usize> {
        self.low_new..self.high_new
    }

    fn is_empty(&self) -> bool {
        self.old().is_empty() && self.new().is_empty()
    }
}

/// Split `anchors` into groups of matches that directly follow each other on
/// both sides. There is no gap to diff inside a group.
fn anchor_groups(anchors: &[Match]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut begin = 0;
    while begin < anchors.len() {
        let mut end = begin + 1;
        while end < anchors.len() && anchors[end - 1].is_followed_by(&anchors[end]) {
            end += 1;
        }
        groups.push(begin..end);
        begin = end;
    }
    groups
}

struct PatienceDiff<'a> {
    old: &'a [Line],
    new: &'a [Line],
    normalize: &'a NormalizeFn<'a>,
    fallback: &'a FallbackFn<'a>,
    max_depth: usize,
}
impl<'a> PatienceDiff<'a> {
    fn equivalent(&self, old: usize, new: usize) -> bool {
        (self.normalize)(self.old[old].text(), self.new[new].text()).is_equal()
    }

    fn match_edit(&self, old: usize, new: usize) -> Edit {
        let (old, new) = (&self.old[old], &self.new[new]);
        let kind = if old.text() == new.text() {
            EditKind::Equal
        } else {
            EditKind::Normalize
        };
        Edit::paired(kind, old.clone(), new.clone())
    }

    fn run_fallback(&self, slice: Slice, out: &mut Vec<Edit>) {
        out.extend((self.fallback)(&self.old[slice.old()], &self.new[slice.new()]));
    }

    fn diff_slice(&self, slice: Slice, depth: usize, out: &mut Vec<Edit>) {
        if slice.old().is_empty() {
            out.extend(slice.new().map(|idx| Edit::insert(self.new[idx].clone())));
            return
        }
        if slice.new().is_empty() {
            out.extend(slice.old().map(|idx| Edit::delete(self.old[idx].clone())));
            return
        }
        if depth >= self.max_depth {
            log::debug!("patience: recursion limit reached, falling back for {:?}", slice);
            self.run_fallback(slice, out);
            return
        }

        let mut counter = UniquenessCounter::new(self.normalize);
        for idx in slice.old() {
            counter.add_old(self.old[idx].text(), idx);
        }
        for idx in slice.new() {
            counter.add_new(self.new[idx].text(), idx);
        }

        let mut chain = MatchChain::new();
        for (old, new) in counter.unique() {
            chain.push(old, new);
        }
        if chain.is_empty() {
            log::trace!("patience: no unique lines in {:?}, falling back", slice);
            self.run_fallback(slice, out);
            return
        }

        chain.sort_by_old();
        let head = chain.patience_sort();
        let anchors: Vec<Match> = chain.chain(head).copied().collect();

        log::trace!("patience: {} of {} unique lines anchored in {:?}",
                    anchors.len(), chain.len(), slice);

        let mut low_old = slice.low_old;
        let mut low_new = slice.low_new;
        for group in anchor_groups(&anchors) {
            let first = anchors[group.start];
            self.diff_gap(Slice {
                low_old,
                high_old: first.old,
                low_new,
                high_new: first.new,
            }, depth, out);

            let last = anchors[group.end - 1];
            for anchor in &anchors[group] {
                out.push(self.match_edit(anchor.old, anchor.new));
            }

            low_old = last.old + 1;
            low_new = last.new + 1;
        }

        self.diff_gap(Slice {
            low_old,
            high_old: slice.high_old,
            low_new,
            high_new: slice.high_new,
        }, depth, out);
    }

    /// Diff the region between two anchor groups, after consuming matching
    /// lines from its head and its tail.
    fn diff_gap(&self, mut slice: Slice, depth: usize, out: &mut Vec<Edit>) {
        assert!(slice.low_old <= slice.high_old && slice.low_new <= slice.high_new);

        let count = std::cmp::min(slice.old().len(), slice.new().len());
        let head = (0..count)
            .take_while(|&k| self.equivalent(slice.low_old + k, slice.low_new + k))
            .count();
        for k in 0..head {
            out.push(self.match_edit(slice.low_old + k, slice.low_new + k));
        }
        slice.low_old += head;
        slice.low_new += head;

        let count = count - head;
        let tail = (0..count)
            .take_while(|&k| self.equivalent(slice.high_old - 1 - k, slice.high_new - 1 - k))
            .count();
        slice.high_old -= tail;
        slice.high_new -= tail;

        if !slice.is_empty() {
            self.diff_slice(slice, depth + 1, out);
        }

        for k in 0..tail {
            out.push(self.match_edit(slice.high_old + k, slice.high_new + k));
        }
    }
}

/// Compute an edit script that turns `old` into `new`.
///
/// The result only contains [`EditKind::Insert`], [`EditKind::Delete`],
/// [`EditKind::Equal`] and [`EditKind::Normalize`] edits (plus whatever the
/// fallback returns). Reading the old sides of all edits in order yields
/// `old`; reading the new sides yields `new`.
pub fn diff(old: &[Line], new: &[Line], normalize: &NormalizeFn<'_>, fallback: &FallbackFn<'_>) -> Vec<Edit> {
    let engine = PatienceDiff {
        old,
        new,
        normalize,
        fallback,
        max_depth: MAX_RECURSION_DEPTH,
    };

    let mut edits = Vec::with_capacity(std::cmp::max(old.len(), new.len()));
    let slice = Slice {
        low_old: 0,
        high_old: old.len(),
        low_new: 0,
        high_new: new.len(),
    };
    if !slice.is_empty() {
        engine.diff_slice(slice, 0, &mut edits);
    }

    log::debug!("patience: {} old and {} new lines -> {} edits", old.len(), new.len(), edits.len());

    #[cfg(feature = "debug-diff")]
    if let Err(err) = verify(old, new, &edits) {
        panic!("patience diff produced an invalid script: {}", err);
    }

    edits
}

/// Check that the old and new sides of `edits` reproduce `old` and `new`.
pub fn verify(old: &[Line], new: &[Line], edits: &[Edit]) -> Result<()> {
    fn check<'e>(side: &str, expected: &[Line], actual: impl Iterator<Item = &'e Line>) -> Result<()> {
        let mut expected = expected.iter();
        for line in actual {
            match expected.next() {
            Some(want) if want == line => {},
            Some(want) => Err(format!("{} line {} found where line {} was expected",
                                      side, line.number(), want.number()))?,
            None => Err(format!("extra {} line {}", side, line.number()))?,
            }
        }
        if let Some(missing) = expected.next() {
            Err(format!("{} line {} is not covered", side, missing.number()))?;
        }
        Ok(())
    }

    check("old", old, edits.iter().filter_map(Edit::old_line))?;
    check("new", new, edits.iter().filter_map(Edit::new_line))
}
