// SPDX-License-Identifier: MIT

//! Passes over combined units that downgrade changes which are not really
//! changes.

use std::collections::HashSet;

use regex::Regex;

use crate::edit::*;
use crate::normalize::{normalize_new, normalize_old, NormalizeFn};

/// A substitution or replacement block whose old lines, concatenated, equal
/// its new lines, concatenated, only re-wraps text: reclassify it as
/// [`EditKind::Normalize`].
pub fn reclassify_split_lines(units: Vec<Unit>, normalize: &NormalizeFn<'_>) -> Vec<Unit> {
    units.into_iter()
        .map(|unit| {
            let Unit::Block(block) = &unit else {
                return unit
            };
            if !block.kind().is_substitution() && *block.kind() != EditKind::Replacement {
                return unit
            }

            let old: String = block.edits().iter()
                .filter_map(Edit::old_line)
                .map(|line| normalize_old(normalize, line.text()))
                .collect();
            let new: String = block.edits().iter()
                .filter_map(Edit::new_line)
                .map(|line| normalize_new(normalize, line.text()))
                .collect();

            if old == new {
                log::trace!("reclassify: block of {} edits is re-wrapped text", block.edits().len());
                unit.with_kind(EditKind::Normalize)
            } else {
                unit
            }
        })
        .collect()
}

fn is_blank_edit(edit: &Edit, normalize: &NormalizeFn<'_>) -> bool {
    edit.old_line().map_or(true, |line| normalize_old(normalize, line.text()).is_empty()) &&
    edit.new_line().map_or(true, |line| normalize_new(normalize, line.text()).is_empty())
}

fn moves_of(unit: &Unit) -> impl Iterator<Item = (Option<usize>, Option<usize>)> + '_ {
    unit.edits().iter()
        .filter(|edit| edit.kind().is_move())
        .map(|edit| (edit.old_number(), edit.new_number()))
}

/// Give `kind` to every unit selected by `qualifies`.
///
/// The two copies of a move usually sit in different units. A unit holding a
/// move is only reclassified if every other unit holding that move is
/// reclassified as well, so both copies keep agreeing on their kind.
fn reclassify_where(units: Vec<Unit>, kind: EditKind, qualifies: impl Fn(&Unit) -> bool) -> Vec<Unit> {
    let mut selected: Vec<bool> = units.iter().map(&qualifies).collect();
    loop {
        let blocked: HashSet<_> = units.iter().zip(&selected)
            .filter(|(_, selected)| !**selected)
            .flat_map(|(unit, _)| moves_of(unit))
            .collect();

        let mut changed = false;
        for (unit, selected) in units.iter().zip(selected.iter_mut()) {
            if *selected && moves_of(unit).any(|edit| blocked.contains(&edit)) {
                *selected = false;
                changed = true;
            }
        }
        if !changed {
            break
        }
    }

    units.into_iter()
        .zip(selected)
        .map(|(unit, selected)| if selected { unit.with_kind(kind.clone()) } else { unit })
        .collect()
}

/// Changes that only touch lines which normalize to empty text are
/// reclassified as [`EditKind::Normalize`].
pub fn reclassify_blank_lines(units: Vec<Unit>, normalize: &NormalizeFn<'_>) -> Vec<Unit> {
    reclassify_where(units, EditKind::Normalize, |unit| {
        !matches!(unit.kind(), EditKind::Equal | EditKind::Normalize) &&
        unit.edits().iter().all(|edit| is_blank_edit(edit, normalize))
    })
}

/// Changes whose lines all match one of `patterns` are reclassified as
/// [`EditKind::Ignore`].
pub fn reclassify_ignored(units: Vec<Unit>, patterns: &[Regex]) -> Vec<Unit> {
    if patterns.is_empty() {
        return units
    }

    let ignored = |line: &Line| patterns.iter().any(|pattern| pattern.is_match(line.text()));
    reclassify_where(units, EditKind::Ignore, |unit| {
        !matches!(unit.kind(), EditKind::Equal | EditKind::Normalize | EditKind::Ignore) &&
        unit.edits().iter().all(|edit| {
            edit.old_line().map_or(true, ignored) && edit.new_line().map_or(true, ignored)
        })
    })
}
