// SPDX-License-Identifier: MIT

use crate::edit::*;

/// How a line number of an edit relates to the run it might join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Absent,
    /// The run has no line on this side yet.
    Fresh,
    Continuing,
    Broken,
}
impl Side {
    fn of(number: Option<usize>, last: Option<usize>) -> Self {
        match (number, last) {
        (None, _) => Side::Absent,
        (Some(_), None) => Side::Fresh,
        (Some(number), Some(last)) if number == last + 1 => Side::Continuing,
        (Some(_), Some(_)) => Side::Broken,
        }
    }
}

#[derive(Default)]
struct Run {
    edits: Vec<Edit>,
    last_old: Option<usize>,
    last_new: Option<usize>,
}
impl Run {
    fn accepts(&self, edit: &Edit, combine_replacements: bool) -> bool {
        let Some(prev) = self.edits.last() else {
            return true
        };

        let same_kind = prev.kind().same_variant(edit.kind());
        let replacement = combine_replacements && prev.kind().is_combinable() && edit.kind().is_combinable();
        if !same_kind && !replacement {
            return false
        }

        let old = Side::of(edit.old_number(), self.last_old);
        let new = Side::of(edit.new_number(), self.last_new);
        if old == Side::Continuing || new == Side::Continuing {
            return true
        }
        old != Side::Broken && new != Side::Broken && (old == Side::Fresh || new == Side::Fresh)
    }

    fn push(&mut self, edit: Edit) {
        if let Some(old) = edit.old_number() {
            self.last_old = Some(old);
        }
        if let Some(new) = edit.new_number() {
            self.last_new = Some(new);
        }
        self.edits.push(edit);
    }

    fn take(&mut self) -> Option<Unit> {
        Unit::from_edits(std::mem::take(self).edits)
    }
}

/// Group runs of consecutive edits into [`Block`]s.
///
/// An edit joins the current run if it continues the run's old or new line
/// numbers and has the same kind as the previous edit. With
/// `combine_replacements`, inserts, deletes and substitutions may be mixed;
/// such a block has kind [`EditKind::Replacement`] unless all of its edits
/// agree.
pub fn combine_to_units(edits: Vec<Edit>, combine_replacements: bool) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut run = Run::default();
    for edit in edits {
        if !run.accepts(&edit, combine_replacements) {
            units.extend(run.take());
        }
        run.push(edit);
    }
    units.extend(run.take());

    log::debug!("combine: {} units", units.len());
    units
}

#[cfg(test)]
mod test {
    use super::*;

    fn equal(old: usize, new: usize) -> Edit {
        Edit::paired(EditKind::Equal, Line::new(old, "x"), Line::new(new, "x"))
    }

    fn ins(new: usize) -> Edit {
        Edit::insert(Line::new(new, "i"))
    }

    fn del(old: usize) -> Edit {
        Edit::delete(Line::new(old, "d"))
    }

    fn shape(units: &[Unit]) -> Vec<(char, usize)> {
        units.iter().map(|unit| (unit.kind().tag(), unit.edits().len())).collect()
    }

    #[test]
    fn consecutive_inserts() {
        let units = combine_to_units(vec![ins(10), ins(11)], true);
        assert_eq!(shape(&units), vec![('+', 2)]);
        assert!(matches!(units[0], Unit::Block(_)));

        let units = combine_to_units(vec![ins(10), ins(12)], true);
        assert_eq!(shape(&units), vec![('+', 1), ('+', 1)]);
        assert!(matches!(units[0], Unit::Single(_)));
    }

    #[test]
    fn identical_sequences_form_one_block() {
        let units = combine_to_units((1..=4).map(|n| equal(n, n)).collect(), false);
        assert_eq!(shape(&units), vec![(' ', 4)]);
    }

    #[test]
    fn replacements() {
        let edits = || vec![
            equal(1, 1),
            del(2),
            del(3),
            Edit::paired(EditKind::Substitute, Line::new(4, "a"), Line::new(2, "b")),
            ins(3),
            equal(5, 4),
        ];
        assert_eq!(
            shape(&combine_to_units(edits(), true)),
            vec![(' ', 1), ('R', 4), (' ', 1)],
        );
        assert_eq!(
            shape(&combine_to_units(edits(), false)),
            vec![(' ', 1), ('-', 2), ('S', 1), ('+', 1), (' ', 1)],
        );
    }

    #[test]
    fn homogeneous_run_keeps_its_kind() {
        let units = combine_to_units(vec![del(2), del(3)], true);
        assert_eq!(shape(&units), vec![('-', 2)]);
    }
}
