// SPDX-License-Identifier: MIT

//! Move detection.
//!
//! A deleted line and an inserted line with identical text are a move if their
//! normalized text is unique among all remaining inserts and deletes. Moves
//! are grown outwards over neighbouring delete/insert pairs with equal text,
//! which may make other lines unique, so the whole pass repeats until it stops
//! growing moves.
//!
//! A move replaces both the delete and the insert entry of the list, i.e. the
//! same [`EditKind::Move`] edit appears once at its old position and once at
//! its new position.

use std::collections::HashMap;

use crate::counter::UniquenessCounter;
use crate::edit::*;
use crate::normalize::NormalizeFn;

struct MovePass<'e> {
    edits: &'e mut Vec<Edit>,
    /// Old line number -> index of the delete edit.
    deletes: HashMap<usize, usize>,
    /// New line number -> index of the insert edit.
    inserts: HashMap<usize, usize>,
}
impl<'e> MovePass<'e> {
    fn new(edits: &'e mut Vec<Edit>) -> Self {
        let mut deletes = HashMap::new();
        let mut inserts = HashMap::new();
        for (idx, edit) in edits.iter().enumerate() {
            match (edit.kind(), edit.old_number(), edit.new_number()) {
            (EditKind::Delete, Some(old), _) => { deletes.insert(old, idx); },
            (EditKind::Insert, _, Some(new)) => { inserts.insert(new, idx); },
            _ => {},
            }
        }
        Self {
            edits,
            deletes,
            inserts,
        }
    }

    /// Turn the delete of old line `old` and the insert of new line `new` into
    /// a move if both exist and have the same raw text.
    fn try_move(&mut self, old: usize, new: usize) -> bool {
        let (Some(&del), Some(&ins)) = (self.deletes.get(&old), self.inserts.get(&new)) else {
            return false
        };
        let (Some(old_line), Some(new_line)) = (self.edits[del].old_line(), self.edits[ins].new_line()) else {
            return false
        };
        if old_line.text() != new_line.text() {
            return false
        }

        let edit = Edit::paired(EditKind::Move, old_line.clone(), new_line.clone());
        self.edits[del] = edit.clone();
        self.edits[ins] = edit;
        self.deletes.remove(&old);
        self.inserts.remove(&new);
        true
    }

    /// Grow the move at `(old, new)` in both directions. Returns the number of
    /// additional moves.
    fn extend(&mut self, old: usize, new: usize) -> usize {
        let mut count = 0;

        let (mut o, mut n) = (old, new);
        while o > 1 && n > 1 && self.try_move(o - 1, n - 1) {
            o -= 1;
            n -= 1;
            count += 1;
        }

        let (mut o, mut n) = (old, new);
        while self.try_move(o + 1, n + 1) {
            o += 1;
            n += 1;
            count += 1;
        }

        count
    }
}

/// Reclassify delete/insert pairs of identical, unique lines as moves.
pub fn detect_moves(mut edits: Vec<Edit>, normalize: &NormalizeFn<'_>) -> Vec<Edit> {
    for iteration in 1.. {
        let mut pass = MovePass::new(&mut edits);

        let mut counter = UniquenessCounter::new(normalize);
        for edit in pass.edits.iter() {
            match edit.kind() {
            EditKind::Delete => if let Some(line) = edit.old_line() {
                counter.add_old(line.text(), line.number());
            },
            EditKind::Insert => if let Some(line) = edit.new_line() {
                counter.add_new(line.text(), line.number());
            },
            _ => {},
            }
        }
        let unique: Vec<(usize, usize)> = counter.unique().collect();

        let mut moves = Vec::new();
        for (old, new) in unique {
            if pass.try_move(old, new) {
                moves.push((old, new));
            }
        }

        let mut extended = 0;
        for (old, new) in moves.iter().copied() {
            extended += pass.extend(old, new);
        }

        log::debug!("moves: iteration {}: {} unique, {} extended", iteration, moves.len(), extended);

        if extended == 0 {
            break
        }
    }

    edits
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::normalize;

    fn moves(edits: &[Edit]) -> Vec<(usize, usize)> {
        let mut moves: Vec<_> = edits.iter()
            .filter(|edit| edit.kind().is_move())
            .filter_map(|edit| Some((edit.old_number()?, edit.new_number()?)))
            .collect();
        moves.sort();
        moves.dedup();
        moves
    }

    #[test]
    fn single_line_move() {
        let edits = vec![
            Edit::delete(Line::new(5, "moved();")),
            Edit::insert(Line::new(9, "moved();")),
        ];
        let edits = detect_moves(edits, &normalize::identity);
        assert_eq!(moves(&edits), vec![(5, 9)]);
        assert!(edits.iter().all(|edit| edit.kind().is_move()));
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0], edits[1]);
    }

    #[test]
    fn grows_over_duplicates() {
        // "}" is not unique but sits next to a unique move.
        let edits = vec![
            Edit::delete(Line::new(2, "fn f() {")),
            Edit::delete(Line::new(3, "}")),
            Edit::delete(Line::new(4, "}")),
            Edit::insert(Line::new(10, "fn f() {")),
            Edit::insert(Line::new(11, "}")),
        ];
        let edits = detect_moves(edits, &normalize::identity);
        assert_eq!(moves(&edits), vec![(2, 10), (3, 11)]);
        assert!(edits[2].is_delete());
    }

    #[test]
    fn extension_creates_uniqueness() {
        // After "a"/"x" are moved via extension, the remaining "x" lines are
        // unique and move in the next iteration.
        let edits = vec![
            Edit::delete(Line::new(1, "a")),
            Edit::delete(Line::new(2, "x")),
            Edit::delete(Line::new(5, "x")),
            Edit::insert(Line::new(20, "a")),
            Edit::insert(Line::new(21, "x")),
            Edit::insert(Line::new(30, "x")),
        ];
        let edits = detect_moves(edits, &normalize::identity);
        assert_eq!(moves(&edits), vec![(1, 20), (2, 21), (5, 30)]);
    }

    #[test]
    fn different_raw_text_is_not_a_move() {
        let edits = vec![
            Edit::delete(Line::new(1, "  x")),
            Edit::insert(Line::new(4, "x")),
        ];
        let edits = detect_moves(edits, &normalize::trim_whitespace);
        assert!(moves(&edits).is_empty());
    }
}
