// SPDX-License-Identifier: MIT

//! Minimal O(ND) diff (Myers, "An O(ND) Difference Algorithm and Its
//! Variations"), used as the default fallback of the patience engine.
//!
//! Lines are compared by raw text. Within every changed region, deletions are
//! emitted before insertions.

use crate::edit::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

fn shortest_edit(old: &[Line], new: &[Line]) -> Vec<Op> {
    let n = old.len() as isize;
    let m = new.len() as isize;
    let max = n + m;
    let offset = max + 1;
    let at = |k: isize| (k + offset) as usize;

    let mut v = vec![0isize; 2 * max as usize + 3];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    let mut final_d = 0;
    'search: for d in 0..=max {
        trace.push(v.clone());
        for k in (-d..=d).step_by(2) {
            let mut x = if k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]) {
                v[at(k + 1)]
            } else {
                v[at(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && old[x as usize].text() == new[y as usize].text() {
                x += 1;
                y += 1;
            }
            v[at(k)] = x;

            if x >= n && y >= m {
                final_d = d;
                break 'search;
            }
        }
    }

    let mut ops = Vec::new();
    let (mut x, mut y) = (n, m);
    for d in (0..=final_d).rev() {
        let v = &trace[d as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[at(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(Op::Equal(x as usize - 1, y as usize - 1));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(Op::Insert(y as usize - 1));
            } else {
                ops.push(Op::Delete(x as usize - 1));
            }
        }
        x = prev_x;
        y = prev_y;
    }

    ops.reverse();
    ops
}

/// Diff `old` against `new`, producing `Equal`, `Delete` and `Insert` edits.
pub fn diff(old: &[Line], new: &[Line]) -> Vec<Edit> {
    if old.is_empty() && new.is_empty() {
        return Vec::new();
    }

    let mut edits = Vec::with_capacity(old.len() + new.len());
    let mut inserts = Vec::new();
    for op in shortest_edit(old, new) {
        match op {
        Op::Equal(o, n) => {
            edits.append(&mut inserts);
            edits.push(Edit::paired(EditKind::Equal, old[o].clone(), new[n].clone()));
        },
        Op::Delete(o) => edits.push(Edit::delete(old[o].clone())),
        Op::Insert(n) => inserts.push(Edit::insert(new[n].clone())),
        }
    }
    edits.append(&mut inserts);
    edits
}
