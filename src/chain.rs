// SPDX-License-Identifier: MIT

//! Candidate anchor points and the patience sort that selects a consistent
//! (non-crossing) subset of them.
//!
//! Matches live in an arena and refer to each other by index. The links are
//! scratch state: they are only meaningful after [`MatchChain::patience_sort`]
//! and are overwritten by the next sort.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub old: usize,
    pub new: usize,
    prev: Option<usize>,
    next: Option<usize>,
}
impl Match {
    pub fn next(&self) -> Option<usize> {
        self.next
    }

    /// Whether `other` continues `self` directly on both sides.
    pub fn is_followed_by(&self, other: &Match) -> bool {
        other.old == self.old + 1 && other.new == self.new + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchChain {
    matches: Vec<Match>,
}
impl MatchChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate match and return its index in the arena.
    pub fn push(&mut self, old: usize, new: usize) -> usize {
        self.matches.push(Match {
            old,
            new,
            prev: None,
            next: None,
        });
        self.matches.len() - 1
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Match {
        &self.matches[idx]
    }

    /// Bring the matches into the input order expected by the patience sort.
    ///
    /// Matches that share an old position are ordered by descending new
    /// position so that at most one of them can be part of a chain. Returns
    /// the permutation as a list of previous indices.
    pub fn sort_by_old(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.matches.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.matches[a], &self.matches[b]);
            a.old.cmp(&b.old).then(b.new.cmp(&a.new))
        });
        self.matches = order.iter().map(|&idx| self.matches[idx]).collect();
        order
    }

    /// Find the longest chain of matches with strictly increasing new
    /// positions, taking the matches in arena order (which must be sorted by
    /// old position). Returns the index of the first match of the chain; walk
    /// it with [`Match::next`] or [`MatchChain::chain`].
    ///
    /// `stacks[i]` holds the most recent match that ends a chain of length
    /// `i + 1`. A later match replaces an earlier one of the same length.
    pub fn patience_sort(&mut self) -> Option<usize> {
        debug_assert!(self.matches.windows(2).all(|w| w[0].old <= w[1].old));

        let mut stacks: Vec<usize> = Vec::new();
        for idx in 0..self.matches.len() {
            let new = self.matches[idx].new;
            let pos = stacks.partition_point(|&top| self.matches[top].new < new);

            let pred = pos.checked_sub(1).map(|p| stacks[p]);
            let current = &mut self.matches[idx];
            current.prev = pred;
            current.next = None;

            if pos == stacks.len() {
                stacks.push(idx);
            } else {
                stacks[pos] = idx;
            }
        }

        let mut current = *stacks.last()?;
        while let Some(prev) = self.matches[current].prev {
            self.matches[prev].next = Some(current);
            current = prev;
        }
        Some(current)
    }

    pub fn chain(&self, head: Option<usize>) -> impl Iterator<Item = &Match> + '_ {
        std::iter::successors(head, move |&idx| self.matches[idx].next)
            .map(move |idx| &self.matches[idx])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn longest(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
        let mut chain = MatchChain::new();
        for &(old, new) in pairs {
            chain.push(old, new);
        }
        chain.sort_by_old();
        let head = chain.patience_sort();
        chain.chain(head).map(|m| (m.old, m.new)).collect()
    }

    #[test]
    fn crossing_matches() {
        // (2,3) and (3,2) cross; the later one wins the tie for length 2.
        assert_eq!(longest(&[(1, 1), (2, 3), (3, 2), (4, 4)]), vec![(1, 1), (3, 2), (4, 4)]);
    }

    #[test]
    fn unsorted_input() {
        let result = longest(&[(4, 4), (1, 3), (2, 0), (3, 1)]);
        assert_eq!(result, vec![(2, 0), (3, 1), (4, 4)]);
    }

    #[test]
    fn shared_old_position() {
        let result = longest(&[(1, 5), (1, 6), (2, 7)]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[1], (2, 7));
    }

    #[test]
    fn empty() {
        assert!(longest(&[]).is_empty());
    }

    #[test]
    fn single() {
        assert_eq!(longest(&[(3, 9)]), vec![(3, 9)]);
    }
}
