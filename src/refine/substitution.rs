// SPDX-License-Identifier: MIT

//! Substitution detection.
//!
//! Every maximal run of inserts and deletes is searched for delete/insert
//! pairs that should be shown as one changed line rather than as a removal
//! plus an addition:
//!
//! - one normalized text contains the other ([`EditKind::SubstitutionContains`]),
//! - the texts are similar by longest common subsequence ([`EditKind::Substitute`]),
//! - an indexed `for` loop was rewritten as an enhanced `for` loop over the
//!   same collection ([`EditKind::Substitute`]).
//!
//! Candidate pairs are only formed between lines that share two neighbouring
//! words (or their only word), and every candidate pair is checked once per
//! run. The accepted pairs must not cross each other. They are selected with the same
//! patience sort that the diff engine uses for anchors, and the gaps between
//! accepted pairs are searched again.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use crate::chain::MatchChain;
use crate::edit::*;
use crate::normalize::{normalize_new, normalize_old, NormalizeFn};
use crate::utils::*;

use super::SimilarityMode;

/// Minimum share of the longest common subsequence for two lines to count as
/// similar.
pub const SIMILARITY_THRESHOLD: f64 = 0.66;

/// Lines longer than this (in characters) are never compared by LCS.
pub const MAX_SIMILARITY_LENGTH: usize = 150;

/// An empty line is only "contained" in lines of at most this many characters.
const BLANK_CONTAINMENT_LIMIT: usize = 3;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[A-Za-z0-9_]+").unwrap();
    static ref INDEXED_FOR: Regex = Regex::new(concat!(
        r"^for[ \t]*\([ \t]*(?:[A-Za-z_][A-Za-z0-9_]*[ \t]+)?([A-Za-z_][A-Za-z0-9_]*)[ \t]*=[ \t]*0[ \t]*;",
        r"[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]*<[ \t]*([A-Za-z_][A-Za-z0-9_.]*?)[ \t]*\.[ \t]*",
        r"(?:size[ \t]*\([ \t]*\)|length)[ \t]*;",
    )).unwrap();
    static ref ENHANCED_FOR: Regex = Regex::new(concat!(
        r"^for[ \t]*\([ \t]*(?:final[ \t]+)?[A-Za-z_][A-Za-z0-9_<>\[\],.? \t]*?[ \t]+",
        r"[A-Za-z_][A-Za-z0-9_]*[ \t]*:[ \t]*([A-Za-z_][A-Za-z0-9_.]*)[ \t]*\)",
    )).unwrap();
}

/// Find the position of `shorter` inside `longer`, using the last occurrence.
///
/// An empty text is only considered contained in very short lines, so that a
/// blank line does not pair up with an arbitrary unrelated line.
pub fn containment(old: &str, new: &str) -> Option<Containment> {
    if old.len() == new.len() {
        return None
    }

    let (shorter, longer, direction) = if old.len() < new.len() {
        (old, new, ContainsDirection::NewContainsOld)
    } else {
        (new, old, ContainsDirection::OldContainsNew)
    };

    if shorter.is_empty() && longer.chars().count() > BLANK_CONTAINMENT_LIMIT {
        return None
    }

    let pos = longer.rfind(shorter)?;
    Some(Containment {
        prefix: longer[..pos].to_string(),
        direction,
        suffix: longer[pos + shorter.len()..].to_string(),
    })
}

/// Length of the longest common subsequence of characters.
pub fn lcs_length(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut row = vec![0usize; b.len() + 1];
    for &ca in &a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                std::cmp::max(above, row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// Whether the LCS of `a` and `b` covers at least [`SIMILARITY_THRESHOLD`] of
/// the longer (or, with `relative_to_shorter`, the shorter) text.
pub fn is_similar(a: &str, b: &str, relative_to_shorter: bool) -> bool {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a > MAX_SIMILARITY_LENGTH || len_b > MAX_SIMILARITY_LENGTH {
        return false
    }

    let reference = if relative_to_shorter {
        std::cmp::min(len_a, len_b)
    } else {
        std::cmp::max(len_a, len_b)
    };
    let required = SIMILARITY_THRESHOLD * reference as f64;

    // The LCS cannot be longer than the shorter text.
    if (std::cmp::min(len_a, len_b) as f64) < required {
        return false
    }

    let lcs = lcs_length(a, b);
    lcs > 0 && lcs as f64 >= required
}

fn indexed_for_iterable(text: &str) -> Option<&str> {
    let indexed = INDEXED_FOR.captures(text.trim())?;
    if indexed[1] != indexed[2] {
        return None
    }
    indexed.get(3).map(|m| m.as_str())
}

fn enhanced_for_iterable(text: &str) -> Option<&str> {
    ENHANCED_FOR.captures(text.trim())?.get(1).map(|m| m.as_str())
}

/// Recognize `for (int i = 0; i < xs.size(); i++)` rewritten as
/// `for (X x : xs)`.
pub fn is_enhanced_for_rewrite(old: &str, new: &str) -> bool {
    match (indexed_for_iterable(old), enhanced_for_iterable(new)) {
    (Some(indexed), Some(enhanced)) => indexed == enhanced,
    _ => false,
    }
}

#[derive(Debug)]
struct Candidate {
    /// Index of the edit within the run.
    pos: usize,
    line: Line,
    text: String,
    /// Similarity keys: pairs of nearby words, or the only word.
    keys: Vec<String>,
    words: Vec<String>,
}
impl Candidate {
    fn new(pos: usize, line: &Line, text: String, for_iterable: Option<&str>) -> Self {
        let spans: Vec<&str> = WORD.find_iter(&text).map(|m| m.as_str()).collect();
        let mut keys: Vec<String> = match spans.as_slice() {
        // Lines without words (braces, blank lines) form one group.
        [] => vec![String::new()],
        [word] => vec![word.to_string()],
        _ => spans.windows(2).map(|w| format!("{} {}", w[0], w[1]))
            .chain(spans.windows(3).map(|w| format!("{} .. {}", w[0], w[2])))
            .collect(),
        };
        if let Some(iterable) = for_iterable {
            keys.push(format!("for {}", iterable));
        }
        keys.sort();
        keys.dedup();

        let mut words: Vec<String> = spans.into_iter().map(str::to_string).collect();
        words.sort();
        words.dedup();

        Self {
            pos,
            line: line.clone(),
            text,
            keys,
            words,
        }
    }

    fn single_word(&self) -> Option<&str> {
        match self.words.as_slice() {
        [word] => Some(word.as_str()),
        _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Pairing {
    del: usize,
    ins: usize,
    kind: EditKind,
}

/// A candidate pair with the result of the strict checks.
type Classified = ((usize, usize), Option<EditKind>);

struct SubstitutionSearch {
    dels: Vec<Candidate>,
    ins: Vec<Candidate>,
    mode: SimilarityMode,
    /// All candidate pairs of the run, sorted by (delete, insert).
    classified: Vec<Classified>,
}
impl SubstitutionSearch {
    fn new(dels: Vec<Candidate>, ins: Vec<Candidate>, mode: SimilarityMode) -> Result<Self> {
        let mut search = Self {
            dels,
            ins,
            mode,
            classified: Vec::new(),
        };
        let classified = search.candidate_pairs().into_iter()
            .map(|(d, i)| Ok(((d, i), search.classify(d, i)?)))
            .collect::<Result<Vec<_>>>()?;
        search.classified = classified;
        Ok(search)
    }

    /// Pairs of (delete, insert) candidates that share a similarity key, or
    /// where a single-word line meets a line using that word. Sorted and
    /// without duplicates.
    fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut groups: HashMap<&str, (Vec<usize>, Vec<usize>)> = HashMap::new();
        for (d, del) in self.dels.iter().enumerate() {
            for key in &del.keys {
                groups.entry(key.as_str()).or_default().0.push(d);
            }
        }
        for (i, ins) in self.ins.iter().enumerate() {
            for key in &ins.keys {
                if let Some(group) = groups.get_mut(key.as_str()) {
                    group.1.push(i);
                }
            }
        }

        let mut pairs: Vec<(usize, usize)> = groups.values()
            .flat_map(|(ds, is)| ds.iter().flat_map(move |&d| is.iter().map(move |&i| (d, i))))
            .collect();

        let mut single_dels: HashMap<&str, Vec<usize>> = HashMap::new();
        for (d, del) in self.dels.iter().enumerate() {
            if let Some(word) = del.single_word() {
                single_dels.entry(word).or_default().push(d);
            }
        }
        let mut single_ins: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, ins) in self.ins.iter().enumerate() {
            if let Some(word) = ins.single_word() {
                single_ins.entry(word).or_default().push(i);
            }
            for word in &ins.words {
                if let Some(ds) = single_dels.get(word.as_str()) {
                    pairs.extend(ds.iter().map(|&d| (d, i)));
                }
            }
        }
        for (d, del) in self.dels.iter().enumerate() {
            for word in &del.words {
                if let Some(is) = single_ins.get(word.as_str()) {
                    pairs.extend(is.iter().map(|&i| (d, i)));
                }
            }
        }

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn classify(&self, d: usize, i: usize) -> Result<Option<EditKind>> {
        let (old, new) = (&self.dels[d], &self.ins[i]);
        if old.line.text() == new.line.text() {
            Err(format!("deleted line {} and inserted line {} are equal inside a substitution block",
                        old.line.number(), new.line.number()))?;
        }

        if old.text == new.text {
            return Ok(Some(EditKind::Normalize))
        }
        if let Some(contains) = containment(&old.text, &new.text) {
            return Ok(Some(EditKind::SubstitutionContains(contains)))
        }
        if self.mode >= SimilarityMode::Similar && is_similar(&old.text, &new.text, false) {
            return Ok(Some(EditKind::Substitute))
        }
        if is_enhanced_for_rewrite(old.line.text(), new.line.text()) {
            return Ok(Some(EditKind::Substitute))
        }
        Ok(None)
    }

    fn classify_permissive(&self, d: usize, i: usize) -> Option<EditKind> {
        is_similar(&self.dels[d].text, &self.ins[i].text, true).then_some(EditKind::Substitute)
    }

    /// Candidate pairs inside `dels` x `ins`.
    fn within<'s>(&'s self, dels: &Range<usize>, ins: &'s Range<usize>) -> impl Iterator<Item = &'s Classified> + 's {
        let low = self.classified.partition_point(|((d, _), _)| *d < dels.start);
        let high = self.classified.partition_point(|((d, _), _)| *d < dels.end);
        self.classified[low..high].iter().filter(move |((_, i), _)| ins.contains(i))
    }

    /// `permissive` caches the results of the permissive retry across gaps.
    fn search(&self, dels: Range<usize>, ins: Range<usize>,
              permissive: &mut HashMap<(usize, usize), Option<EditKind>>,
              out: &mut Vec<Pairing>) -> Result<()> {
        if dels.is_empty() || ins.is_empty() {
            return Ok(())
        }

        let mut found: HashMap<(usize, usize), EditKind> = self.within(&dels, &ins)
            .filter_map(|(pair, kind)| Some((*pair, kind.clone()?)))
            .collect();
        if found.is_empty() && self.mode == SimilarityMode::Permissive {
            for &((d, i), _) in self.within(&dels, &ins) {
                let kind = permissive.entry((d, i)).or_insert_with(|| self.classify_permissive(d, i));
                if let Some(kind) = kind {
                    found.insert((d, i), kind.clone());
                }
            }
        }
        if found.is_empty() {
            return Ok(())
        }

        let mut chain = MatchChain::new();
        let mut keys: Vec<(usize, usize)> = found.keys().copied().collect();
        keys.sort_unstable();
        for (d, i) in keys {
            chain.push(d, i);
        }
        chain.sort_by_old();
        let head = chain.patience_sort();
        let accepted: Vec<(usize, usize)> = chain.chain(head).map(|m| (m.old, m.new)).collect();

        log::trace!("substitutions: {} of {} candidates accepted in {:?} x {:?}",
                    accepted.len(), found.len(), dels, ins);

        let (mut low_del, mut low_ins) = (dels.start, ins.start);
        for (d, i) in accepted {
            self.search(low_del..d, low_ins..i, permissive, out)?;
            if let Some(kind) = found.remove(&(d, i)) {
                out.push(Pairing { del: d, ins: i, kind });
            }
            low_del = d + 1;
            low_ins = i + 1;
        }
        self.search(low_del..dels.end, low_ins..ins.end, permissive, out)
    }
}

/// Order a run of deletes, inserts and paired edits so that both the old and
/// the new line numbers ascend. Deletes are placed before inserts.
fn merge_ordered(edits: Vec<Edit>) -> Result<Vec<Edit>> {
    let mut olds: Vec<usize> = (0..edits.len()).filter(|&idx| edits[idx].old_line().is_some()).collect();
    let mut news: Vec<usize> = (0..edits.len()).filter(|&idx| edits[idx].new_line().is_some()).collect();
    olds.sort_by_key(|&idx| edits[idx].old_number());
    news.sort_by_key(|&idx| edits[idx].new_number());

    let mut order = Vec::with_capacity(edits.len());
    let (mut a, mut b) = (0, 0);
    loop {
        match (olds.get(a).copied(), news.get(b).copied()) {
        (Some(x), Some(y)) => {
            if edits[x].new_line().is_none() {
                order.push(x);
                a += 1;
            } else if edits[y].old_line().is_none() {
                order.push(y);
                b += 1;
            } else if x == y {
                order.push(x);
                a += 1;
                b += 1;
            } else {
                Err(format!("cannot order substitutions of old line {:?} and new line {:?}",
                            edits[x].old_number(), edits[y].new_number()))?;
            }
        },
        (Some(x), None) | (None, Some(x)) => {
            if edits[x].old_line().is_some() && edits[x].new_line().is_some() {
                Err(format!("substitution of old line {:?} is out of order", edits[x].old_number()))?;
            }
            order.push(x);
            if a < olds.len() { a += 1; } else { b += 1; }
        },
        (None, None) => break,
        }
    }

    let mut slots: Vec<Option<Edit>> = edits.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|idx| slots[idx].take()).collect())
}

fn substitute_run(run: Vec<Edit>, normalize: &NormalizeFn<'_>, mode: SimilarityMode) -> Result<Vec<Edit>> {
    let mut dels = Vec::new();
    let mut ins = Vec::new();
    for (pos, edit) in run.iter().enumerate() {
        match (edit.kind(), edit.old_line(), edit.new_line()) {
        (EditKind::Delete, Some(line), _) => {
            let iterable = indexed_for_iterable(line.text());
            dels.push(Candidate::new(pos, line, normalize_old(normalize, line.text()), iterable));
        },
        (EditKind::Insert, _, Some(line)) => {
            let iterable = enhanced_for_iterable(line.text());
            ins.push(Candidate::new(pos, line, normalize_new(normalize, line.text()), iterable));
        },
        _ => {},
        }
    }

    let search = SubstitutionSearch::new(dels, ins, mode)?;
    let mut pairings = Vec::new();
    search.search(0..search.dels.len(), 0..search.ins.len(), &mut HashMap::new(), &mut pairings)?;
    if pairings.is_empty() {
        return Ok(run)
    }

    log::debug!("substitutions: {} pairs in a run of {} edits", pairings.len(), run.len());

    let mut used_dels = HashSet::new();
    let mut used_ins = HashSet::new();
    let mut slots: Vec<Option<Edit>> = run.into_iter().map(Some).collect();
    for Pairing { del, ins, kind } in pairings {
        let (old, new) = (&search.dels[del], &search.ins[ins]);
        if !used_dels.insert(del) || !used_ins.insert(ins) {
            Err(format!("old line {} or new line {} is matched twice",
                        old.line.number(), new.line.number()))?;
        }
        slots[old.pos] = Some(Edit::paired(kind, old.line.clone(), new.line.clone()));
        slots[new.pos] = None;
    }

    merge_ordered(slots.into_iter().flatten().collect())
}

/// Pair up deletes and inserts inside every run of inserts and deletes.
///
/// Fails if the input violates the invariants of a diff: equal lines that
/// were left unmatched, or pairs that cannot be put into line order.
pub fn detect_substitutions(edits: Vec<Edit>, normalize: &NormalizeFn<'_>, mode: SimilarityMode) -> Result<Vec<Edit>> {
    fn flush(run: &mut Vec<Edit>, out: &mut Vec<Edit>, normalize: &NormalizeFn<'_>, mode: SimilarityMode) -> Result<()> {
        let has_del = run.iter().any(Edit::is_delete);
        let has_ins = run.iter().any(Edit::is_insert);
        let run = std::mem::take(run);
        if has_del && has_ins {
            out.extend(substitute_run(run, normalize, mode)?);
        } else {
            out.extend(run);
        }
        Ok(())
    }

    let mut out = Vec::with_capacity(edits.len());
    let mut run = Vec::new();
    for edit in edits {
        if edit.is_insert() || edit.is_delete() {
            run.push(edit);
        } else {
            flush(&mut run, &mut out, normalize, mode)?;
            out.push(edit);
        }
    }
    flush(&mut run, &mut out, normalize, mode)?;

    Ok(out)
}
