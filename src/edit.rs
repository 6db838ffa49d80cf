// SPDX-License-Identifier: MIT

//! Lines, edit classifications and the edit script produced by the diff.
//!
//! The patience engine only ever produces [`EditKind::Insert`],
//! [`EditKind::Delete`], [`EditKind::Equal`] and [`EditKind::Normalize`]. All
//! other kinds are introduced by the passes in [`crate::refine`].

use std::fmt;
use std::sync::Arc;

use crate::utils::*;

/// A single line of input. Line numbers are 1-based and stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    number: usize,
    text: Arc<str>,
}
impl Line {
    pub fn new(number: usize, text: impl Into<Arc<str>>) -> Self {
        assert!(number >= 1, "line numbers are 1-based");
        Self {
            number,
            text: text.into(),
        }
    }

    /// Split `text` into lines (without terminators), numbered from 1.
    pub fn split_text(text: &str) -> Vec<Line> {
        text.lines()
            .enumerate()
            .map(|(idx, line)| Line::new(idx + 1, line))
            .collect()
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The result of normalizing a pair of raw line texts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedPair {
    pub text_left: String,
    pub text_right: String,
}
impl NormalizedPair {
    pub fn new(text_left: impl Into<String>, text_right: impl Into<String>) -> Self {
        Self {
            text_left: text_left.into(),
            text_right: text_right.into(),
        }
    }

    pub fn is_equal(&self) -> bool {
        self.text_left == self.text_right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainsDirection {
    OldContainsNew,
    NewContainsOld,
}
impl fmt::Display for ContainsDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
        ContainsDirection::OldContainsNew => write!(f, "OLD_CONTAINS_NEW"),
        ContainsDirection::NewContainsOld => write!(f, "NEW_CONTAINS_OLD"),
        }
    }
}

/// Describes how the shorter side of a substitution sits inside the longer
/// side: `longer == prefix + shorter + suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Containment {
    pub prefix: String,
    pub direction: ContainsDirection,
    pub suffix: String,
}
impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{2192}{}\u{2192}{}", self.prefix, self.direction, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditKind {
    Insert,
    Delete,
    Equal,
    /// Lines differ in raw text but are equal after normalization.
    Normalize,
    Move,
    Substitute,
    SubstitutionContains(Containment),
    Ignore,
    /// A block that merges heterogeneous insert/delete/substitution edits.
    Replacement,
}
impl EditKind {
    pub fn tag(&self) -> char {
        match self {
        EditKind::Insert => '+',
        EditKind::Delete => '-',
        EditKind::Equal => ' ',
        EditKind::Normalize => '~',
        EditKind::Move => 'M',
        EditKind::Substitute => 'S',
        EditKind::SubstitutionContains(_) => 'C',
        EditKind::Ignore => 'I',
        EditKind::Replacement => 'R',
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, EditKind::Move)
    }

    pub fn is_substitution(&self) -> bool {
        matches!(self, EditKind::Substitute | EditKind::SubstitutionContains(_))
    }

    /// Kinds that may be merged into a [`EditKind::Replacement`] block.
    pub fn is_combinable(&self) -> bool {
        matches!(self, EditKind::Insert | EditKind::Delete) || self.is_substitution()
    }

    /// Compare kinds while ignoring the payload of data-carrying variants.
    pub fn same_variant(&self, other: &EditKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn name(&self) -> &'static str {
        match self {
        EditKind::Insert => "insert",
        EditKind::Delete => "delete",
        EditKind::Equal => "equal",
        EditKind::Normalize => "normalize",
        EditKind::Move => "move",
        EditKind::Substitute => "substitute",
        EditKind::SubstitutionContains(_) => "contains",
        EditKind::Ignore => "ignore",
        EditKind::Replacement => "replacement",
        }
    }
}
impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
        EditKind::SubstitutionContains(containment) => write!(f, "contains({})", containment),
        _ => write!(f, "{}", self.name()),
        }
    }
}

/// One entry of the edit script. At least one of the two sides is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    kind: EditKind,
    old_line: Option<Line>,
    new_line: Option<Line>,
}
impl Edit {
    pub fn new(kind: EditKind, old_line: Option<Line>, new_line: Option<Line>) -> Result<Self> {
        if old_line.is_none() && new_line.is_none() {
            Err(format!("{} edit must reference an old or a new line", kind.name()))?;
        }
        Ok(Self {
            kind,
            old_line,
            new_line,
        })
    }

    pub fn insert(new_line: Line) -> Self {
        Self {
            kind: EditKind::Insert,
            old_line: None,
            new_line: Some(new_line),
        }
    }

    pub fn delete(old_line: Line) -> Self {
        Self {
            kind: EditKind::Delete,
            old_line: Some(old_line),
            new_line: None,
        }
    }

    /// An edit that relates a line on each side.
    pub fn paired(kind: EditKind, old_line: Line, new_line: Line) -> Self {
        Self {
            kind,
            old_line: Some(old_line),
            new_line: Some(new_line),
        }
    }

    pub fn kind(&self) -> &EditKind {
        &self.kind
    }

    pub fn old_line(&self) -> Option<&Line> {
        self.old_line.as_ref()
    }

    pub fn new_line(&self) -> Option<&Line> {
        self.new_line.as_ref()
    }

    pub fn old_number(&self) -> Option<usize> {
        self.old_line.as_ref().map(Line::number)
    }

    pub fn new_number(&self) -> Option<usize> {
        self.new_line.as_ref().map(Line::number)
    }

    pub fn is_insert(&self) -> bool {
        self.kind == EditKind::Insert
    }

    pub fn is_delete(&self) -> bool {
        self.kind == EditKind::Delete
    }

    pub fn with_kind(self, kind: EditKind) -> Self {
        Self { kind, ..self }
    }
}

/// A non-empty run of edits that is presented as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: EditKind,
    edits: Vec<Edit>,
}
impl Block {
    /// The block kind is the common kind of all edits, or
    /// [`EditKind::Replacement`] if they disagree. Containment edits with
    /// different prefixes or suffixes make a [`EditKind::Substitute`] block.
    pub fn new(edits: Vec<Edit>) -> Result<Self> {
        let Some(first) = edits.first() else {
            return Err("a block must contain at least one edit")?;
        };
        let kind = if edits.iter().all(|edit| edit.kind == first.kind) {
            first.kind.clone()
        } else if edits.iter().all(|edit| edit.kind.same_variant(&first.kind)) {
            EditKind::Substitute
        } else {
            EditKind::Replacement
        };
        Ok(Self { kind, edits })
    }

    pub fn kind(&self) -> &EditKind {
        &self.kind
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn with_kind(self, kind: EditKind) -> Self {
        Self { kind, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Single(Edit),
    Block(Block),
}
impl Unit {
    /// A single edit stays single; longer runs become a [`Block`].
    pub fn from_edits(mut edits: Vec<Edit>) -> Option<Unit> {
        match edits.len() {
        0 => None,
        1 => edits.pop().map(Unit::Single),
        _ => Block::new(edits).ok().map(Unit::Block),
        }
    }

    pub fn kind(&self) -> &EditKind {
        match self {
        Unit::Single(edit) => edit.kind(),
        Unit::Block(block) => block.kind(),
        }
    }

    pub fn edits(&self) -> &[Edit] {
        match self {
        Unit::Single(edit) => std::slice::from_ref(edit),
        Unit::Block(block) => block.edits(),
        }
    }

    /// The edits paired with the kind they are presented as. That is the kind
    /// of the unit, except in replacement blocks where every edit keeps its
    /// own kind.
    pub fn classified_edits(&self) -> impl Iterator<Item = (&EditKind, &Edit)> + '_ {
        let unit_kind = self.kind();
        self.edits().iter().map(move |edit| match unit_kind {
        EditKind::Replacement => (edit.kind(), edit),
        kind => (kind, edit),
        })
    }

    pub fn with_kind(self, kind: EditKind) -> Self {
        match self {
        Unit::Single(edit) => Unit::Single(edit.with_kind(kind)),
        Unit::Block(block) => Unit::Block(block.with_kind(kind)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn edit_requires_a_line() {
        assert!(Edit::new(EditKind::Insert, None, None).is_err());
        assert!(Edit::new(EditKind::Insert, None, Some(Line::new(1, "x"))).is_ok());
        assert!(Edit::new(EditKind::Delete, Some(Line::new(1, "x")), None).is_ok());
    }

    #[test]
    fn kind_flags() {
        let contains = EditKind::SubstitutionContains(Containment {
            prefix: "// ".into(),
            direction: ContainsDirection::NewContainsOld,
            suffix: "".into(),
        });
        assert!(contains.is_substitution());
        assert!(contains.is_combinable());
        assert!(!contains.is_move());
        assert!(EditKind::Move.is_move());
        assert!(!EditKind::Equal.is_combinable());
        assert_eq!(contains.tag(), 'C');
        assert_eq!(contains.to_string(), "contains(// \u{2192}NEW_CONTAINS_OLD\u{2192})");
    }

    #[test]
    fn block_kind() -> Result<()> {
        let ins = |n| Edit::insert(Line::new(n, "x"));
        let del = |n| Edit::delete(Line::new(n, "y"));

        assert!(Block::new(Vec::new()).is_err());
        assert_eq!(Block::new(vec![ins(1), ins(2)])?.kind(), &EditKind::Insert);
        assert_eq!(Block::new(vec![del(1), ins(1)])?.kind(), &EditKind::Replacement);

        let contains = |n, prefix: &str| Edit::paired(
            EditKind::SubstitutionContains(Containment {
                prefix: prefix.into(),
                direction: ContainsDirection::NewContainsOld,
                suffix: "".into(),
            }),
            Line::new(n, "x"),
            Line::new(n, format!("{}x", prefix)),
        );
        let block = Block::new(vec![contains(1, "// "), contains(2, "// ")])?;
        assert_eq!(block.kind(), contains(1, "// ").kind());
        let block = Block::new(vec![contains(1, "// "), contains(2, "# ")])?;
        assert_eq!(block.kind(), &EditKind::Substitute);

        Ok(())
    }

    #[test]
    fn split_text_numbers_from_one() {
        let lines = Line::split_text("a\nb\n\nc");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].number(), 1);
        assert_eq!(lines[2].text(), "");
        assert_eq!(lines[3], Line::new(4, "c"));
    }
}
