// SPDX-License-Identifier: MIT

use rand::prelude::*;
use rand::rngs::StdRng;

use refined_diff::*;
use edit::{EditKind, Line, Unit};
use normalize::Normalization;
use refine::{DiffOptions, SimilarityMode};
use utils::Result;

const VOCABULARY: &[&str] = &[
    "",
    "{",
    "}",
    "    return x;",
    "x += 1;",
    "foo(bar);",
    "// foo(bar);",
    "let y = 2;",
    "  let y = 2;",
    "LET Y = 2;",
    "for (int i = 0; i < items.size(); i++) {",
    "for (Item item : items) {",
    "print(a, b);",
    "print(a, c);",
    "call(first,",
    "    second);",
    "call(first, second);",
];

fn random_texts(rng: &mut StdRng, len: usize) -> Vec<String> {
    (0..len)
        .map(|_| VOCABULARY.choose(rng).copied().unwrap_or_default().to_string())
        .collect()
}

/// Apply a few random deletions, insertions and block moves.
fn mutate(rng: &mut StdRng, texts: &[String]) -> Vec<String> {
    let mut result = texts.to_vec();
    for _ in 0..rng.gen_range(0..6) {
        match rng.gen_range(0..3) {
        0 if !result.is_empty() => {
            let idx = rng.gen_range(0..result.len());
            result.remove(idx);
        },
        1 => {
            let idx = rng.gen_range(0..=result.len());
            result.insert(idx, random_texts(rng, 1).remove(0));
        },
        _ if result.len() >= 2 => {
            let begin = rng.gen_range(0..result.len());
            let end = rng.gen_range(begin + 1..=result.len());
            let block: Vec<String> = result.drain(begin..end).collect();
            let at = rng.gen_range(0..=result.len());
            for (offset, text) in block.into_iter().enumerate() {
                result.insert(at + offset, text);
            }
        },
        _ => {},
        }
    }
    result
}

fn to_lines(texts: &[String]) -> Vec<Line> {
    texts.iter()
        .enumerate()
        .map(|(idx, text)| Line::new(idx + 1, text.as_str()))
        .collect()
}

fn random_pair(rng: &mut StdRng) -> (Vec<Line>, Vec<Line>) {
    let len = rng.gen_range(0..25);
    let old = random_texts(rng, len);
    let new = mutate(rng, &old);
    (to_lines(&old), to_lines(&new))
}

fn all_options() -> Vec<DiffOptions> {
    let mut result = Vec::new();
    for normalization in [Normalization::None, Normalization::TrimWhitespace, Normalization::IgnoreCase] {
        for similarity in [SimilarityMode::Contains, SimilarityMode::Similar, SimilarityMode::Permissive] {
            for (detect_moves, combine_replacements) in [(true, true), (false, false)] {
                result.push(DiffOptions {
                    normalization,
                    detect_moves,
                    similarity,
                    combine_replacements,
                    ..Default::default()
                });
            }
        }
    }
    result
}

#[test]
fn patience_reconstructs_inputs() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..300 {
        let (old, new) = random_pair(&mut rng);
        for normalization in [Normalization::None, Normalization::IgnoreAllWhitespace] {
            let normalize = normalization.function();
            let edits = patience::diff(&old, &new, &normalize, &myers::diff);
            patience::verify(&old, &new, &edits)?;
            assert!(edits.iter().all(|edit| matches!(
                edit.kind(),
                EditKind::Insert | EditKind::Delete | EditKind::Equal | EditKind::Normalize,
            )));
        }
    }
    Ok(())
}

#[test]
fn refined_units_cover_inputs() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let options = all_options();
    for _ in 0..100 {
        let (old, new) = random_pair(&mut rng);
        for options in &options {
            let units = refine::compute(&old, &new, options, &myers::diff)?;
            refine::verify_coverage(&old, &new, units.iter().flat_map(Unit::edits))?;

            let normalize = options.normalization.function();
            assert_eq!(refine::reclassify_blank_lines(units.clone(), &normalize), units);
            assert_eq!(refine::reclassify_split_lines(units.clone(), &normalize), units);
        }
    }
    Ok(())
}

#[test]
fn trivial_inputs() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let options = DiffOptions::default();
    for _ in 0..50 {
        let len = rng.gen_range(2..20);
        let texts = random_texts(&mut rng, len);
        let lines = to_lines(&texts);

        assert!(refine::compute(&[], &[], &options, &myers::diff)?.is_empty());

        let edits = patience::diff(&lines, &lines, &normalize::identity, &myers::diff);
        assert_eq!(edits.len(), lines.len());
        assert!(edits.iter().all(|edit| *edit.kind() == EditKind::Equal));

        let units = refine::compute(&lines, &lines, &options, &myers::diff)?;
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind(), &EditKind::Equal);

        let edits = patience::diff(&lines, &[], &normalize::identity, &myers::diff);
        assert!(edits.iter().all(|edit| edit.is_delete()));
        let edits = patience::diff(&[], &lines, &normalize::identity, &myers::diff);
        assert!(edits.iter().all(|edit| edit.is_insert()));
    }
    Ok(())
}
