// SPDX-License-Identifier: MIT

use clap::Parser;

use refined_diff::*;
use utils::Result;

#[derive(Parser, Debug)]
struct CaseOptions {
    #[clap(flatten)]
    diff: cli::DiffArgs,
}

/// Read the optional `options` file of a test case as command-line flags.
fn case_options(path: &std::path::Path) -> Result<refine::DiffOptions> {
    let options_path = path.join("options");
    let flags = if options_path.exists() {
        String::from_utf8(utils::read_bytes(&options_path)?)?
    } else {
        String::new()
    };
    let args = CaseOptions::try_parse_from(std::iter::once("test").chain(flags.split_whitespace()))?;
    args.diff.diff_options()
}

#[test]
fn diff_test() -> Result<()> {
    for entry in std::path::Path::new("./tests/diff_test").read_dir()? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let path = entry.path();
        println!("Test: {}", path.display());

        let old = utils::read_lines(path.join("old"))?;
        let new = utils::read_lines(path.join("new"))?;
        let expected = utils::read_bytes(path.join("expected"))?;
        let options = case_options(&path)?;

        let units = refine::compute(&old, &new, &options, &myers::diff)?;
        refine::verify_coverage(&old, &new, units.iter().flat_map(edit::Unit::edits))?;

        assert_eq!(String::from_utf8(expected)?, render::render_text(&units), "{}", path.display());
    }

    Ok(())
}
