// SPDX-License-Identifier: MIT

use clap::Parser;

use refined_diff::*;
use edit::Unit;
use refine::Stats;
use utils::Result;

/// Compare two text files line by line and classify the changes.
#[derive(Parser, Debug)]
struct Cli {
    old: std::path::PathBuf,
    new: std::path::PathBuf,

    #[clap(flatten)]
    diff: cli::DiffArgs,

    /// Print the refined edits without grouping them into blocks
    #[clap(long)]
    raw: bool,

    /// Print a summary of the changes at the end
    #[clap(long)]
    stat: bool,

    #[clap(flatten)]
    cli: cli::Options,
}

fn do_main() -> Result<()> {
    env_logger::builder()
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .init();

    let args = Cli::parse();
    let options = args.diff.diff_options()?;

    let old = utils::read_lines(&args.old)?;
    let new = utils::read_lines(&args.new)?;

    let mut writer = render::Writer::new();
    let stats = if args.raw {
        let edits = refine::diff_edits(&old, &new, &options, &myers::diff)?;
        writer.push_edits(&edits);
        let units: Vec<Unit> = edits.into_iter().map(Unit::Single).collect();
        Stats::of(&units)
    } else {
        let units = refine::compute(&old, &new, &options, &myers::diff)?;
        writer.push_units(&units);
        Stats::of(&units)
    };

    let mut cli = cli::Cli::new(args.cli);
    writer.write(cli.stream())?;
    if args.stat {
        writeln!(cli.stream(), "{}", stats)?;
    }

    Ok(())
}

fn main() {
    if let Err(err) = do_main() {
        println!("{}", err);
        std::process::exit(1);
    }
}
