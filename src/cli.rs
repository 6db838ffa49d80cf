// SPDX-License-Identifier: MIT

use std::io::IsTerminal;
use std::process::{Child, ChildStdin, Command, Stdio};

use clap::{Args, ValueEnum};
use regex::Regex;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::normalize::Normalization;
use crate::refine::{DiffOptions, SimilarityMode};
use crate::utils::*;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeArg {
    #[default]
    None,
    Trim,
    IgnoreSpace,
    IgnoreAllSpace,
    IgnoreCase,
}
impl From<NormalizeArg> for Normalization {
    fn from(arg: NormalizeArg) -> Self {
        match arg {
        NormalizeArg::None => Self::None,
        NormalizeArg::Trim => Self::TrimWhitespace,
        NormalizeArg::IgnoreSpace => Self::IgnoreWhitespace,
        NormalizeArg::IgnoreAllSpace => Self::IgnoreAllWhitespace,
        NormalizeArg::IgnoreCase => Self::IgnoreCase,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityArg {
    Contains,
    #[default]
    Similar,
    Permissive,
}
impl From<SimilarityArg> for SimilarityMode {
    fn from(arg: SimilarityArg) -> Self {
        match arg {
        SimilarityArg::Contains => Self::Contains,
        SimilarityArg::Similar => Self::Similar,
        SimilarityArg::Permissive => Self::Permissive,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct DiffArgs {
    /// How lines are normalized before they are compared
    #[clap(value_enum, long, default_value_t = Default::default())]
    pub normalize: NormalizeArg,

    /// How aggressively changed lines are paired as substitutions
    #[clap(value_enum, long, default_value_t = Default::default())]
    pub similarity: SimilarityArg,

    /// Do not detect moved lines
    #[clap(long)]
    pub no_moves: bool,

    /// Keep inserts, deletes and substitutions in separate blocks
    #[clap(long)]
    pub no_combine: bool,

    /// Ignore changes whose lines all match this regular expression
    #[clap(long, value_name = "REGEX")]
    pub ignore: Vec<String>,
}
impl DiffArgs {
    pub fn diff_options(&self) -> Result<DiffOptions> {
        let ignore_patterns = self.ignore.iter()
            .map(|pattern| try_forward(
                || -> Result<Regex> { Ok(Regex::new(pattern)?) },
                || format!("--ignore {}", pattern),
            ))
            .collect::<Result<Vec<_>>>()?;

        Ok(DiffOptions {
            normalization: self.normalize.into(),
            detect_moves: !self.no_moves,
            similarity: self.similarity.into(),
            combine_replacements: !self.no_combine,
            ignore_patterns,
        })
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct Options {
    /// Whether the output should be run through a pager
    #[clap(long)]
    pub pager: Option<bool>,

    /// Whether the output should be colored
    #[clap(long)]
    pub color: Option<bool>,
}

/// Start `$PAGER`, or `less` if it is unset.
fn spawn_pager() -> Option<(Child, ChildStdin)> {
    let command = std::env::var("PAGER").ok()
        .filter(|pager| !pager.trim().is_empty())
        .unwrap_or_else(|| "less".into());
    let mut words = command.split_whitespace();
    let program = words.next()?;

    let mut child = Command::new(program)
        .args(words)
        .env("LESS", std::env::var("LESS").unwrap_or_else(|_| "FR".into()))
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn().ok()?;
    let stdin = child.stdin.take()?;
    Some((child, stdin))
}

pub struct Cli {
    stream: Box<dyn WriteColor>,
    pager: Option<Child>,
}
impl Cli {
    pub fn new(options: Options) -> Cli {
        let is_terminal = std::io::stdout().is_terminal();
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());

        let use_pager = options.pager.unwrap_or(is_terminal);
        let use_color = options.color.unwrap_or(is_terminal && !no_color);

        let (pager, stream): (Option<Child>, Box<dyn WriteColor>) =
            match use_pager.then(spawn_pager).flatten() {
            Some((child, stdin)) => {
                let stream: Box<dyn WriteColor> = if use_color {
                    Box::new(termcolor::Ansi::new(stdin))
                } else {
                    Box::new(termcolor::NoColor::new(stdin))
                };
                (Some(child), stream)
            },
            None => {
                let color = if use_color { ColorChoice::Always } else { ColorChoice::Never };
                (None, Box::new(StandardStream::stdout(color)))
            },
            };

        Cli {
            stream,
            pager,
        }
    }

    pub fn stream(&mut self) -> &mut dyn WriteColor {
        self.stream.as_mut()
    }
}

impl Drop for Cli {
    fn drop(&mut self) {
        // Close the stream to signal EOF to the pager, if any.
        self.stream = Box::new(termcolor::NoColor::new(std::io::sink()));

        // Wait for the pager to exit, otherwise it ends up killed by the shell
        // and leaves the terminal in a bad state.
        if let Some(pager) = &mut self.pager {
            pager.wait().unwrap_or_default();
        }
    }
}
