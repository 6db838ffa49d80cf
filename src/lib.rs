// SPDX-License-Identifier: MIT

pub mod chain;
pub mod cli;
pub mod counter;
pub mod edit;
pub mod myers;
pub mod normalize;
pub mod patience;
pub mod refine;
pub mod render;
pub mod utils;
