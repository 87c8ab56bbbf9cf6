// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::command::Command;
use crate::job::Job;

mod browse;
mod scope;

pub use browse::{BrowseArgs, BrowseDatasetJob, Mode, browse};
pub use scope::{RenderContext, Renderer, SCOPE_RENDERERS, renderer};

fn browse_job() -> Box<dyn Job> {
    Box::new(BrowseDatasetJob)
}

/// `sorrel dataset <job>`: inspect what a configured dataset yields
pub const DATASET_COMMAND: Command = Command {
    name: "dataset",
    jobs: &[browse_job],
};
