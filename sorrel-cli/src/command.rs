// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::ArgMatches;

use crate::job::{Job, JobRegistry};

/// Constructor for a job owned by a command
pub type JobConstructor = fn() -> Box<dyn Job>;

/// A named group of jobs, reachable as `sorrel <name> <job>`
#[derive(Debug, Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub jobs: &'static [JobConstructor],
}

impl Command {
    /// Attach this command and its jobs to the root parser
    ///
    /// Every job is instantiated once, given its own sub-command to declare
    /// arguments on and then moved into `registry`.
    pub fn register(&self, root: clap::Command, registry: &mut JobRegistry) -> clap::Command {
        let mut command = clap::Command::new(self.name)
            .override_usage(format!("{} <command> [<args>]", self.name))
            .about(format!(
                "{} Command Line Interface (CLI)",
                self.name.to_uppercase()
            ))
            .allow_external_subcommands(true);

        for constructor in self.jobs {
            let job = constructor();

            let mut subcommand = clap::Command::new(job.name());
            if let Some(description) = job.description() {
                subcommand = subcommand.about(description);
            }

            command = command.subcommand(job.declare_arguments(subcommand));
            registry.register(job);
        }

        root.subcommand(command)
    }

    /// Route the matches of this command to the selected job
    pub fn run(&self, registry: &JobRegistry, matches: &ArgMatches) -> i32 {
        match matches.subcommand() {
            Some((name, job_matches)) => registry.dispatch(Some(name), job_matches),
            None => registry.dispatch(None, matches),
        }
    }
}
