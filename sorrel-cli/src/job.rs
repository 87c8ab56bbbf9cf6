// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::HashMap;

use clap::ArgMatches;

/// A unit of work reachable as `sorrel <command> <job>`
///
/// A job declares its own flags on the sub-command created for it and is
/// handed back the parsed matches of that sub-command when dispatched.
pub trait Job {
    /// Unique name, used as the sub-command name
    fn name(&self) -> &'static str;

    /// One line help shown in the command's job listing
    fn description(&self) -> Option<&'static str> {
        None
    }

    /// Add the job's arguments to its sub-command
    fn declare_arguments(&self, command: clap::Command) -> clap::Command;

    /// Run the job and return a process exit status
    fn execute(&self, args: &ArgMatches) -> i32;
}

/// Jobs keyed by name
///
/// Filled while commands are registered and read-only afterwards.
#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<&'static str, Box<dyn Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job under its name
    ///
    /// A job registered under an existing name replaces it and the replaced
    /// job is returned.
    pub fn register(&mut self, job: Box<dyn Job>) -> Option<Box<dyn Job>> {
        self.jobs.insert(job.name(), job)
    }

    /// Run the job called `name`
    ///
    /// An absent or unknown name runs nothing, prints the valid choices and
    /// returns 1.
    pub fn dispatch(&self, name: Option<&str>, args: &ArgMatches) -> i32 {
        match name.and_then(|name| self.jobs.get(name)) {
            Some(job) => job.execute(args),
            None => {
                println!(
                    "Error: missing a valid command. Choose from: {:?}",
                    self.names()
                );
                1
            }
        }
    }

    /// Sorted names of all registered jobs
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.jobs.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn get(&self, name: &str) -> Option<&dyn Job> {
        self.jobs.get(name).map(|job| job.as_ref())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
