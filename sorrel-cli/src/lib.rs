// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::ffi::OsString;

pub mod command;
pub mod dataset;
pub mod job;

use command::Command;
use job::JobRegistry;

/// Commands available from the `sorrel` binary
pub const COMMANDS: &[Command] = &[dataset::DATASET_COMMAND];

/// Root parser together with the jobs registered on it
pub struct Cli {
    root: clap::Command,
    commands: Vec<Command>,
    registry: JobRegistry,
}

impl Cli {
    pub fn new() -> Self {
        Self::with_commands(COMMANDS)
    }

    /// Build the root parser with a custom set of commands
    pub fn with_commands(commands: &[Command]) -> Self {
        let mut registry = JobRegistry::new();

        let mut root = clap::Command::new("sorrel")
            .version(env!("CARGO_PKG_VERSION"))
            .override_usage("sorrel <command> [<args>]")
            .about("Sorrel Command Line Interface (CLI)");

        for command in commands {
            root = command.register(root, &mut registry);
        }

        Self {
            root,
            commands: commands.to_vec(),
            registry,
        }
    }

    /// The root parser with every command attached
    pub fn command(&self) -> &clap::Command {
        &self.root
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Parse `args` (including the program name) and run the selected job
    ///
    /// Returns the exit status for the process.
    pub fn run<I, T>(&mut self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match self.root.try_get_matches_from_mut(args) {
            Ok(matches) => matches,
            Err(err) => {
                let _ = err.print();
                return err.exit_code();
            }
        };

        let Some((name, command_matches)) = matches.subcommand() else {
            let _ = self.root.print_help();
            return 1;
        };

        match self.commands.iter().find(|command| command.name == name) {
            Some(command) => command.run(&self.registry, command_matches),
            None => {
                let _ = self.root.print_help();
                1
            }
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}
