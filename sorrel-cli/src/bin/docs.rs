// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use sorrel_cli::Cli;

fn main() {
    let cli = Cli::new();
    print!("{}", clap_markdown::help_markdown_command(cli.command()));
}
