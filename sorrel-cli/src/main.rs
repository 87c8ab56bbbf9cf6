// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use sorrel_cli::Cli;

fn main() {
    std::process::exit(Cli::new().run(std::env::args_os()));
}
