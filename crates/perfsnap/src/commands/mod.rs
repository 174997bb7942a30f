//! Command implementations.
//!
//! Each submodule handles a specific CLI command.

mod categories;
mod compute;
mod decode;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Decode {
            file,
            object,
            source_dir,
            format,
        } => decode::cmd_decode(file, *object, source_dir.as_deref(), *format),
        Commands::Compute {
            old,
            new,
            object,
            filter,
            percent,
            format,
        } => compute::cmd_compute(old, new, *object, filter.as_deref(), *percent, *format),
        Commands::Categories {
            dir,
            names,
            help,
            jobs,
        } => categories::cmd_categories(dir, names, help.as_deref(), *jobs),
    }
}
