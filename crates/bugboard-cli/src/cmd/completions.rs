//! `bb completions`: shell completion scripts.

use clap::Args;
use clap_complete::{Shell, generate};
use std::io;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `command` to stdout.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> anyhow::Result<()> {
    let bin_name = command.get_name().to_string();
    generate(args.shell, command, bin_name, &mut io::stdout());
    Ok(())
}
