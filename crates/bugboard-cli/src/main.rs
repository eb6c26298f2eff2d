#![forbid(unsafe_code)]

mod cmd;
mod output;

use bugboard_core::config::{ConfigOverrides, resolve_config};
use bugboard_core::error::ErrorCode;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "bb",
    author,
    version,
    about = "bugboard: shared bug-report board",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Report store file (overrides BUGBOARD_STORE and config).
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Name stamped on notes this command writes.
    #[arg(long, global = true)]
    author: Option<String>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            store: self.store.clone(),
            author: self.author.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Reports",
        about = "File a new report",
        after_help = "EXAMPLES:\n    # Report a bug\n    bb create --title \"Login fails\" --description \"500 on submit\" --reporter alice\n\n    # Emit machine-readable output\n    bb create --title \"Login fails\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Read",
        about = "List reports",
        after_help = "EXAMPLES:\n    # Everything, newest first\n    bb list\n\n    # Search within one status\n    bb list --search crash --status in_progress"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one report and its notes",
        after_help = "EXAMPLES:\n    bb show 3fQ9xk2LmZp0aB7cD1eF"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Append a note to a report",
        after_help = "EXAMPLES:\n    bb --author triage note 3fQ9xk2LmZp0aB7cD1eF \"Reproduced on staging\""
    )]
    Note(cmd::note::NoteArgs),

    #[command(next_help_heading = "Status", about = "Move a report to in-progress")]
    Start(cmd::status::StartArgs),

    #[command(
        next_help_heading = "Status",
        about = "Move a report to any status",
        after_help = "EXAMPLES:\n    # Reopen a closed report\n    bb status 3fQ9xk2LmZp0aB7cD1eF new"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Status",
        about = "Mark a report as done",
        long_about = "Move a report to done and append the completion note in one update."
    )]
    Done(cmd::done::DoneArgs),

    #[command(next_help_heading = "Read", about = "Count reports per status")]
    Stats,

    #[command(
        next_help_heading = "Read",
        about = "Keep the list on screen, refreshed on every change",
        after_help = "EXAMPLES:\n    # Watch open work until Ctrl-C\n    bb watch --status in_progress"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    bb completions zsh > _bb"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BUGBOARD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "bugboard_core=debug,bb=debug,info"
        } else {
            "bugboard_core=info,bb=info,warn"
        })
    });

    let format = env::var("BUGBOARD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions(args) = &cli.command {
        return cmd::completions::run_completions(args, &mut Cli::command());
    }

    let project_root = env::current_dir()?;
    let config = match resolve_config(&project_root, &cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            let output = resolve_output_mode(cli.format, cli.json, None);
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            return Err(err);
        }
    };
    let output = resolve_output_mode(cli.format, cli.json, config.user.output.as_deref());
    info!(store = %config.store_path.display(), "bugboard starting");

    let ctx = cmd::Ctx {
        config: &config,
        output,
        quiet: cli.quiet,
    };

    match &cli.command {
        Commands::Create(args) => cmd::create::run_create(args, &ctx).await,
        Commands::List(args) => cmd::list::run_list(args, &ctx).await,
        Commands::Show(args) => cmd::show::run_show(args, &ctx).await,
        Commands::Note(args) => cmd::note::run_note(args, &ctx).await,
        Commands::Start(args) => cmd::status::run_start(args, &ctx).await,
        Commands::Status(args) => cmd::status::run_status(args, &ctx).await,
        Commands::Done(args) => cmd::done::run_done(args, &ctx).await,
        Commands::Stats => cmd::stats::run_stats(&ctx).await,
        Commands::Watch(args) => cmd::watch::run_watch(args, &ctx).await,
        Commands::Completions(args) => cmd::completions::run_completions(args, &mut Cli::command()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["bb", "list", "--json"]);
        assert!(cli.json);
        assert!(cli.format.is_none());
    }

    #[test]
    fn format_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["bb", "--format", "text", "stats"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert!(matches!(cli.command, Commands::Stats));
    }

    #[test]
    fn store_and_author_become_overrides() {
        let cli = Cli::parse_from([
            "bb",
            "--store",
            "/tmp/reports.json",
            "note",
            "r1",
            "hi",
            "--author",
            "kim",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.store, Some(PathBuf::from("/tmp/reports.json")));
        assert_eq!(overrides.author.as_deref(), Some("kim"));
    }

    #[test]
    fn quiet_and_verbose_flags_parse() {
        let cli = Cli::parse_from(["bb", "-q", "-v", "list"]);
        assert!(cli.quiet);
        assert!(cli.verbose);
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["bb", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["bb", "create", "--title", "x"],
            vec!["bb", "list"],
            vec!["bb", "show", "x"],
            vec!["bb", "note", "x", "text"],
            vec!["bb", "start", "x"],
            vec!["bb", "status", "x", "done"],
            vec!["bb", "done", "x"],
            vec!["bb", "stats"],
            vec!["bb", "watch", "--updates", "1"],
            vec!["bb", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
