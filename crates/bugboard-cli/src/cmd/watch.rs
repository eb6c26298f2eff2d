//! `bb watch`: re-render the filtered list whenever the store changes.

use clap::Args;
use tracing::{debug, warn};

use super::Ctx;
use super::list::{ListArgs, render_view};

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub list: ListArgs,

    /// Exit after this many renders instead of waiting for Ctrl-C.
    #[arg(long, value_name = "N")]
    pub updates: Option<u64>,
}

pub async fn run_watch(args: &WatchArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let mut board = ctx.open_board().await?;
    board.session_mut().set_query(args.list.query());
    let mut changes = board.watch();
    let mut rendered = 0_u64;
    let mut seen_generation = 0_u64;
    let mut seen_errors = 0_u64;

    loop {
        let state = changes.borrow_and_update().clone();
        if state.generation > seen_generation {
            seen_generation = state.generation;
            render_view(ctx, &board.session().view())?;
            rendered += 1;
            if args.updates.is_some_and(|limit| rendered >= limit) {
                break;
            }
        }
        if state.errors > seen_errors {
            seen_errors = state.errors;
            if let Some(message) = &state.last_error {
                warn!(error = %message, "store error; showing last known list");
                if !ctx.quiet {
                    eprintln!("warning: {message}");
                }
            }
        }
        if state.closed {
            debug!("subscription closed; leaving watch");
            break;
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }

    board.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::WatchArgs;
    use bugboard_core::filter::StatusSelector;
    use bugboard_core::model::Status;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: WatchArgs,
    }

    #[test]
    fn watch_reuses_list_filters() {
        let w = Wrapper::parse_from(["test", "--status", "done", "--updates", "2"]);
        assert_eq!(w.args.list.status, StatusSelector::Only(Status::Done));
        assert_eq!(w.args.updates, Some(2));
    }
}
