//! `bb start` and `bb status`: move a report between statuses.

use bugboard_core::model::Status;
use clap::Args;

use super::{Ctx, finish_update};

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Report id to move to in-progress.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Report id.
    pub id: String,

    /// Target status: new, in_progress, done.
    pub status: Status,
}

pub async fn run_start(args: &StartArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    run_transition(args.id.trim(), Status::InProgress, ctx).await
}

pub async fn run_status(args: &StatusArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    run_transition(args.id.trim(), args.status, ctx).await
}

async fn run_transition(id: &str, target: Status, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let mut board = ctx.open_board().await?;
    let before = board.sync_state().generation;
    let result = board.controller().transition_to(id, target).await;
    finish_update(ctx, &mut board, before, id, result, |report| {
        format!("Moved {} to {}", report.id, report.status.label())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::StatusArgs;
    use bugboard_core::model::Status;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: StatusArgs,
    }

    #[test]
    fn status_accepts_legacy_labels() {
        let w = Wrapper::parse_from(["test", "r1", "Hoàn thành"]);
        assert_eq!(w.args.status, Status::Done);
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!(Wrapper::try_parse_from(["test", "r1", "archived"]).is_err());
    }
}
