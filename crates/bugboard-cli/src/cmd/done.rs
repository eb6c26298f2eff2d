//! `bb done`: close a report with a completion note.

use clap::Args;

use super::{Ctx, finish_update};

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Report id to mark as done.
    pub id: String,
}

pub async fn run_done(args: &DoneArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let mut board = ctx.open_board().await?;
    let id = args.id.trim();
    let before = board.sync_state().generation;
    let result = board.controller().mark_done(id).await;
    finish_update(ctx, &mut board, before, id, result, |report| {
        format!("Marked {} as done", report.id)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::DoneArgs;
    use clap::Parser;

    #[test]
    fn done_args_parses_id() {
        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: DoneArgs,
        }
        let w = Wrapper::parse_from(["test", "item-789"]);
        assert_eq!(w.args.id, "item-789");
    }
}
