//! `bb note`: append a note to a report's timeline.

use clap::Args;

use super::{Ctx, finish_update};

#[derive(Args, Debug)]
pub struct NoteArgs {
    /// Report id.
    pub id: String,

    /// Note text.
    pub text: String,
}

pub async fn run_note(args: &NoteArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let mut board = ctx.open_board().await?;
    let id = args.id.trim();
    let before = board.sync_state().generation;
    let result = board.controller().append_note(id, &args.text).await;
    finish_update(ctx, &mut board, before, id, result, |report| {
        format!("Added note #{} to {}", report.notes.len(), report.id)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::NoteArgs;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: NoteArgs,
    }

    #[test]
    fn note_args_take_id_and_text() {
        let w = Wrapper::parse_from(["test", "r1", "Reproduced on staging"]);
        assert_eq!(w.args.id, "r1");
        assert_eq!(w.args.text, "Reproduced on staging");
    }
}
