//! `bb create`: file a new report.

use bugboard_core::model::Status;
use bugboard_core::workflow::{Outcome, ReportDraft};
use clap::Args;
use serde::Serialize;
use std::io::Write;

use super::Ctx;
use crate::output::{pretty_kv, render_mode, render_skipped};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Short summary of the problem.
    #[arg(short, long)]
    pub title: String,

    /// Longer description; becomes the first note.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Who reported it.
    #[arg(short, long)]
    pub reporter: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOutput {
    ok: bool,
    id: String,
    title: String,
    status: Status,
}

pub async fn run_create(args: &CreateArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let mut board = ctx.open_board().await?;

    let mut draft = ReportDraft::new(args.title.as_str());
    draft.description.clone_from(&args.description);
    draft.reporter.clone_from(&args.reporter);

    let before = board.sync_state().generation;
    let outcome = board
        .controller()
        .create(draft)
        .await
        .map_err(|err| ctx.fail(&err))?;

    let (id, title) = match outcome {
        Outcome::Created { id, report } => (id, report.title),
        Outcome::Skipped(reason) => return render_skipped(ctx.output, reason, ctx.quiet),
        Outcome::Updated { id, .. } => anyhow::bail!("unexpected update of {id} during create"),
    };
    ctx.settle(&mut board, before).await?;

    let value = CreateOutput {
        ok: true,
        id,
        title,
        status: Status::New,
    };
    let quiet = ctx.quiet;
    render_mode(
        ctx.output,
        &value,
        |v, w| writeln!(w, "{}", v.id),
        |v, w| {
            if quiet {
                return writeln!(w, "{}", v.id);
            }
            writeln!(w, "✓ Created report")?;
            pretty_kv(w, "id", &v.id)?;
            pretty_kv(w, "title", &v.title)?;
            pretty_kv(w, "status", v.status.label())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::CreateArgs;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CreateArgs,
    }

    #[test]
    fn create_args_parse_all_fields() {
        let w = Wrapper::parse_from([
            "test",
            "--title",
            "Login bug",
            "-d",
            "fails on submit",
            "--reporter",
            "alice",
        ]);
        assert_eq!(w.args.title, "Login bug");
        assert_eq!(w.args.description.as_deref(), Some("fails on submit"));
        assert_eq!(w.args.reporter.as_deref(), Some("alice"));
    }

    #[test]
    fn create_requires_title() {
        assert!(Wrapper::try_parse_from(["test"]).is_err());
    }
}
