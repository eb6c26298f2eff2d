//! Subcommand handlers. Each one opens the board, runs one operation, and
//! renders the result in the resolved output mode.

pub mod completions;
pub mod create;
pub mod done;
pub mod list;
pub mod note;
pub mod show;
pub mod stats;
pub mod status;
pub mod watch;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use bugboard_core::board::{Board, BoardOptions};
use bugboard_core::config::EffectiveConfig;
use bugboard_core::error::BoardError;
use bugboard_core::model::{Report, Status};
use bugboard_core::store::JsonFileStore;
use bugboard_core::workflow::Outcome;
use serde::Serialize;

use crate::output::{CliError, OutputMode, render_error, render_mode, render_skipped};

/// How long a mutating command waits for the snapshot confirming its write.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a handler needs besides its own arguments.
pub struct Ctx<'a> {
    pub config: &'a EffectiveConfig,
    pub output: OutputMode,
    pub quiet: bool,
}

impl Ctx<'_> {
    /// Render `err` and turn it into the process error.
    pub fn fail(&self, err: &BoardError) -> anyhow::Error {
        if let Err(render_err) = render_error(self.output, &CliError::from(err)) {
            tracing::debug!(error = %render_err, "failed to render error");
        }
        anyhow::anyhow!("{err}")
    }

    /// Open the configured store and wait for its first snapshot.
    pub async fn open_board(&self) -> anyhow::Result<Board<JsonFileStore>> {
        let store = Arc::new(self.config.open_store());
        tracing::debug!(path = %store.path().display(), "opening report store");
        let mut board = Board::open(
            store,
            BoardOptions {
                templates: self.config.board.notes.clone(),
                author: self.config.author.clone(),
            },
        );
        board.ready().await.map_err(|err| self.fail(&err))?;
        Ok(board)
    }

    /// Wait for the snapshot that confirms a write issued after `before`.
    pub async fn settle(
        &self,
        board: &mut Board<JsonFileStore>,
        before: u64,
    ) -> anyhow::Result<()> {
        let settled = tokio::time::timeout(SETTLE_TIMEOUT, board.settle(before)).await;
        match settled {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(self.fail(&err)),
            Err(_) => {
                let mut message =
                    format!("write sent, but no snapshot confirmed it within {SETTLE_TIMEOUT:?}");
                if let Some(last) = board.sync_state().last_error {
                    message.push_str(&format!(" (last store error: {last})"));
                }
                Err(self.fail(&BoardError::Transport(message)))
            }
        }
    }
}

/// JSON shape printed after a note or status change lands.
#[derive(Debug, Serialize)]
pub struct MutationOutput {
    pub ok: bool,
    pub id: String,
    pub title: String,
    pub status: Status,
    pub notes: usize,
    pub message: String,
}

/// Finish a mutation on report `id`: wait for the confirming snapshot and
/// print the report as the store now has it, or print the skip notice.
pub async fn finish_update(
    ctx: &Ctx<'_>,
    board: &mut Board<JsonFileStore>,
    before: u64,
    id: &str,
    result: Result<Outcome, BoardError>,
    message: impl FnOnce(&Report) -> String,
) -> anyhow::Result<()> {
    let outcome = result.map_err(|err| ctx.fail(&err))?;
    if let Outcome::Skipped(reason) = outcome {
        return render_skipped(ctx.output, reason, ctx.quiet);
    }

    ctx.settle(board, before).await?;
    let report = board
        .session()
        .find(id)
        .ok_or_else(|| ctx.fail(&BoardError::NotFound { id: id.to_string() }))?;

    let value = MutationOutput {
        ok: true,
        id: report.id.clone(),
        title: report.title.clone(),
        status: report.status,
        notes: report.notes.len(),
        message: message(&report),
    };
    let quiet = ctx.quiet;
    render_mode(
        ctx.output,
        &value,
        |v, w| writeln!(w, "{}\t{}\t{}", v.id, v.status, v.notes),
        |v, w| {
            if quiet {
                Ok(())
            } else {
                writeln!(w, "✓ {}", v.message)
            }
        },
    )
}
