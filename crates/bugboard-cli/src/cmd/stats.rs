//! `bb stats`: per-status counters.

use bugboard_core::cache::StatusCounts;
use bugboard_core::model::Status;
use serde::Serialize;
use std::io::Write;

use super::Ctx;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Debug, Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    counts: StatusCounts,
    total: usize,
}

pub async fn run_stats(ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let board = ctx.open_board().await?;
    let counts = board.session().stats();
    board.close();

    let value = StatsOutput {
        counts,
        total: counts.total(),
    };
    render_mode(
        ctx.output,
        &value,
        |v, w| {
            for status in Status::ALL {
                writeln!(w, "{status}\t{}", v.counts.get(status))?;
            }
            writeln!(w, "total\t{}", v.total)
        },
        |v, w| {
            pretty_section(w, "Reports by status")?;
            for status in Status::ALL {
                pretty_kv(w, status.label(), v.counts.get(status).to_string())?;
            }
            pretty_kv(w, "Total", v.total.to_string())
        },
    )
}
