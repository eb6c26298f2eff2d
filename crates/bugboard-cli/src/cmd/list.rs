//! `bb list`: filtered report list with counters.

use bugboard_core::filter::{FilterQuery, StatusSelector};
use bugboard_core::session::BoardView;
use clap::Args;
use std::io::{self, Write};

use super::Ctx;
use crate::output::{pretty_section, render_mode, write_report_row, write_stats_line};

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Case-insensitive text to look for in title, description and reporter.
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Status to show: all, new, in_progress, done.
    #[arg(long, default_value = "all")]
    pub status: StatusSelector,
}

impl ListArgs {
    #[must_use]
    pub fn query(&self) -> FilterQuery {
        FilterQuery::new(self.search.clone(), self.status)
    }
}

pub async fn run_list(args: &ListArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let mut board = ctx.open_board().await?;
    board.session_mut().set_query(args.query());
    let view = board.session().view();
    board.close();
    render_view(ctx, &view)
}

/// Render one board view; shared with `bb watch`.
pub fn render_view(ctx: &Ctx<'_>, view: &BoardView) -> anyhow::Result<()> {
    render_mode(ctx.output, view, write_text, write_pretty)
}

fn write_text(view: &BoardView, w: &mut dyn Write) -> io::Result<()> {
    for report in &view.reports {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            report.id,
            report.status,
            report.title,
            report.reporter.as_deref().unwrap_or("")
        )?;
    }
    writeln!(w, "{}", view.summary())
}

fn write_pretty(view: &BoardView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Reports ({})", view.summary()))?;
    if view.reports.is_empty() {
        writeln!(w, "(no matching reports)")?;
    }
    for report in &view.reports {
        write_report_row(w, report)?;
    }
    writeln!(w)?;
    write_stats_line(w, &view.stats)
}
