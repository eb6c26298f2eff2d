//! `bb show`: one report with its numbered note timeline.

use bugboard_core::error::BoardError;
use bugboard_core::session::ReportDetail;
use clap::Args;
use std::io::{self, Write};

use super::Ctx;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Report id.
    pub id: String,
}

pub async fn run_show(args: &ShowArgs, ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let board = ctx.open_board().await?;
    let detail = board.session().detail_of(args.id.trim());
    board.close();

    let detail = detail.ok_or_else(|| {
        ctx.fail(&BoardError::NotFound {
            id: args.id.clone(),
        })
    })?;
    render_mode(ctx.output, &detail, write_text, write_pretty)
}

fn write_text(detail: &ReportDetail, w: &mut dyn Write) -> io::Result<()> {
    let report = &detail.report;
    writeln!(w, "{}\t{}\t{}", report.id, report.status, report.title)?;
    for numbered in &detail.notes {
        writeln!(
            w,
            "#{}\t{}\t{}",
            numbered.number,
            numbered.note.time.to_rfc3339(),
            numbered.note.text
        )?;
    }
    Ok(())
}

fn write_pretty(detail: &ReportDetail, w: &mut dyn Write) -> io::Result<()> {
    let report = &detail.report;
    pretty_section(w, &report.title)?;
    pretty_kv(w, "id", &report.id)?;
    pretty_kv(w, "status", report.status.label())?;
    pretty_kv(
        w,
        "created",
        report.created_at.format("%Y-%m-%d %H:%M").to_string(),
    )?;
    if let Some(reporter) = &report.reporter {
        pretty_kv(w, "reporter", reporter)?;
    }
    if let Some(description) = &report.description {
        writeln!(w)?;
        writeln!(w, "{description}")?;
    }

    writeln!(w)?;
    pretty_section(w, &format!("Notes ({})", detail.notes.len()))?;
    for numbered in &detail.notes {
        let note = &numbered.note;
        let author = note
            .author
            .as_deref()
            .map(|a| format!(" {a}"))
            .unwrap_or_default();
        writeln!(
            w,
            "#{:<3} {}{}",
            numbered.number,
            note.time.format("%Y-%m-%d %H:%M"),
            author
        )?;
        writeln!(w, "     {}", note.text)?;
    }

    if !detail.actions.transitions.is_empty() {
        let targets: Vec<String> = detail
            .actions
            .transitions
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(w)?;
        pretty_kv(w, "next", targets.join(", "))?;
    }
    Ok(())
}
