//! Plain-text summary of a run, one line per file.

use std::fmt::Write as _;

use crate::load::{FileStatus, RunSummary};

const HEADERS: [&str; 5] = ["file", "period", "read", "inserted", "result"];

pub fn summary_rows(summary: &RunSummary) -> Vec<[String; 5]> {
    summary
        .files
        .iter()
        .map(|status| {
            let name = status
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| status.path().display().to_string());
            match status {
                FileStatus::Loaded(report) => [
                    name,
                    report.period.clone(),
                    report.records.to_string(),
                    report.inserted.to_string(),
                    report.clear.to_string(),
                ],
                FileStatus::Failed { message, .. } => [
                    name,
                    String::new(),
                    String::new(),
                    "0".to_string(),
                    format!("failed: {}", first_line(message)),
                ],
            }
        })
        .collect()
}

pub fn render_summary(summary: &RunSummary) -> String {
    let rows = summary_rows(summary);
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header = HEADERS.map(str::to_string);
    let _ = writeln!(output, "{}", format_line(&header, &widths));
    let rule = widths.map(|w| "-".repeat(w));
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

fn format_line(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let mut line = String::new();
    for (idx, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let _ = write!(line, "{cell:<width$}");
    }
    line.trim_end().to_string()
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}
