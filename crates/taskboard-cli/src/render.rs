//! Plain-text rendering of a replay report

use crate::replay::ReplayReport;
use std::fmt::Write;

/// Render the board the way the dashboard lays it out, followed by the step log
#[must_use]
pub fn render_text(report: &ReplayReport) -> String {
    let mut out = String::new();
    let board = &report.board;

    if let Some(error) = &board.error {
        let _ = writeln!(out, "! {error}");
    }

    let _ = writeln!(out, "Employees ({}):", board.employees.len());
    for employee in &board.employees {
        let _ = writeln!(out, "  {} <{}>", employee.name, employee.email);
    }

    let _ = writeln!(out, "Groups ({}):", board.groups.len());
    for panel in &board.groups {
        let marker = if panel.expanded { '-' } else { '+' };
        let _ = writeln!(out, "  [{}] {} ({})", marker, panel.group_name, panel.id);
        for member in &panel.members {
            let task = if member.has_task() {
                member.task.as_str()
            } else {
                "(no task)"
            };
            let _ = writeln!(out, "      {} <{}>: {}", member.name, member.email, task);
        }
    }

    if !report.steps.is_empty() {
        let _ = writeln!(out, "Steps:");
        for (i, step) in report.steps.iter().enumerate() {
            let status = match (&step.error, step.applied) {
                (Some(error), _) => format!("failed: {error}"),
                (None, true) => "ok".to_string(),
                (None, false) => "skipped".to_string(),
            };
            let _ = writeln!(out, "  {}. {} ... {}", i + 1, step.step, status);
        }
    }

    for notice in &report.notices {
        let _ = writeln!(out, "{} {}", notice.title, notice.text);
    }

    out
}
