pub mod hunk;
pub mod style;
pub mod time;

pub use style::Theme;

use crate::pr::types::{Comment, StatusCheck};
use crate::pr::Feedback;
use chrono::{DateTime, Utc};
use std::io::Write;
use style::Role;
use thiserror::Error;
use tracing::{debug, instrument};

const RULE_WIDTH: usize = 100;
const HUNK_INDENT: &str = "    ";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Error marshaling JSON: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
}

/// Structured document for automation, pretty-printed JSON.
pub fn render_structured(feedback: &Feedback) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(feedback)?)
}

/// Write the report to stdout in the requested format.
#[instrument(skip(feedback, now, theme), fields(pr = feedback.pr_number))]
pub fn output(
    feedback: &Feedback,
    format: Format,
    now: DateTime<Utc>,
    theme: Theme,
) -> Result<(), ReportError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, feedback, format, now, theme)
}

fn write_report(
    out: &mut impl Write,
    feedback: &Feedback,
    format: Format,
    now: DateTime<Utc>,
    theme: Theme,
) -> Result<(), ReportError> {
    match format {
        Format::Json => {
            debug!("writing structured report");
            let document = render_structured(feedback)?;
            writeln!(out, "{document}")?;
        }
        Format::Human => {
            debug!("writing human-readable report");
            for line in render_human(feedback, now, theme) {
                writeln!(out, "{line}")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Render the report as terminal lines. `now` anchors every relative
/// timestamp, so the same inputs always produce the same lines.
pub fn render_human(feedback: &Feedback, now: DateTime<Utc>, theme: Theme) -> Vec<String> {
    let mut lines = Vec::new();
    let rule = "─".repeat(RULE_WIDTH);

    lines.push(theme.paint(
        &format!("{} #{}", feedback.title, feedback.pr_number),
        Role::Strong,
    ));
    lines.push(format!(
        "{} • {}",
        theme.paint("Open", Role::Open),
        theme.paint(&feedback.url, Role::Muted)
    ));

    if let Some(summary) = summary_line(feedback, theme) {
        lines.push(String::new());
        lines.push(summary);
    }
    lines.push(String::new());

    for comment in &feedback.general_issues {
        lines.push(general_header(comment, now, theme));
        lines.push(String::new());
        push_body(&mut lines, &comment.body);
        lines.push(String::new());
    }

    if !feedback.comments.is_empty() {
        lines.push(rule.clone());
        lines.push(String::new());

        let last = feedback.comments.len() - 1;
        for (i, comment) in feedback.comments.iter().enumerate() {
            push_anchored(&mut lines, comment, now, theme);
            if i < last {
                lines.push(String::new());
                lines.push(rule.clone());
                lines.push(String::new());
            }
        }
    }

    if !feedback.status_checks.is_empty() {
        lines.push(String::new());
        lines.push(rule);
        lines.push(String::new());
        lines.push(theme.paint("Failed Checks", Role::Strong));
        lines.push(String::new());
        for check in &feedback.status_checks {
            lines.push(check_line(check, theme));
        }
    }

    lines
}

fn summary_line(feedback: &Feedback, theme: Theme) -> Option<String> {
    let comments = feedback.comment_count();
    let checks = feedback.status_checks.len();
    match (comments, checks) {
        (0, 0) => None,
        (0, _) => Some(format!(
            "{} Found {checks} failing check(s)",
            theme.paint("✗", Role::Failure)
        )),
        (_, 0) => Some(format!(
            "{} Found {comments} unresolved comment(s)",
            theme.paint("!", Role::Warning)
        )),
        _ => Some(format!(
            "{} Found {comments} unresolved comment(s) and {checks} failing check(s)",
            theme.paint("!", Role::Warning)
        )),
    }
}

fn relative(created_at: &str, now: DateTime<Utc>) -> Option<String> {
    time::parse_timestamp(created_at).map(|at| time::format_relative(now, at))
}

/// "FIRST_TIME_CONTRIBUTOR" -> "First Time Contributor"
fn title_case(association: &str) -> String {
    association
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn general_header(comment: &Comment, now: DateTime<Utc>, theme: Theme) -> String {
    let mut header = format!("{} commented", theme.paint(&comment.author, Role::Strong));
    if let Some(association) = &comment.author_association {
        header.push(' ');
        header.push_str(&theme.paint(&format!("({})", title_case(association)), Role::Muted));
    }
    if let Some(ago) = relative(&comment.created_at, now) {
        header.push_str(" • ");
        header.push_str(&theme.paint(&ago, Role::Muted));
    }
    header
}

fn anchored_header(comment: &Comment, now: DateTime<Utc>, theme: Theme) -> String {
    let mut header = theme.paint(&comment.author, Role::Strong);
    if let Some(association) = comment
        .author_association
        .as_deref()
        .filter(|a| *a != "NONE")
    {
        header.push_str(" • ");
        header.push_str(&theme.paint(&association.to_lowercase().replace('_', " "), Role::Muted));
    }
    if let Some(ago) = relative(&comment.created_at, now) {
        header.push_str(" • ");
        header.push_str(&theme.paint(&ago, Role::Muted));
    }
    if comment.anchor.as_ref().is_some_and(|a| a.outdated) {
        header.push(' ');
        header.push_str(&theme.paint("• Outdated", Role::Warning));
    }
    header
}

fn push_body(lines: &mut Vec<String>, body: &str) {
    lines.extend(body.split('\n').map(str::to_string));
}

fn push_anchored(lines: &mut Vec<String>, comment: &Comment, now: DateTime<Utc>, theme: Theme) {
    lines.push(anchored_header(comment, now, theme));
    lines.push(String::new());
    push_body(lines, &comment.body);
    lines.push(String::new());

    let Some(anchor) = comment.anchor.as_ref().filter(|a| !a.path.is_empty()) else {
        return;
    };

    let location = match anchor.line.filter(|line| *line > 0) {
        Some(line) => format!("{} on line {line}", anchor.path),
        None => anchor.path.clone(),
    };
    lines.push(theme.paint(&location, Role::Location));

    if let Some(diff_hunk) = anchor.diff_hunk.as_deref().filter(|_| !anchor.outdated) {
        lines.push(String::new());
        for hunk_line in hunk::render_hunk(diff_hunk) {
            let text = match Role::for_hunk(hunk_line.kind) {
                Some(role) => theme.paint(hunk_line.text, role),
                None => hunk_line.text.to_string(),
            };
            lines.push(format!("{HUNK_INDENT}{text}"));
        }
    }
}

fn check_line(check: &StatusCheck, theme: Theme) -> String {
    let glyph = if check.is_cancelled() {
        theme.paint("⊘", Role::Warning)
    } else {
        theme.paint("✗", Role::Failure)
    };
    let mut line = format!("{glyph} {}", check.name);

    let started = time::parse_timestamp(&check.started_at);
    let completed = time::parse_timestamp(&check.completed_at);
    if let (Some(started), Some(completed)) = (started, completed) {
        let took = format!("(took {})", time::format_duration(completed - started));
        line.push(' ');
        line.push_str(&theme.paint(&took, Role::Muted));
    }

    if let Some(command) = &check.check_command {
        line.push_str(" → ");
        line.push_str(&theme.paint(command, Role::Command));
    }
    line
}
