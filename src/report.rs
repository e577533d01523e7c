use std::io::{self, IsTerminal, Write};

use anyhow::Result;

use crate::types::ReleaseIssue;

const TABLE_HEADERS: &[&str] = &[
    "KEY", "SUMMARY", "STATUS", "REPOS", "AUTHORS", "LINKED", "REMARKS",
];

/// One report row per release issue, keyed by issue key. Multi-valued
/// columns are comma-joined distinct values.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRow {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub repos: String,
    pub authors: String,
    pub linked: String,
    pub remarks: String,
}

/// First-appearance de-duplication; report columns keep the order the
/// values arrived in rather than sorting.
fn distinct<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Builds the release summary rows. Read-only: no tracker or hosting call
/// happens here, the issues already carry their pull-request references.
pub fn build_release_report(issues: &[ReleaseIssue]) -> Vec<ReleaseRow> {
    issues
        .iter()
        .map(|release_issue| {
            let issue = &release_issue.issue;
            let repos = distinct(
                release_issue
                    .pull_requests
                    .iter()
                    .map(|pr| pr.repo.as_str().to_string()),
            );
            let authors = distinct(
                release_issue
                    .pull_requests
                    .iter()
                    .map(|pr| pr.author.clone()),
            );
            let linked = distinct(issue.linked_keys.iter().cloned());

            ReleaseRow {
                key: issue.key.clone(),
                summary: issue.summary.clone(),
                status: issue.status.clone(),
                repos: repos.join(","),
                authors: authors.join(","),
                linked: linked.join(","),
                remarks: issue.deployment_remarks.clone().unwrap_or_default(),
            }
        })
        .collect()
}

/// Renders the report as an aligned text table, clamping the last column to
/// the terminal width when stdout is a TTY.
pub fn render_release_table<W: Write>(rows: &[ReleaseRow], writer: &mut W) -> Result<()> {
    let terminal_width = if io::stdout().is_terminal() {
        terminal_size::terminal_size().map(|(w, _)| w.0 as usize)
    } else {
        None
    };
    render_release_table_with_width(rows, writer, terminal_width)
}

fn render_release_table_with_width<W: Write>(
    rows: &[ReleaseRow],
    writer: &mut W,
    terminal_width: Option<usize>,
) -> Result<()> {
    if rows.is_empty() {
        writeln!(writer, "No issues found for this release.")?;
        return Ok(());
    }

    let mut cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.key.clone(),
                row.summary.clone(),
                row.status.clone(),
                row.repos.clone(),
                row.authors.clone(),
                row.linked.clone(),
                row.remarks.clone(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = TABLE_HEADERS.iter().map(|h| display_width(h)).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    // Clamp the last column (remarks, free text) when the table would
    // overflow the terminal.
    if let Some(terminal_width) = terminal_width {
        let last = TABLE_HEADERS.len() - 1;
        let fixed_width: usize = widths[..last].iter().sum::<usize>() + 2 * last;
        if fixed_width < terminal_width {
            let available = terminal_width - fixed_width;
            if widths[last] > available && available > 3 {
                widths[last] = available;
                for row in &mut cells {
                    if display_width(&row[last]) > available {
                        row[last] = truncate_with_ellipsis(&row[last], available);
                    }
                }
            }
        }
    }

    for (i, header) in TABLE_HEADERS.iter().enumerate() {
        write!(writer, "{:<width$}", header, width = widths[i])?;
        if i < TABLE_HEADERS.len() - 1 {
            write!(writer, "  ")?;
        }
    }
    writeln!(writer)?;

    for (i, &width) in widths.iter().enumerate() {
        write!(writer, "{}", "-".repeat(width))?;
        if i < widths.len() - 1 {
            write!(writer, "  ")?;
        }
    }
    writeln!(writer)?;

    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            write!(writer, "{:<width$}", cell, width = widths[i])?;
            if i < row.len() - 1 {
                write!(writer, "  ")?;
            }
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Column width in characters. Cells carry free text straight from the
/// tracker, so they are not guaranteed to be ASCII.
fn display_width(text: &str) -> usize {
    text.chars().count()
}

/// Shortens `text` to `width` characters including the trailing ellipsis,
/// always cutting on a character boundary.
fn truncate_with_ellipsis(text: &str, width: usize) -> String {
    let kept: String = text.chars().take(width - 3).collect();
    format!("{kept}...")
}
