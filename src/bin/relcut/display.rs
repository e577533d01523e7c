use std::io::Write;

use anyhow::Result;
use relcut::{OutcomeStatus, RepoOutcome};

/// Prints one line per repository in the resolved set, then a summary count
/// line. The batch never aborts on a single repository, so every resolved
/// repository is accounted for here.
pub fn print_outcomes<W: Write>(outcomes: &[RepoOutcome], writer: &mut W) -> Result<()> {
    if outcomes.is_empty() {
        writeln!(writer, "No repositories to process for this release.")?;
        return Ok(());
    }

    // Character count, not byte length; repository names are not
    // guaranteed to be ASCII.
    let name_width = outcomes
        .iter()
        .map(|outcome| outcome.repo.as_str().chars().count())
        .max()
        .unwrap_or(0);

    for outcome in outcomes {
        match &outcome.status {
            OutcomeStatus::Completed => {
                writeln!(writer, "{:<name_width$}  ok", outcome.repo.as_str())?;
            }
            OutcomeStatus::Skipped => {
                writeln!(
                    writer,
                    "{:<name_width$}  skipped (not managed by this automation)",
                    outcome.repo.as_str()
                )?;
            }
            OutcomeStatus::Failed(error) => {
                writeln!(
                    writer,
                    "{:<name_width$}  failed: {:#}",
                    outcome.repo.as_str(),
                    error
                )?;
            }
        }
    }

    let completed = outcomes.iter().filter(|o| o.is_completed()).count();
    let skipped = outcomes.iter().filter(|o| o.is_skipped()).count();
    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    writeln!(
        writer,
        "{} completed, {} skipped, {} failed",
        completed, skipped, failed
    )?;

    Ok(())
}
