//! Output formatting utilities for CLI operations.

use std::io::{self, Write};

use prsync::ServiceError;
use prsync::persistence::PullRequestRecord;
use prsync::preparation::PreparationDraft;

/// Writes the local pull request list of a repository.
pub fn write_records<W: Write>(
    writer: &mut W,
    full_name: &str,
    records: &[PullRequestRecord],
) -> Result<(), ServiceError> {
    writeln!(writer, "Pull requests for {full_name}:").map_err(|e| io_error(&e))?;
    writeln!(writer).map_err(|e| io_error(&e))?;

    for record in records {
        let fields = &record.fields;
        writeln!(
            writer,
            "  #{} [{}] {} ({} -> {})",
            fields.github_pr_number,
            fields.state,
            fields.title,
            fields.head_branch,
            fields.base_branch
        )
        .map_err(|e| io_error(&e))?;
    }

    writeln!(writer).map_err(|e| io_error(&e))?;
    writeln!(writer, "{} pull requests tracked.", records.len()).map_err(|e| io_error(&e))
}

/// Writes a summary of a draft.
pub fn write_draft<W: Write>(
    writer: &mut W,
    draft: &PreparationDraft,
) -> Result<(), ServiceError> {
    let key = draft.key();
    let comparison = draft.comparison();
    let creatable = if draft.is_creatable() {
        "ready to promote"
    } else {
        "nothing to merge"
    };

    writeln!(
        writer,
        "Draft {} -> {} in {} ({creatable})",
        key.source(),
        key.target(),
        draft.repository().full_name
    )
    .map_err(|e| io_error(&e))?;
    writeln!(
        writer,
        "Status: {} (ahead {}, behind {}), {} commits, {} files",
        comparison.status,
        comparison.ahead_by,
        comparison.behind_by,
        comparison.commits.len(),
        comparison.files.len()
    )
    .map_err(|e| io_error(&e))?;
    writeln!(writer, "Title: {}", draft.title().unwrap_or("(not set)"))
        .map_err(|e| io_error(&e))?;
    if let Some(summary) = draft.summary() {
        writeln!(writer, "Summary: {summary}").map_err(|e| io_error(&e))?;
    }

    for commit in &comparison.commits {
        writeln!(writer, "  {} {}", commit.short_sha(), commit.title())
            .map_err(|e| io_error(&e))?;
    }
    for file in &comparison.files {
        writeln!(
            writer,
            "  {} {} (+{} -{})",
            file.status, file.filename, file.additions, file.deletions
        )
        .map_err(|e| io_error(&e))?;
    }
    Ok(())
}

/// Writes the record of a freshly promoted pull request.
pub fn write_promoted<W: Write>(
    writer: &mut W,
    record: &PullRequestRecord,
) -> Result<(), ServiceError> {
    let fields = &record.fields;
    let url = fields.html_url.as_deref().unwrap_or("no HTML URL provided");
    writeln!(
        writer,
        "Created PR #{}: {}\nURL: {url}",
        fields.github_pr_number, fields.title
    )
    .map_err(|e| io_error(&e))
}

/// Converts an I/O error to a [`ServiceError::Unrecoverable`].
fn io_error(error: &io::Error) -> ServiceError {
    ServiceError::Unrecoverable {
        message: error.to_string(),
    }
}
