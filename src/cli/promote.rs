//! Draft promotion operation.

use std::io;

use prsync::{PrsyncConfig, ServiceError};

use super::context::Context;
use super::output::write_promoted;
use super::prepare::prepared_draft;

/// Creates the pull request for the configured branch pair.
///
/// A missing draft is started first and any configured title, body, or
/// summary is applied before promotion.
///
/// # Errors
///
/// Returns any [`ServiceError`] from connecting, the workflow, or writing
/// output.
pub async fn run(config: &PrsyncConfig) -> Result<(), ServiceError> {
    let context = Context::connect(config).await?;
    let workflow = context.workflow()?;

    let draft = prepared_draft(&context, &workflow, config).await?;
    let key = draft.key();
    let record = workflow
        .promote_draft(key.repository_id(), key.source(), key.target())
        .await?;

    let mut stdout = io::stdout().lock();
    write_promoted(&mut stdout, &record)
}
