//! Draft preparation operation.

use std::io;

use prsync::preparation::{EnrichRequest, PreparationDraft};
use prsync::{PreparationWorkflow, PrsyncConfig, ServiceError};

use super::context::Context;
use super::output::write_draft;

/// Starts a draft for `source` into `target` unless one is cached, then
/// applies any title, body, or summary from the configuration.
///
/// # Errors
///
/// Returns any [`ServiceError`] from connecting, the workflow, or writing
/// output.
pub async fn run(config: &PrsyncConfig) -> Result<(), ServiceError> {
    let context = Context::connect(config).await?;
    let workflow = context.workflow()?;

    let draft = prepared_draft(&context, &workflow, config).await?;

    let mut stdout = io::stdout().lock();
    write_draft(&mut stdout, &draft)
}

/// Returns the enriched draft for the configured branch pair, starting one
/// when none is cached.
pub(super) async fn prepared_draft(
    context: &Context,
    workflow: &PreparationWorkflow,
    config: &PrsyncConfig,
) -> Result<PreparationDraft, ServiceError> {
    let (source, target) = config.require_branches()?;
    let repository_id = context.repository.id;

    let draft = match workflow.draft(repository_id, source, target) {
        Ok(draft) => draft,
        Err(ServiceError::NotFound { .. }) => {
            workflow
                .start_preparation(repository_id, source, target, &context.actor)
                .await?
        }
        Err(error) => return Err(error),
    };

    let request = enrichment(config, source, target);
    if request.title.is_none() && request.body.is_none() && request.summary.is_none() {
        return Ok(draft);
    }
    workflow.enrich(repository_id, request).await
}

fn enrichment(config: &PrsyncConfig, source: &str, target: &str) -> EnrichRequest {
    EnrichRequest {
        source: source.to_owned(),
        target: target.to_owned(),
        title: config.title.clone(),
        body: config.body.clone(),
        summary: config.summary.clone(),
        ..EnrichRequest::default()
    }
}
