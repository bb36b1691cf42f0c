//! Repository sync operation.

use std::io;
use std::sync::Arc;

use prsync::{LocalPullRequestService, PrsyncConfig, PullRequestService, ServiceError};

use super::context::Context;
use super::output::write_records;

/// Reconciles the configured repository and lists its local records.
///
/// # Errors
///
/// Returns any [`ServiceError`] from connecting, reconciling, or writing
/// output.
pub async fn run(config: &PrsyncConfig) -> Result<(), ServiceError> {
    let context = Context::connect(config).await?;
    let service = LocalPullRequestService::new(
        Arc::clone(&context.gateway),
        Arc::clone(&context.store),
        context.resolver.clone(),
        Arc::new(context.workflow()?),
        context.reconciler(config)?,
    );

    let records = service.sync(context.repository.id, &context.actor).await?;

    let mut stdout = io::stdout().lock();
    write_records(&mut stdout, &context.repository.full_name, &records)
}
