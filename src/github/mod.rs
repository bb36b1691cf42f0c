//! GitHub access for reconciliation and preparation.
//!
//! This module wraps Octocrab behind the [`SourceControlGateway`] trait: it
//! compares refs, lists and creates pull requests, and lists their commits and
//! files. Errors are mapped into [`GatewayError`] variants so callers never see
//! Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;

pub use error::GatewayError;
pub use gateway::{OctocrabGateway, SourceControlGateway};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{
    Comparison, ComparisonLinks, ComparisonStatus, NewRemotePullRequest, RemoteCommit, RemoteFile,
    RemotePullRequest, RemoteSignature, RemoteUser,
};

#[cfg(test)]
pub use gateway::MockSourceControlGateway;
