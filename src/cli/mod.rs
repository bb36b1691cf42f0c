//! CLI operation mode handlers.
//!
//! This module contains the implementations for the operation modes:
//! - [`migrations`]: Database schema migrations
//! - [`sync`]: Reconcile the local store with GitHub and list records
//! - [`prepare`]: Start or enrich a draft for a branch pair
//! - [`promote`]: Create the pull request for a draft
//!
//! Shared wiring lives in [`context`]; output formatting in [`output`].

pub mod context;
pub mod migrations;
pub mod output;
pub mod prepare;
pub mod promote;
pub mod sync;
