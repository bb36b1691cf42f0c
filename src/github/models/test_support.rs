//! Test helpers for constructing remote GitHub fixtures.
//!
//! # Examples
//!
//! ```
//! use prsync::github::models::test_support::open_pull_request;
//!
//! let remote = open_pull_request(4, "Add parser");
//! assert_eq!(remote.number, 4);
//! assert_eq!(remote.state, "open");
//! ```

use super::{RemotePullRequest, RemoteUser};

/// Offset applied to pull request numbers to derive a stable fixture id.
const GITHUB_ID_OFFSET: u64 = 10_000;

/// Constructs a GitHub user with the given id and login.
#[must_use]
pub fn remote_user(id: u64, login: &str) -> RemoteUser {
    RemoteUser {
        id,
        login: login.to_owned(),
        email: Some(format!("{login}@example.invalid")),
        avatar_url: None,
        user_type: Some("User".to_owned()),
    }
}

/// Constructs an open pull request from `feature/<number>` into `main`,
/// authored by `octocat` (GitHub id 1).
///
/// The GitHub id is derived from the number so fixtures stay stable across
/// calls.
#[must_use]
pub fn open_pull_request(number: u64, title: &str) -> RemotePullRequest {
    RemotePullRequest {
        github_id: GITHUB_ID_OFFSET + number,
        number,
        title: Some(title.to_owned()),
        body: None,
        state: "open".to_owned(),
        base: "main".to_owned(),
        head: format!("feature/{number}"),
        html_url: Some(format!("https://github.com/octo/repo/pull/{number}")),
        author: Some(remote_user(1, "octocat")),
        requested_reviewers: Vec::new(),
    }
}
