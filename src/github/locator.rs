//! Repository identity wrappers and API base derivation.

use url::Url;

use super::error::GatewayError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, GatewayError> {
        if value.is_empty() {
            return Err(GatewayError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, GatewayError> {
        if value.is_empty() {
            return Err(GatewayError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GatewayError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GatewayError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Derives the GitHub API base URL from a parsed web URL.
///
/// `github.com` maps to the public API host; any other host is treated as a
/// GitHub Enterprise installation serving the API under `/api/v3`.
fn derive_api_base(parsed: &Url) -> Result<Url, GatewayError> {
    let host = parsed
        .host_str()
        .ok_or_else(|| GatewayError::InvalidUrl("URL must include a host".to_owned()))?;

    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse("https://api.github.com")
            .map_err(|error| GatewayError::InvalidUrl(error.to_string()));
    }

    let authority = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let mut api_url = Url::parse(&format!("{}://{authority}", parsed.scheme()))
        .map_err(|error| GatewayError::InvalidUrl(error.to_string()))?;
    api_url
        .set_port(parsed.port())
        .map_err(|()| GatewayError::InvalidUrl("invalid port".to_owned()))?;
    api_url.set_path("api/v3");
    Ok(api_url)
}

/// A GitHub repository together with the API base that serves it.
///
/// # Example
///
/// ```
/// use prsync::github::RepositoryLocator;
///
/// let locator = RepositoryLocator::parse("https://github.com/octo/repo")
///     .expect("should parse repository URL");
/// assert_eq!(locator.owner().as_str(), "octo");
/// assert_eq!(locator.full_name(), "octo/repo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a locator from owner and repository name strings, served by
    /// `api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingPathSegments` when owner or repo is empty.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, GatewayError> {
        let validated_owner = RepositoryOwner::new(owner)?;
        let repository = RepositoryName::new(repo)?;
        let api_base = Url::parse("https://api.github.com")
            .map_err(|error| GatewayError::InvalidUrl(error.to_string()))?;

        Ok(Self {
            api_base,
            owner: validated_owner,
            repository,
        })
    }

    /// Creates a locator from an `owner/repo` full name against an explicit
    /// API base URL.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` when the base cannot be parsed and
    /// `GatewayError::MissingPathSegments` when the full name is not
    /// `owner/repo`.
    pub fn from_full_name(api_base: &str, full_name: &str) -> Result<Self, GatewayError> {
        let (owner, repo) = full_name
            .split_once('/')
            .ok_or(GatewayError::MissingPathSegments)?;
        if repo.contains('/') {
            return Err(GatewayError::MissingPathSegments);
        }
        let api_base_url =
            Url::parse(api_base).map_err(|error| GatewayError::InvalidUrl(error.to_string()))?;

        Ok(Self {
            api_base: api_base_url,
            owner: RepositoryOwner::new(owner)?,
            repository: RepositoryName::new(repo)?,
        })
    }

    /// Parses a repository web URL in the form `https://github.com/<owner>/<repo>`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` when parsing fails or
    /// `MissingPathSegments` when the URL path is not `/owner/repo`.
    pub fn parse(input: &str) -> Result<Self, GatewayError> {
        let parsed =
            Url::parse(input).map_err(|error| GatewayError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(GatewayError::MissingPathSegments)?;

        let owner_segment = segments.next().ok_or(GatewayError::MissingPathSegments)?;
        let repository_segment = segments.next().ok_or(GatewayError::MissingPathSegments)?;

        let owner = RepositoryOwner::new(owner_segment)?;
        let repository = RepositoryName::new(repository_segment)?;
        let api_base = derive_api_base(&parsed)?;

        Ok(Self {
            api_base,
            owner,
            repository,
        })
    }

    /// API base URL derived from the repository host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns `owner/repo`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.repository.as_str())
    }

    pub(crate) fn pulls_path(&self) -> String {
        format!("/repos/{}/pulls", self.full_name())
    }

    pub(crate) fn pull_request_commits_path(&self, number: u64) -> String {
        format!("/repos/{}/pulls/{number}/commits", self.full_name())
    }

    pub(crate) fn pull_request_files_path(&self, number: u64) -> String {
        format!("/repos/{}/pulls/{number}/files", self.full_name())
    }

    /// Route for `base...head` with each ref percent-encoded per path segment.
    ///
    /// `/` stays a separator; `#`, `?`, `%` and non-ASCII characters are
    /// escaped so the whole ref reaches GitHub.
    pub(crate) fn compare_path(&self, base: &str, head: &str) -> String {
        format!(
            "/repos/{}/compare/{}...{}",
            self.full_name(),
            self.encode_ref(base),
            self.encode_ref(head)
        )
    }

    fn encode_ref(&self, git_ref: &str) -> String {
        let mut scratch = self.api_base.clone();
        match scratch.path_segments_mut() {
            Ok(mut segments) => {
                segments.clear().extend(git_ref.split('/'));
            }
            Err(()) => return git_ref.to_owned(),
        }
        scratch.path().trim_start_matches('/').to_owned()
    }
}
