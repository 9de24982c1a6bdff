use std::fmt;

use url::Url;

/// Host a resource homepage must point at to be resolvable.
pub const GITHUB_HOST: &str = "github.com";

/// Repository identifier parsed from a resource homepage, plus the optional
/// credential used to reach it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub access_token: Option<String>,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            access_token: None,
        }
    }

    /// Attach a credential. Empty tokens are ignored.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// Never print the token.
impl fmt::Debug for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryRef")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Parse a resource homepage into a repository reference.
///
/// Only `github.com` URLs whose path is exactly `/{owner}/{repo}` (surrounding
/// slashes ignored) qualify. Anything else returns `None`, meaning the
/// resource is simply not GitHub-backed.
pub fn parse_repository_ref(url: &str) -> Option<RepositoryRef> {
    let parsed = Url::parse(url.trim()).ok()?;

    if parsed.host_str()? != GITHUB_HOST {
        return None;
    }

    let segments: Vec<&str> = parsed.path().trim_matches('/').split('/').collect();
    match segments.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => {
            Some(RepositoryRef::new(*owner, *name))
        }
        _ => None,
    }
}
