//! Error kinds produced while resolving a release.

use thiserror::Error;

/// Failure modes of release resolution.
///
/// None of these is fatal to a check cycle: callers degrade every variant to
/// "no update available", but only [`ResolveError::NetworkFailure`] is worth
/// surfacing to an operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The resource homepage is not a `https://github.com/{owner}/{repo}` URL.
    #[error("Not a GitHub repository URL: {0}")]
    InvalidRepositoryUrl(String),

    /// The provider answered with an empty body, an empty list, or something
    /// that is not a list of releases.
    #[error("No release available")]
    NoReleaseAvailable,

    /// The release list could not be decoded.
    #[error("Malformed release payload: {0}")]
    MalformedReleasePayload(String),

    /// Transport error, timeout, or a non-success HTTP status.
    #[error("Network failure: {0}")]
    NetworkFailure(String),
}

impl ResolveError {
    /// Whether this failure simply means "there is nothing to update to".
    pub fn is_no_release(&self) -> bool {
        matches!(
            self,
            ResolveError::NoReleaseAvailable | ResolveError::MalformedReleasePayload(_)
        )
    }
}

impl From<anyhow::Error> for ResolveError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(resolve) = err.downcast_ref::<ResolveError>() {
            return resolve.clone();
        }
        ResolveError::NetworkFailure(format!("{:#}", err))
    }
}
