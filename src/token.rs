//! Capability token guarding the on-demand update check.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use thiserror::Error;
use uuid::Uuid;

use crate::runtime::Runtime;

/// File name of the stored token inside the state directory.
pub const TOKEN_FILE_NAME: &str = "update-check.token";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Unauthorized: invalid update-check token")]
    Unauthorized,
}

/// Persisted token, generated once and never overwritten.
pub struct TokenStore<R: Runtime> {
    runtime: R,
    path: PathBuf,
}

impl<R: Runtime> TokenStore<R> {
    pub fn new(runtime: R, state_dir: &Path) -> Self {
        Self {
            runtime,
            path: state_dir.join(TOKEN_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Currently stored token, if any.
    ///
    /// Surrounding whitespace in the file is ignored, so a hand-edited file
    /// with a trailing newline holds the same token.
    pub fn stored_token(&self) -> Result<Option<String>> {
        if !self.runtime.exists(&self.path) {
            return Ok(None);
        }
        let token = self
            .runtime
            .read_to_string(&self.path)
            .context("Failed to read update-check token")?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    /// Return the stored token, generating and persisting one first if needed.
    #[tracing::instrument(skip(self))]
    pub fn ensure_token(&self) -> Result<String> {
        if let Some(token) = self.stored_token()? {
            debug!("Using existing update-check token from {}", self.path.display());
            return Ok(token);
        }

        if let Some(parent) = self.path.parent() {
            self.runtime.create_dir_all(parent)?;
        }
        let token = Uuid::new_v4().to_string();
        self.runtime
            .write(&self.path, token.as_bytes())
            .context("Failed to store update-check token")?;
        info!("Generated update-check token in {}", self.path.display());
        Ok(token)
    }

    /// Check a presented token against the stored one.
    ///
    /// The presented token must equal the trimmed stored token exactly. Fails
    /// with [`TokenError::Unauthorized`] on mismatch, and when no token has
    /// been generated yet.
    pub fn verify(&self, presented: &str) -> Result<()> {
        match self.stored_token()? {
            Some(stored) if constant_time_eq(stored.as_bytes(), presented.as_bytes()) => Ok(()),
            _ => Err(TokenError::Unauthorized.into()),
        }
    }
}

/// Byte equality whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
