use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of host resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Plugin,
    Theme,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Plugin => write!(f, "plugin"),
            ResourceKind::Theme => write!(f, "theme"),
        }
    }
}

/// A plugin or theme installed on the host.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub kind: ResourceKind,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Plugin or theme URI; only GitHub repositories are managed.
    pub homepage: String,
    pub installed_version: String,
    /// Overrides the default access token for this resource.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", &self.kind)
            .field("slug", &self.slug)
            .field("homepage", &self.homepage)
            .field("installed_version", &self.installed_version)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

/// Entry stored in the host's update transient, keyed by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOffer {
    pub slug: String,
    pub new_version: String,
    pub url: String,
    pub package: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoSections {
    pub description: String,
    pub changelog: String,
}

/// Record shown in the host's details lightbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub slug: String,
    pub name: String,
    pub version: String,
    pub author: String,
    pub homepage: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub download_link: String,
    pub sections: InfoSections,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tested: Option<String>,
}

/// Outcome of checking one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    UpdateAvailable { offer: UpdateOffer },
    UpToDate,
    /// The homepage is not a GitHub repository.
    NotManaged,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub slug: String,
    #[serde(flatten)]
    pub status: CheckStatus,
}

impl CheckReport {
    pub fn offer(&self) -> Option<&UpdateOffer> {
        match &self.status {
            CheckStatus::UpdateAvailable { offer } => Some(offer),
            _ => None,
        }
    }
}
