//! Override resolution: turning a signature into per-project override targets.

pub mod http;
pub mod static_table;

pub use http::HttpResolver;
pub use static_table::StaticResolver;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where one project's build is redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTarget", into = "RawTarget")]
pub enum OverrideTarget {
    /// A named branch.
    Branch { id: String },
    /// Any other kind of target (a specific build id, a release channel, ...).
    Other { kind: String, id: String },
}

impl OverrideTarget {
    pub fn branch(id: impl Into<String>) -> Self {
        OverrideTarget::Branch { id: id.into() }
    }

    pub fn other(kind: impl Into<String>, id: impl Into<String>) -> Self {
        OverrideTarget::Other {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            OverrideTarget::Branch { .. } => "branch",
            OverrideTarget::Other { kind, .. } => kind,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            OverrideTarget::Branch { id } | OverrideTarget::Other { id, .. } => id,
        }
    }
}

impl fmt::Display for OverrideTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideTarget::Branch { id } => write!(f, "branch {id}"),
            OverrideTarget::Other { id, .. } => write!(f, "id {id}"),
        }
    }
}

/// Wire shape of a target: `{"type": "branch", "id": "..."}`.
#[derive(Serialize, Deserialize)]
struct RawTarget {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

impl From<RawTarget> for OverrideTarget {
    fn from(raw: RawTarget) -> Self {
        if raw.kind == "branch" {
            OverrideTarget::Branch { id: raw.id }
        } else {
            OverrideTarget::Other {
                kind: raw.kind,
                id: raw.id,
            }
        }
    }
}

impl From<OverrideTarget> for RawTarget {
    fn from(target: OverrideTarget) -> Self {
        match target {
            OverrideTarget::Branch { id } => RawTarget {
                kind: "branch".into(),
                id,
            },
            OverrideTarget::Other { kind, id } => RawTarget { kind, id },
        }
    }
}

/// A resolved build override.
///
/// Projects iterate in the order the resolver listed them. The metadata fields are carried
/// through for display and never influence policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOverride {
    pub target_build_override: IndexMap<String, OverrideTarget>,
    #[serde(default)]
    pub release_channel: Option<String>,
    #[serde(default)]
    pub valid_for_user_ids: Vec<String>,
    #[serde(default)]
    pub allow_logged_out: bool,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl BuildOverride {
    pub fn from_targets(targets: IndexMap<String, OverrideTarget>) -> Self {
        Self {
            target_build_override: targets,
            ..Self::default()
        }
    }

    /// `(project, target)` pairs in document order.
    pub fn projects(&self) -> impl Iterator<Item = (&str, &OverrideTarget)> {
        self.target_build_override
            .iter()
            .map(|(project, target)| (project.as_str(), target))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request for signature {signature} failed: {source}")]
    Transport {
        signature: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("resolver returned HTTP {status} for signature {signature}")]
    Status { signature: String, status: u16 },

    #[error("malformed override metadata for signature {signature}: {source}")]
    Decode {
        signature: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("resolver unavailable: {0}")]
    Unavailable(String),
}

/// Looks up the override a signature refers to.
///
/// `Ok(None)` means the signature does not correspond to a real override.
/// `Err` is reserved for failing to get an answer at all.
#[async_trait]
pub trait OverrideResolver: Send + Sync {
    async fn resolve(&self, signature: &str) -> Result<Option<BuildOverride>, ResolveError>;
}

#[async_trait]
impl<T: OverrideResolver + ?Sized> OverrideResolver for Arc<T> {
    async fn resolve(&self, signature: &str) -> Result<Option<BuildOverride>, ResolveError> {
        (**self).resolve(signature).await
    }
}
