use serde::Serialize;

use crate::resolve::BuildOverride;
use crate::sources::SourceKind;

/// The rule that made a signature decisive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// Signature is on the include list.
    IncludedSignature,
    /// Signature is missing from the exclude list.
    UnlistedSignature,
    /// Signature does not resolve to a real override.
    Unresolved,
    /// A project targets a branch on the include list.
    IncludedBranch,
    /// A project targets a branch missing from the exclude list.
    UnlistedBranch,
}

impl MatchReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchReason::IncludedSignature => "included_signature",
            MatchReason::UnlistedSignature => "unlisted_signature",
            MatchReason::Unresolved => "unresolved",
            MatchReason::IncludedBranch => "included_branch",
            MatchReason::UnlistedBranch => "unlisted_branch",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MatchReason::IncludedSignature => "signature is include-listed",
            MatchReason::UnlistedSignature => "signature is not exclude-listed",
            MatchReason::Unresolved => "signature does not resolve to an override",
            MatchReason::IncludedBranch => "override targets an include-listed branch",
            MatchReason::UnlistedBranch => "override targets a branch that is not exclude-listed",
        }
    }
}

/// A decisive match. At most one is produced per evaluation.
///
/// `build_override` is present only when the match came from the branch
/// policy; signature-policy and unresolved matches carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub source: SourceKind,
    pub signature: String,
    pub build_override: Option<BuildOverride>,
    pub reason: MatchReason,
}

impl MatchResult {
    pub(crate) fn signature_only(
        source: SourceKind,
        signature: impl Into<String>,
        reason: MatchReason,
    ) -> Self {
        Self {
            source,
            signature: signature.into(),
            build_override: None,
            reason,
        }
    }

    pub(crate) fn with_override(
        source: SourceKind,
        signature: impl Into<String>,
        build_override: BuildOverride,
        reason: MatchReason,
    ) -> Self {
        Self {
            source,
            signature: signature.into(),
            build_override: Some(build_override),
            reason,
        }
    }
}
