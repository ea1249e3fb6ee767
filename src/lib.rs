//! override-trigger: an automod trigger for build-override references.
//!
//! A build override is a signed link that redirects one or more projects'
//! builds to a non-default branch or artifact. This crate scans a chat
//! message for override signatures, judges each one against signature and
//! branch include/exclude lists, and reports the first decisive match as a
//! [`eval::MatchResult`] that can later be rendered for a moderation log.
//!
//! # Architecture
//!
//! - **[`sources`]**: Message model and lazy text-source enumeration.
//! - **[`extract`]**: Signature extraction from free text.
//! - **[`policy`]**: Signature and branch include/exclude policies.
//! - **[`resolve`]**: Signature → per-project override target resolution.
//! - **[`eval`]**: The trigger: orchestration loop, match types, rendering.
//! - **[`summary`]**: Partial summaries describing where a match occurred.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: stderr logging and the match log.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// The trigger: orchestration, match results, rendering.
pub mod eval;
/// Signature extraction.
pub mod extract;
/// Logger setup and match records.
pub mod logging;
/// Include/exclude list policies.
pub mod policy;
/// Override resolution.
pub mod resolve;
/// Message model and text sources.
pub mod sources;
/// Partial summary formatting.
pub mod summary;

pub use eval::{MatchContext, MatchReason, MatchResult, Trigger, render};

use config::TriggerConfig;
use resolve::{OverrideResolver, ResolveError};
use sources::Message;

/// Evaluate one message with the default text sources and link extractor.
///
/// For repeated evaluation, member lookups, or a custom extractor, build a
/// [`Trigger`] directly.
pub async fn evaluate(
    config: &TriggerConfig,
    message: Option<&Message>,
    resolver: impl OverrideResolver + 'static,
) -> Result<Option<MatchResult>, ResolveError> {
    Trigger::new(config.clone(), resolver).evaluate(message).await
}
