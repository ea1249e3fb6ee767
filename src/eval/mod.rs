pub mod context;
pub mod decision;
pub mod render;

pub use context::MatchContext;
pub use decision::{MatchReason, MatchResult};
pub use render::render;

use std::collections::HashSet;

use futures::StreamExt;
use log::{debug, info};

use crate::config::{Config, TriggerConfig};
use crate::extract::{LinkExtractor, SignatureExtractor};
use crate::policy::{BranchPolicy, SignaturePolicy};
use crate::resolve::{HttpResolver, OverrideResolver, ResolveError, StaticResolver};
use crate::sources::{Message, MessageTextSources, TextSourceEnumerator};

/// Unique signatures, first appearance wins.
pub fn dedup(signatures: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    signatures
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// The build-override trigger: policies plus the collaborators they run on.
///
/// A `Trigger` holds no per-evaluation state and can be shared across tasks.
pub struct Trigger {
    config: TriggerConfig,
    signatures: SignaturePolicy,
    branches: BranchPolicy,
    sources: Box<dyn TextSourceEnumerator>,
    extractor: Box<dyn SignatureExtractor>,
    resolver: Box<dyn OverrideResolver>,
}

impl Trigger {
    /// Trigger with the default text sources and link extractor.
    pub fn new(config: TriggerConfig, resolver: impl OverrideResolver + 'static) -> Self {
        Self {
            signatures: SignaturePolicy::from_config(&config),
            branches: BranchPolicy::from_config(&config),
            config,
            sources: Box::new(MessageTextSources::new()),
            extractor: Box::new(LinkExtractor),
            resolver: Box::new(resolver),
        }
    }

    /// Build from configuration. A non-empty `resolver.endpoint` selects the
    /// HTTP resolver; otherwise the `[overrides]` table is used.
    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let trigger = if config.resolver.endpoint.is_empty() {
            Self::new(
                config.trigger.clone(),
                StaticResolver::from_config(&config.overrides),
            )
        } else {
            Self::new(
                config.trigger.clone(),
                HttpResolver::from_config(&config.resolver)?,
            )
        };
        Ok(trigger)
    }

    pub fn with_sources(mut self, sources: impl TextSourceEnumerator + 'static) -> Self {
        self.sources = Box::new(sources);
        self
    }

    pub fn with_extractor(mut self, extractor: impl SignatureExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Scan `message` and return the first decisive match.
    ///
    /// Sources are pulled in enumerator order and signatures resolved in
    /// dedup order; the first decision ends the scan. Resolver failures are
    /// returned as-is.
    pub async fn evaluate(
        &self,
        message: Option<&Message>,
    ) -> Result<Option<MatchResult>, ResolveError> {
        let Some(message) = message else {
            return Ok(None);
        };

        let mut sources = self.sources.sources(message, self.config.source_flags());
        while let Some((source, text)) = sources.next().await {
            let unique = dedup(self.extractor.extract(&text));
            if unique.is_empty() {
                continue;
            }
            debug!(
                "{}: {} unique signature(s) in message {}",
                source.as_str(),
                unique.len(),
                message.id
            );

            if let Some((signature, reason)) = self.signatures.first_match(&unique) {
                return Ok(Some(matched(MatchResult::signature_only(
                    source, signature, reason,
                ))));
            }

            for signature in &unique {
                let Some(build_override) = self.resolver.resolve(signature).await? else {
                    return Ok(Some(matched(MatchResult::signature_only(
                        source,
                        signature.as_str(),
                        MatchReason::Unresolved,
                    ))));
                };

                let decision = self
                    .branches
                    .first_match(&build_override)
                    .map(|(project, reason)| (project.to_string(), reason));
                match decision {
                    Some((project, reason)) => {
                        debug!("{signature}: project {project} decided the match");
                        return Ok(Some(matched(MatchResult::with_override(
                            source,
                            signature.as_str(),
                            build_override,
                            reason,
                        ))));
                    }
                    None => debug!("{signature}: no project decided"),
                }
            }
        }

        Ok(None)
    }
}

fn matched(result: MatchResult) -> MatchResult {
    info!(
        "matched {} in {} ({})",
        result.signature,
        result.source.as_str(),
        result.reason.description()
    );
    result
}
