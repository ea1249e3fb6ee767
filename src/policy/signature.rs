use super::{ListHit, ListPolicy};
use crate::config::TriggerConfig;
use crate::eval::MatchReason;

/// Applies `include_signatures` / `exclude_signatures` to raw signature text.
///
/// Never consults the resolver: a signature is judged by its text alone.
#[derive(Debug, Clone, Default)]
pub struct SignaturePolicy {
    lists: ListPolicy,
}

impl SignaturePolicy {
    pub fn from_config(config: &TriggerConfig) -> Self {
        Self {
            lists: ListPolicy::new(
                config.include_signatures.clone(),
                config.exclude_signatures.clone(),
            ),
        }
    }

    pub fn evaluate(&self, signature: &str) -> Option<MatchReason> {
        self.lists.check(signature).map(|hit| match hit {
            ListHit::Included => MatchReason::IncludedSignature,
            ListHit::Unlisted => MatchReason::UnlistedSignature,
        })
    }

    /// First decisive signature, in the given order.
    pub fn first_match<'s>(&self, signatures: &'s [String]) -> Option<(&'s str, MatchReason)> {
        signatures
            .iter()
            .find_map(|s| self.evaluate(s).map(|reason| (s.as_str(), reason)))
    }
}
