use super::{ListHit, ListPolicy};
use crate::config::TriggerConfig;
use crate::eval::MatchReason;
use crate::resolve::{BuildOverride, OverrideTarget};

/// Applies `include_branches` / `exclude_branches` to resolved targets.
///
/// Only branch targets are judged; other kinds never decide.
#[derive(Debug, Clone, Default)]
pub struct BranchPolicy {
    lists: ListPolicy,
}

impl BranchPolicy {
    pub fn from_config(config: &TriggerConfig) -> Self {
        Self {
            lists: ListPolicy::new(
                config.include_branches.clone(),
                config.exclude_branches.clone(),
            ),
        }
    }

    pub fn evaluate(&self, target: &OverrideTarget) -> Option<MatchReason> {
        let OverrideTarget::Branch { id } = target else {
            return None;
        };
        self.lists.check(id).map(|hit| match hit {
            ListHit::Included => MatchReason::IncludedBranch,
            ListHit::Unlisted => MatchReason::UnlistedBranch,
        })
    }

    /// First decisive project, in the order the override lists them.
    pub fn first_match<'o>(
        &self,
        build_override: &'o BuildOverride,
    ) -> Option<(&'o str, MatchReason)> {
        build_override
            .projects()
            .find_map(|(project, target)| self.evaluate(target).map(|reason| (project, reason)))
    }
}
