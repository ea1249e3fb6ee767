//! In-memory resolver backed by the `[overrides]` configuration table.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;

use super::{BuildOverride, OverrideResolver, OverrideTarget, ResolveError};

/// Resolves signatures from a fixed table. Unknown signatures do not resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    overrides: HashMap<String, BuildOverride>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `signature -> project -> target` tables.
    pub fn from_config(table: &IndexMap<String, IndexMap<String, OverrideTarget>>) -> Self {
        let overrides = table
            .iter()
            .map(|(signature, targets)| {
                (
                    signature.clone(),
                    BuildOverride::from_targets(targets.clone()),
                )
            })
            .collect();
        Self { overrides }
    }

    pub fn insert(&mut self, signature: impl Into<String>, build_override: BuildOverride) {
        self.overrides.insert(signature.into(), build_override);
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[async_trait]
impl OverrideResolver for StaticResolver {
    async fn resolve(&self, signature: &str) -> Result<Option<BuildOverride>, ResolveError> {
        Ok(self.overrides.get(signature).cloned())
    }
}
