//! Include/exclude list policies.
//!
//! Both the signature and branch policies share one asymmetric rule, applied
//! in this order:
//!
//! 1. value is on a configured include list → match
//! 2. value is missing from a configured exclude list → match
//! 3. otherwise → no decision
//!
//! An include-list hit wins regardless of the exclude list, and a configured
//! exclude list flags anything it does not name.

/// Branch policy over resolved override targets.
pub mod branch;
/// Signature policy over raw signature text.
pub mod signature;

pub use branch::BranchPolicy;
pub use signature::SignaturePolicy;

/// Which side of a [`ListPolicy`] produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListHit {
    /// Named on the include list.
    Included,
    /// Absent from the exclude list.
    Unlisted,
}

/// An optional include list paired with an optional exclude list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPolicy {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

impl ListPolicy {
    pub fn new(include: Option<Vec<String>>, exclude: Option<Vec<String>>) -> Self {
        Self { include, exclude }
    }

    pub fn check(&self, value: &str) -> Option<ListHit> {
        if let Some(include) = &self.include
            && include.iter().any(|v| v == value)
        {
            return Some(ListHit::Included);
        }
        if let Some(exclude) = &self.exclude
            && !exclude.iter().any(|v| v == value)
        {
            return Some(ListHit::Unlisted);
        }
        None
    }
}
