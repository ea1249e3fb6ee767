//! Signature extraction: finding build-override signatures in free text.

use std::sync::LazyLock;

use regex::Regex;

/// Finds build-override signatures in a piece of text.
///
/// Implementations return every non-overlapping signature in order of first
/// appearance, duplicates included.
pub trait SignatureExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

impl<F> SignatureExtractor for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn extract(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Build-override links: `https://[canary.|ptb.]discord[app].com/__development/link?s=<signature>`.
/// The `s` parameter may follow other query parameters.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:(?:canary|ptb)\.)?discord(?:app)?\.com/__development/link/?\?(?:[^\s<>]*?&)?s=([^\s&#<>]+)",
    )
    .expect("build override link pattern must compile")
});

/// Extracts signatures from build-override links.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkExtractor;

impl SignatureExtractor for LinkExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        LINK_PATTERN
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
