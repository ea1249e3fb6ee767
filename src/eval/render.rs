use super::{MatchContext, MatchResult};
use crate::summary::PartialSummary;

/// Render a match as a moderation-log sentence.
///
/// `context` is the first context the trigger ran against; `summary` fills in
/// where the match occurred.
pub fn render(result: &MatchResult, context: &MatchContext, summary: &dyn PartialSummary) -> String {
    let matched = match &result.build_override {
        Some(build_override) => {
            let (projects, targets): (Vec<&str>, Vec<String>) = build_override
                .projects()
                .map(|(project, target)| (project, target.to_string()))
                .unzip();
            format!(
                "build override for projects `{}` ({})",
                projects.join(", "),
                targets.join(", ")
            )
        }
        None => format!("build override `{}`", result.signature),
    };

    format!(
        "Matched {matched} in {}",
        summary.summarize(result.source, context)
    )
}
