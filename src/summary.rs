//! Partial summaries: the "where" half of a rendered match.

use crate::eval::MatchContext;
use crate::sources::SourceKind;

/// Describes where in a message a match occurred.
pub trait PartialSummary {
    fn summarize(&self, source: SourceKind, context: &MatchContext) -> String;
}

impl<F> PartialSummary for F
where
    F: Fn(SourceKind, &MatchContext) -> String,
{
    fn summarize(&self, source: SourceKind, context: &MatchContext) -> String {
        self(source, context)
    }
}

const UNKNOWN: &str = "unknown";

/// Default summaries: channel plus quoted content for message sources,
/// the matched name or status for author sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSummary;

impl DefaultSummary {
    fn channel(context: &MatchContext) -> String {
        match context.channel_id() {
            Some(id) => format!("<#{id}>"),
            None => format!("`#{UNKNOWN}`"),
        }
    }

    fn quoted_content(context: &MatchContext) -> String {
        let content = context
            .message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        // Break up fences so the quote cannot be closed early
        let content = content.replace("```", "`\u{200b}``");
        format!("```\n{content}\n```")
    }
}

impl PartialSummary for DefaultSummary {
    fn summarize(&self, source: SourceKind, context: &MatchContext) -> String {
        match source {
            SourceKind::Message => format!(
                "message in {}:\n{}",
                Self::channel(context),
                Self::quoted_content(context)
            ),
            SourceKind::Embed => format!(
                "message embed in {}:\n{}",
                Self::channel(context),
                Self::quoted_content(context)
            ),
            SourceKind::VisibleName => format!(
                "visible name: {}",
                context.visible_name().as_deref().unwrap_or(UNKNOWN)
            ),
            SourceKind::Username => format!(
                "username: {}",
                context.author_tag().as_deref().unwrap_or(UNKNOWN)
            ),
            SourceKind::Nickname => {
                format!("nickname: {}", context.nickname().unwrap_or(UNKNOWN))
            }
            SourceKind::CustomStatus => format!(
                "custom status: {}",
                context.custom_status().as_deref().unwrap_or(UNKNOWN)
            ),
        }
    }
}
