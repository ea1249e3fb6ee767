use serde::{Deserialize, Serialize};

use crate::sources::{Member, Message};

/// What the trigger was evaluated against, kept for rendering a match later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchContext {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub member: Option<Member>,
}

impl MatchContext {
    pub fn new(message: Option<Message>, member: Option<Member>) -> Self {
        Self { message, member }
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.channel_id.as_str())
    }

    /// Author tag, if the message is known.
    pub fn author_tag(&self) -> Option<String> {
        self.message.as_ref().map(|m| m.author.tag())
    }

    /// Nickname if set, otherwise the author's display name.
    pub fn visible_name(&self) -> Option<String> {
        if let Some(nickname) = self.member.as_ref().and_then(|m| m.nickname.clone()) {
            return Some(nickname);
        }
        self.message
            .as_ref()
            .map(|m| m.author.display_name().to_string())
    }

    pub fn nickname(&self) -> Option<&str> {
        self.member.as_ref()?.nickname.as_deref()
    }

    pub fn custom_status(&self) -> Option<String> {
        self.member.as_ref()?.custom_status.as_ref()?.render()
    }
}
