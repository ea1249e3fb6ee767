//! Lazy enumeration of the text sources a message exposes.
//!
//! Sources are produced in a fixed priority order: message body, embeds,
//! visible name, username, nickname, custom status. Member-backed sources
//! (visible name, nickname, custom status) fetch the author's member record
//! through a [`MemberLookup`] the first time one of them is reached; the
//! lookup never runs if the consumer stops pulling before that point.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use super::types::{Member, Message, SourceFlags, SourceKind};

/// Fetches the guild member record for a message's author.
#[async_trait]
pub trait MemberLookup: Send + Sync {
    async fn member(&self, message: &Message) -> Option<Member>;
}

/// A lookup that always returns a member already in hand.
#[derive(Debug, Clone, Default)]
pub struct KnownMember(pub Option<Member>);

#[async_trait]
impl MemberLookup for KnownMember {
    async fn member(&self, _message: &Message) -> Option<Member> {
        self.0.clone()
    }
}

/// Produces `(kind, text)` pairs for a message, in priority order.
pub trait TextSourceEnumerator: Send + Sync {
    fn sources<'a>(
        &'a self,
        message: &'a Message,
        flags: SourceFlags,
    ) -> BoxStream<'a, (SourceKind, String)>;
}

/// Default enumerator over the [`Message`] model.
#[derive(Default)]
pub struct MessageTextSources {
    lookup: Option<Box<dyn MemberLookup>>,
}

impl MessageTextSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `lookup` to resolve the author's member record.
    /// Without one, member-backed sources fall back to user data or are skipped.
    pub fn with_lookup(lookup: impl MemberLookup + 'static) -> Self {
        Self {
            lookup: Some(Box::new(lookup)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Message,
    Embed(usize),
    VisibleName,
    Username,
    Nickname,
    CustomStatus,
}

fn plan(message: &Message, flags: SourceFlags) -> VecDeque<Step> {
    let mut steps = VecDeque::new();
    if flags.messages {
        steps.push_back(Step::Message);
    }
    if flags.embeds {
        steps.extend((0..message.embeds.len()).map(Step::Embed));
    }
    if flags.visible_names {
        steps.push_back(Step::VisibleName);
    }
    if flags.usernames {
        steps.push_back(Step::Username);
    }
    if flags.nicknames {
        steps.push_back(Step::Nickname);
    }
    if flags.custom_status {
        steps.push_back(Step::CustomStatus);
    }
    steps
}

struct Cursor<'a> {
    message: &'a Message,
    lookup: Option<&'a dyn MemberLookup>,
    steps: VecDeque<Step>,
    /// Outer `None` = not fetched yet.
    member: Option<Option<Member>>,
}

impl<'a> Cursor<'a> {
    async fn member(&mut self) -> Option<&Member> {
        if self.member.is_none() {
            let fetched = match self.lookup {
                Some(lookup) => lookup.member(self.message).await,
                None => None,
            };
            self.member = Some(fetched);
        }
        self.member.as_ref().and_then(Option::as_ref)
    }

    async fn text(&mut self, step: Step) -> Option<(SourceKind, String)> {
        match step {
            Step::Message => {
                let content = &self.message.content;
                (!content.is_empty()).then(|| (SourceKind::Message, content.clone()))
            }
            Step::Embed(index) => {
                let embed = self.message.embeds.get(index)?;
                match serde_json::to_string(embed) {
                    Ok(json) => Some((SourceKind::Embed, json)),
                    Err(e) => {
                        log::warn!("skipping embed {index}: {e}");
                        None
                    }
                }
            }
            Step::VisibleName => {
                let nickname = self.member().await.and_then(|m| m.nickname.clone());
                let name =
                    nickname.unwrap_or_else(|| self.message.author.display_name().to_string());
                Some((SourceKind::VisibleName, name))
            }
            Step::Username => Some((SourceKind::Username, self.message.author.tag())),
            Step::Nickname => {
                let nickname = self.member().await?.nickname.clone()?;
                Some((SourceKind::Nickname, nickname))
            }
            Step::CustomStatus => {
                let status = self.member().await?.custom_status.as_ref()?.render()?;
                Some((SourceKind::CustomStatus, status))
            }
        }
    }
}

impl TextSourceEnumerator for MessageTextSources {
    fn sources<'a>(
        &'a self,
        message: &'a Message,
        flags: SourceFlags,
    ) -> BoxStream<'a, (SourceKind, String)> {
        let cursor = Cursor {
            message,
            lookup: self.lookup.as_deref(),
            steps: plan(message, flags),
            member: None,
        };

        stream::unfold(cursor, |mut cursor| async move {
            loop {
                let step = cursor.steps.pop_front()?;
                if let Some(item) = cursor.text(step).await {
                    return Some((item, cursor));
                }
            }
        })
        .boxed()
    }
}
