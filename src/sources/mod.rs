pub mod enumerate;
pub mod types;

pub use enumerate::{KnownMember, MemberLookup, MessageTextSources, TextSourceEnumerator};
pub use types::{
    CustomStatus, Embed, EmbedAuthor, EmbedField, EmbedFooter, Member, Message, SourceFlags,
    SourceKind, User,
};
