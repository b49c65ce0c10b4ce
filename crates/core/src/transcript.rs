//! The append-only chat transcript.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The visitor.
    User,
    /// The model, the greeting or the fallback text.
    Assistant,
}

/// Identifies a message within one transcript.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
pub struct MessageId(u64);

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// One entry of the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    pub(crate) id: MessageId,
    pub(crate) role: Role,
    pub(crate) content: String,
}

impl Message {
    /// Returns the message id.
    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the author.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Error returned when appending a blank user message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyMessageError;

impl Display for EmptyMessageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("user message must not be empty")
    }
}

impl StdError for EmptyMessageError {}

/// Ordered list of messages. Entries are never edited or removed.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user message. Blank content is rejected.
    pub fn push_user(
        &mut self,
        content: impl Into<String>,
    ) -> Result<&Message, EmptyMessageError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(EmptyMessageError);
        }
        Ok(self.push(Role::User, content))
    }

    /// Appends an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Role::Assistant, content.into())
    }

    fn push(&mut self, role: Role, content: String) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: MessageId(self.next_id),
            role,
            content,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Returns every message in send order.
    #[inline]
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the content of the most recent assistant message.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::Assistant)
            .map(Message::content)
    }

    /// Returns the contents of the user messages in order.
    pub fn user_contents(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|msg| msg.role == Role::User)
            .map(Message::content)
    }

    /// Returns the number of messages of both roles.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing has been appended yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
