//! Role-tagged conversation transcript.
//!
//! The transcript is replayed in full to the chat model on every turn, so
//! its order is part of the request. It only grows: messages are appended,
//! never edited or removed, and a user turn is committed together with its
//! reply so a failed call cannot leave an unanswered question behind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Ordered, append-only list of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a conversation: system prompt first, then the greeting.
    pub fn opened(system_prompt: &str, greeting: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::assistant(greeting)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages shown to the user; the leading system prompt is skipped.
    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    /// The request to send for a pending user turn: full history plus the
    /// new message. The transcript itself is not modified.
    pub fn with_pending(&self, user_text: &str) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.extend_from_slice(&self.messages);
        out.push(Message::user(user_text));
        out
    }

    /// Append a user turn and the assistant reply to it as one unit.
    pub fn commit_exchange(&mut self, user_text: impl Into<String>, reply: impl Into<String>) {
        self.messages.push(Message::user(user_text));
        self.messages.push(Message::assistant(reply));
    }

    /// Last assistant message, if any.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opened_transcript_has_system_then_greeting() {
        let t = Transcript::opened("sys", "hi");
        assert_eq!(t.len(), 2);
        assert_eq!(t.messages()[0].role, Role::System);
        assert_eq!(t.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn visible_skips_system_prompt() {
        let mut t = Transcript::opened("sys", "hi");
        t.commit_exchange("q", "a");
        let roles: Vec<Role> = t.visible().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn with_pending_does_not_mutate() {
        let t = Transcript::opened("sys", "hi");
        let req = t.with_pending("question");
        assert_eq!(req.len(), 3);
        assert_eq!(req[2], Message::user("question"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn commit_appends_in_order() {
        let mut t = Transcript::opened("sys", "hi");
        t.commit_exchange("q1", "a1");
        t.commit_exchange("q2", "a2");
        let contents: Vec<&str> = t.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "hi", "q1", "a1", "q2", "a2"]);
        assert_eq!(t.last_reply(), Some("a2"));
    }

    #[test]
    fn roles_serialise_lowercase() {
        let json = serde_json::to_string(&Message::user("x")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"x"}"#);
    }
}
