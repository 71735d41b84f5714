//! Inbound event parsing.
//!
//! The transport turns every inbound text message into one of a small
//! set of events. Command recognition is deliberately minimal: a
//! leading `/` marks a command, an optional `@BotName` suffix on the
//! command word is stripped, and anything that is not a command is a
//! plain reply.

use crate::session::UserId;

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start [args…]` — begin a session; `args[0]`, if present,
    /// becomes the correlation id.
    Start { user: UserId, args: Vec<String> },
    /// `/newtest` — request a fresh test id (starter role).
    NewTest { user: UserId },
    /// Any non-command text; treated as a reply to the outstanding
    /// prompt, if one exists.
    Text { user: UserId },
    /// A command we don't handle.
    Unknown { user: UserId, command: String },
}

impl InboundEvent {
    /// Classify an inbound message from `user`.
    pub fn parse(user: UserId, text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Self::Text { user };
        }

        let mut tokens = trimmed.split_whitespace();
        let command_word = tokens.next().unwrap_or("/");
        // "/start@SomeBot" arrives in group chats; we only care about
        // the command itself.
        let command = command_word.split('@').next().unwrap_or(command_word);

        match command {
            "/start" => Self::Start {
                user,
                args: tokens.map(str::to_string).collect(),
            },
            "/newtest" => Self::NewTest { user },
            other => Self::Unknown {
                user,
                command: other.to_string(),
            },
        }
    }

    /// The user this event belongs to.
    pub fn user(&self) -> UserId {
        match self {
            Self::Start { user, .. }
            | Self::NewTest { user }
            | Self::Text { user }
            | Self::Unknown { user, .. } => *user,
        }
    }
}
