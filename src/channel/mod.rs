//! Transport boundary.
//!
//! The session core only knows how to hand text to an [`OutboundChannel`]
//! and receive parsed [`InboundEvent`]s; everything provider-specific
//! lives behind this module.

mod event;
mod telegram;

pub use event::InboundEvent;
pub use telegram::TelegramChannel;

use async_trait::async_trait;

use crate::session::UserId;
use crate::Result;

/// Provider-assigned identifier of a delivered message.
///
/// Stored for correlation; the core never interprets it.
pub type MessageHandle = i64;

/// Presentation options for an outbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Render the text as Markdown.
    pub markdown: bool,
    /// Suppress link previews for URLs in the text.
    pub suppress_link_preview: bool,
}

impl SendOptions {
    /// Markdown rendering, previews untouched.
    pub fn markdown() -> Self {
        Self {
            markdown: true,
            suppress_link_preview: false,
        }
    }

    /// Markdown rendering with link previews suppressed.
    pub fn markdown_no_preview() -> Self {
        Self {
            markdown: true,
            suppress_link_preview: true,
        }
    }
}

/// Sink for outbound messages.
///
/// Implemented by the Telegram transport in production and by
/// recording mocks in tests.
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    /// Send `text` to `recipient`, returning the provider's handle for
    /// the delivered message.
    async fn send_text(
        &self,
        recipient: UserId,
        text: &str,
        opts: SendOptions,
    ) -> Result<MessageHandle>;
}
