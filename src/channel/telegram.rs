//! Telegram Bot API transport.
//!
//! Outbound messages go through `sendMessage`; inbound updates are
//! pulled with a `getUpdates` long poll and parsed into
//! [`InboundEvent`]s.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{InboundEvent, MessageHandle, OutboundChannel, SendOptions};
use crate::error::ReplyProbeError;
use crate::session::UserId;
use crate::Result;

/// Long-poll timeout passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause before retrying after a failed poll.
const POLL_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

/// Telegram channel — sends via the Bot API and long-polls for updates.
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a channel for the given bot token.
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Verify the token against `getMe`.
    pub async fn check_token(&self) -> bool {
        self.client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Long-poll for updates, pushing parsed events into `tx`.
    ///
    /// Returns when the receiving side is dropped. Poll failures are
    /// logged and retried after a short pause.
    pub async fn listen(&self, tx: mpsc::Sender<InboundEvent>) -> Result<()> {
        let mut offset: i64 = 0;

        tracing::info!("telegram channel listening for updates");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"]
            });

            let resp = match self
                .client
                .post(self.api_url("getUpdates"))
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("telegram poll error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            let data: Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("telegram parse error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            let Some(updates) = data.get("result").and_then(Value::as_array) else {
                continue;
            };

            for update in updates {
                if let Some(update_id) = update.get("update_id").and_then(Value::as_i64) {
                    offset = update_id + 1;
                }

                let Some(event) = event_from_update(update) else {
                    continue;
                };

                if tx.send(event).await.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl OutboundChannel for TelegramChannel {
    async fn send_text(
        &self,
        recipient: UserId,
        text: &str,
        opts: SendOptions,
    ) -> Result<MessageHandle> {
        let mut body = serde_json::json!({
            "chat_id": recipient.as_i64(),
            "text": text,
        });
        if opts.markdown {
            body["parse_mode"] = Value::from("Markdown");
        }
        if opts.suppress_link_preview {
            body["disable_web_page_preview"] = Value::from(true);
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        let data: Value = resp.json().await?;
        if data.get("ok").and_then(Value::as_bool) != Some(true) {
            let description = data
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ReplyProbeError::Api(description.to_string()));
        }

        data.get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| ReplyProbeError::Api("sendMessage result missing message_id".into()))
    }
}

/// Parse a single `getUpdates` entry into an event.
///
/// Updates without a text message (stickers, edits, joins) yield `None`.
fn event_from_update(update: &Value) -> Option<InboundEvent> {
    let message = update.get("message")?;
    let text = message.get("text").and_then(Value::as_str)?;
    let user_id = message
        .get("from")
        .and_then(|f| f.get("id"))
        .and_then(Value::as_i64)?;

    Some(InboundEvent::parse(UserId::from_raw(user_id), text))
}
