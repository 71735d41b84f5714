//! Role wiring and the inbound event loop.
//!
//! One process runs exactly one role: the responder drives scripted
//! sessions, the starter hands out test ids. Both consume the same
//! parsed event stream from the Telegram long poll.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::channel::{InboundEvent, OutboundChannel, SendOptions, TelegramChannel};
use crate::config::{BotRole, Config};
use crate::error::ReplyProbeError;
use crate::session::{DelayRange, SessionManager};
use crate::testid::IdentifierIssuer;
use crate::Result;

/// Inbound event queue depth between the poll loop and dispatch.
const EVENT_QUEUE_DEPTH: usize = 64;

/// Run the configured role until ctrl-c.
pub async fn run(config: Config) -> Result<()> {
    let token = config
        .bot
        .token
        .clone()
        .ok_or(ReplyProbeError::MissingConfig("BOT_TOKEN"))?;
    let telegram = Arc::new(TelegramChannel::new(token));

    if !telegram.check_token().await {
        tracing::warn!("getMe check failed; verify the bot token and network");
    }

    let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let listener = {
        let telegram = Arc::clone(&telegram);
        tokio::spawn(async move { telegram.listen(tx).await })
    };

    tracing::info!(role = %config.bot.role, "reply-probe running");

    let result = tokio::select! {
        r = dispatch(rx, &config, telegram.clone()) => r,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    };

    listener.abort();
    result
}

async fn dispatch(
    rx: mpsc::Receiver<InboundEvent>,
    config: &Config,
    channel: Arc<TelegramChannel>,
) -> Result<()> {
    match config.bot.role {
        BotRole::Responder => run_responder(rx, config, channel).await,
        BotRole::Starter => run_starter(rx, config, channel).await,
    }
}

/// Responder loop: every event is handled in its own task so one
/// session's inter-prompt pause never stalls another session or the
/// poll loop.
async fn run_responder(
    mut rx: mpsc::Receiver<InboundEvent>,
    config: &Config,
    channel: Arc<TelegramChannel>,
) -> Result<()> {
    let delay = DelayRange::new(config.script.min_delay_secs, config.script.max_delay_secs)?;
    let manager = Arc::new(SessionManager::new(
        config.script_source(),
        channel,
        delay,
        config.bot.display_name.clone(),
    ));

    while let Some(event) = rx.recv().await {
        match event {
            InboundEvent::Start { user, mut args } => {
                let correlation_id = if args.is_empty() {
                    None
                } else {
                    Some(args.remove(0))
                };
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    if let Err(e) = manager.start_session(user, correlation_id).await {
                        tracing::warn!(user = %user, "start failed: {e}");
                    }
                });
            }
            InboundEvent::Text { user } => {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    if let Err(e) = manager.handle_reply(user).await {
                        tracing::warn!(user = %user, "reply handling failed: {e}");
                    }
                });
            }
            InboundEvent::NewTest { user } | InboundEvent::Unknown { user, .. } => {
                tracing::debug!(user = %user, "ignoring command");
            }
        }
    }

    Err(ReplyProbeError::ChannelClosed)
}

/// Starter loop: answers `/start` with usage and `/newtest` with a
/// freshly issued test id.
async fn run_starter(
    mut rx: mpsc::Receiver<InboundEvent>,
    config: &Config,
    channel: Arc<TelegramChannel>,
) -> Result<()> {
    let issuer = IdentifierIssuer::new();

    while let Some(event) = rx.recv().await {
        match event {
            InboundEvent::Start { user, .. } => {
                let greeting = "👋 Hey! I'm the Reply Test Starter.\n\n\
                                Use /newtest to create a new reply speed test.";
                if let Err(e) = channel
                    .send_text(user, greeting, SendOptions::default())
                    .await
                {
                    tracing::warn!(user = %user, "greeting send failed: {e}");
                }
            }
            InboundEvent::NewTest { user } => {
                let id = issuer.issue()?;
                tracing::info!(user = %user, id, "test id issued");

                let text = new_test_message(&id, &config.starter.peer_bots);
                if let Err(e) = channel
                    .send_text(user, &text, SendOptions::markdown_no_preview())
                    .await
                {
                    tracing::warn!(user = %user, "new-test send failed: {e}");
                }
            }
            InboundEvent::Text { user } | InboundEvent::Unknown { user, .. } => {
                tracing::debug!(user = %user, "ignoring message");
            }
        }
    }

    Err(ReplyProbeError::ChannelClosed)
}

/// Build the message announcing a freshly created test.
fn new_test_message(id: &str, peer_bots: &[String]) -> String {
    let mut lines = vec![
        "🆕 *Reply Speed Test Created!*".to_string(),
        String::new(),
        format!("🧪 *Test ID:* `{}`", id),
        String::new(),
        "Use this ID with the other bots so they all log the same session.".to_string(),
        String::new(),
        "👉 Next steps:".to_string(),
        "1️⃣ Open each bot:".to_string(),
        String::new(),
    ];

    for handle in peer_bots {
        let name = handle.trim_start_matches('@');
        lines.push(format!("• [{}](https://t.me/{})", handle, name));
    }

    lines.push(String::new());
    lines.push(format!("2️⃣ In *each* bot, send: `/start {}`", id));
    lines.push(
        "3️⃣ Then reply as fast as you can. The bots will handle the timing.".to_string(),
    );

    lines.join("\n")
}
