//! The per-user session state machine.
//!
//! A session walks one user through the configured script: each prompt
//! is sent, the reply latency is measured, and the next prompt follows
//! after a randomized pause. When the script runs out the session is
//! summarized and destroyed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use super::store::{OutstandingPrompt, SessionStore};
use super::summary::{summarize, ReplySummary};
use super::UserId;
use crate::channel::{OutboundChannel, SendOptions};
use crate::error::ReplyProbeError;
use crate::script::ScriptSource;
use crate::Result;

/// Closed interval the inter-prompt pause is drawn from, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min_secs: f64,
    max_secs: f64,
}

impl DelayRange {
    /// Create a range, rejecting inverted or negative bounds.
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self> {
        if min_secs < 0.0 || max_secs < 0.0 || min_secs > max_secs {
            return Err(ReplyProbeError::InvalidDelayRange {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self { min_secs, max_secs })
    }

    /// The zero range; every draw is exactly zero.
    pub fn none() -> Self {
        Self {
            min_secs: 0.0,
            max_secs: 0.0,
        }
    }

    /// Lower bound in seconds.
    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    /// Upper bound in seconds.
    pub fn max_secs(&self) -> f64 {
        self.max_secs
    }

    /// Draw one delay, uniform over the closed interval.
    pub fn sample(&self) -> Duration {
        if self.max_secs <= 0.0 {
            return Duration::ZERO;
        }
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }
}

enum DeliveryStep {
    Send(String),
    Finish,
}

/// Orchestrates all sessions against one outbound channel.
pub struct SessionManager {
    store: SessionStore,
    script: ScriptSource,
    channel: Arc<dyn OutboundChannel>,
    delay: DelayRange,
    bot_name: String,
}

impl SessionManager {
    /// Create a manager for the given script and channel.
    pub fn new(
        script: ScriptSource,
        channel: Arc<dyn OutboundChannel>,
        delay: DelayRange,
        bot_name: impl Into<String>,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            script,
            channel,
            delay,
            bot_name: bot_name.into(),
        }
    }

    /// The underlying session table.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Begin a session for `user`, replacing any existing one.
    ///
    /// Sends the intro message, then delivers the first prompt with no
    /// delay. An empty correlation id is treated as absent.
    pub async fn start_session(&self, user: UserId, correlation_id: Option<String>) -> Result<()> {
        let correlation_id = correlation_id.filter(|id| !id.is_empty());
        let generation = self
            .store
            .begin(user, correlation_id.clone(), self.script.prompts())?;
        tracing::info!(user = %user, generation, "session started");

        let intro = self.intro_text(correlation_id.as_deref());
        if let Err(e) = self
            .channel
            .send_text(user, &intro, SendOptions::markdown())
            .await
        {
            tracing::warn!(user = %user, "intro send failed: {e}");
        }

        self.deliver_next(user, generation, true).await
    }

    /// Process a reply from `user`.
    ///
    /// Only the first reply after each prompt counts: with no session,
    /// or nothing outstanding, this is a silent no-op. Otherwise the
    /// exchange is logged and the next delivery is triggered.
    pub async fn handle_reply(&self, user: UserId) -> Result<()> {
        let replied_at = Instant::now();

        let generation = self.store.update(user, |session| {
            let prompt = session.outstanding.take()?;
            session.log.push(prompt.answered(replied_at));
            Some(session.generation)
        })?;

        match generation.flatten() {
            Some(generation) => self.deliver_next(user, generation, false).await,
            None => Ok(()),
        }
    }

    /// Deliver the next pending prompt, or finish the session when the
    /// script is exhausted.
    ///
    /// Non-first deliveries pause for a random duration first; the
    /// pause belongs to this session alone. After any suspension the
    /// session's generation is re-checked, so a delivery belonging to a
    /// replaced or destroyed session takes no effect.
    async fn deliver_next(&self, user: UserId, generation: u64, first: bool) -> Result<()> {
        if !first {
            let delay = self.delay.sample();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let step = self
            .store
            .update_if_current(user, generation, |session| {
                match session.pending.pop_front() {
                    Some(text) => DeliveryStep::Send(text),
                    None => DeliveryStep::Finish,
                }
            })?;

        let Some(step) = step else {
            tracing::debug!(user = %user, generation, "stale delivery dropped");
            return Ok(());
        };

        match step {
            DeliveryStep::Finish => self.finish_session(user, generation).await,
            DeliveryStep::Send(text) => self.send_prompt(user, generation, text).await,
        }
    }

    async fn send_prompt(&self, user: UserId, generation: u64, text: String) -> Result<()> {
        match self
            .channel
            .send_text(user, &text, SendOptions::default())
            .await
        {
            Ok(handle) => {
                let sent_at = Instant::now();
                self.store.update_if_current(user, generation, |session| {
                    session.outstanding = Some(OutstandingPrompt {
                        text,
                        sent_at,
                        handle,
                    });
                })?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user = %user, "prompt send failed: {e}");
                // No retry; put the prompt back so the session's ledger
                // stays consistent. Other sessions are unaffected.
                self.store.update_if_current(user, generation, |session| {
                    session.pending.push_front(text);
                })?;
                Ok(())
            }
        }
    }

    /// Destroy the session and report its results.
    async fn finish_session(&self, user: UserId, generation: u64) -> Result<()> {
        let Some(session) = self.store.remove_if_current(user, generation)? else {
            return Ok(());
        };

        tracing::info!(user = %user, answered = session.log.len(), "session finished");

        let (text, opts) = if session.log.is_empty() {
            (
                "No replies received 🤔 – I've got nothing to grade.".to_string(),
                SendOptions::default(),
            )
        } else {
            let summary = summarize(&session.log);
            (
                self.summary_text(&summary, session.correlation_id.as_deref()),
                SendOptions::markdown(),
            )
        };

        if let Err(e) = self.channel.send_text(user, &text, opts).await {
            tracing::warn!(user = %user, "summary send failed: {e}");
        }
        Ok(())
    }

    fn intro_text(&self, correlation_id: Option<&str>) -> String {
        match correlation_id {
            Some(id) => format!(
                "🔥 Hey! I'm {}.\nThis session is linked to *Test ID* `{}`.\n\n\
                 I'll send you a series of messages – reply as fast as you can.",
                self.bot_name, id
            ),
            None => format!(
                "🔥 Hey! I'm {}.\n\
                 I'll send you a series of messages – reply as fast as you can.",
                self.bot_name
            ),
        }
    }

    fn summary_text(&self, summary: &ReplySummary, correlation_id: Option<&str>) -> String {
        let mut lines = vec![
            format!("📊 *{} Reply Test Finished*", self.bot_name),
            String::new(),
            format!("Questions answered: *{}*", summary.answered),
            format!("Average response time: *{:.1} sec*", summary.average_secs),
            format!("Slowest response: *{:.1} sec*", summary.slowest_secs),
        ];
        if let Some(id) = correlation_id {
            lines.push(format!("Linked *Test ID:* `{}`", id));
        }
        lines.join("\n")
    }
}
