//! Session storage and the per-user exchange record.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::UserId;
use crate::channel::MessageHandle;
use crate::error::ReplyProbeError;
use crate::Result;

/// A prompt that has been sent and is awaiting the user's reply.
///
/// At most one of these exists per session; a session holding one is
/// exactly a session the manager is waiting on.
#[derive(Debug, Clone)]
pub struct OutstandingPrompt {
    /// The prompt text as sent.
    pub text: String,
    /// When the send completed.
    pub sent_at: Instant,
    /// Provider message handle, kept for correlation.
    pub handle: MessageHandle,
}

impl OutstandingPrompt {
    /// Close this prompt with a reply timestamp.
    pub fn answered(self, replied_at: Instant) -> Exchange {
        Exchange {
            text: self.text,
            sent_at: self.sent_at,
            replied_at,
        }
    }
}

/// One completed prompt/reply exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The prompt text as sent.
    pub text: String,
    /// When the prompt was sent.
    pub sent_at: Instant,
    /// When the reply arrived.
    pub replied_at: Instant,
}

impl Exchange {
    /// Time the user took to reply.
    pub fn latency(&self) -> Duration {
        self.replied_at.saturating_duration_since(self.sent_at)
    }
}

/// Live state of one user's run through the script.
///
/// Every prompt is in exactly one of `pending` (not yet sent),
/// `outstanding` (sent, awaiting reply) or `log` (answered), so
/// `pending.len() + log.len() + outstanding.is_some() as usize`
/// always equals the script length.
#[derive(Debug, Clone)]
pub struct Session {
    /// Owner of this session; key of the session table.
    pub user_id: UserId,
    /// Optional test id supplied at start. Opaque; never validated here.
    pub correlation_id: Option<String>,
    /// Prompts not yet sent, in delivery order.
    pub pending: VecDeque<String>,
    /// The single in-flight prompt, if any.
    pub outstanding: Option<OutstandingPrompt>,
    /// Completed exchanges, append-only.
    pub log: Vec<Exchange>,
    /// Incarnation stamp. A delayed delivery whose stamp no longer
    /// matches the table entry must take no effect.
    pub generation: u64,
    /// Time when the session was created.
    pub created_at: Instant,
}

impl Session {
    fn new(
        user_id: UserId,
        correlation_id: Option<String>,
        prompts: &[String],
        generation: u64,
    ) -> Self {
        Self {
            user_id,
            correlation_id,
            pending: prompts.iter().cloned().collect(),
            outstanding: None,
            log: Vec::new(),
            generation,
            created_at: Instant::now(),
        }
    }
}

/// Thread-safe storage for sessions, keyed by user.
///
/// Critical sections are synchronous and short; callers never hold the
/// lock across an `.await`. Asynchronous steps (delays, outbound sends)
/// happen between mutations, each of which re-validates the session's
/// generation, so a timer belonging to a replaced or destroyed session
/// observes the mismatch and becomes a no-op.
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
    generations: AtomicU64,
}

impl SessionStore {
    /// Create a new empty session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// Create a session for `user_id`, silently replacing any existing
    /// one (a restart discards prior in-flight state and its partial
    /// log). Returns the new session's generation stamp.
    pub fn begin(
        &self,
        user_id: UserId,
        correlation_id: Option<String>,
        prompts: &[String],
    ) -> Result<u64> {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Session::new(user_id, correlation_id, prompts, generation);

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;
        sessions.insert(user_id, session);
        Ok(generation)
    }

    /// Read the session for `user_id` through a closure.
    ///
    /// Returns `None` if no session exists.
    pub fn read<F, R>(&self, user_id: UserId, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;
        Ok(sessions.get(&user_id).map(f))
    }

    /// Mutate the session for `user_id` through a closure.
    ///
    /// Returns `None` if no session exists.
    pub fn update<F, R>(&self, user_id: UserId, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;
        Ok(sessions.get_mut(&user_id).map(f))
    }

    /// Mutate the session only if its generation still matches.
    ///
    /// This is the liveness check a delayed step performs after waking:
    /// a session replaced by a newer start, or already destroyed,
    /// yields `None` and the step takes no effect.
    pub fn update_if_current<F, R>(&self, user_id: UserId, generation: u64, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;
        Ok(sessions
            .get_mut(&user_id)
            .filter(|s| s.generation == generation)
            .map(f))
    }

    /// Remove the session only if its generation still matches.
    ///
    /// Returns the removed session, or `None` if it was already gone
    /// or has been replaced by a newer incarnation.
    pub fn remove_if_current(&self, user_id: UserId, generation: u64) -> Result<Option<Session>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;

        match sessions.get(&user_id) {
            Some(s) if s.generation == generation => Ok(sessions.remove(&user_id)),
            _ => Ok(None),
        }
    }

    /// Check if a session exists for `user_id`.
    pub fn contains(&self, user_id: UserId) -> Result<bool> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;
        Ok(sessions.contains_key(&user_id))
    }

    /// Number of active sessions.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
