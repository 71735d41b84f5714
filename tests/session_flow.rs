//! Session flow integration tests.
//!
//! These drive the session manager end-to-end through the public crate
//! surface, with a recording channel standing in for Telegram.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reply_probe::{
    DelayRange, MessageHandle, OutboundChannel, ReplyProbeError, Result, ScriptSource,
    SendOptions, SessionManager, UserId,
};

/// Outbound channel that records every send.
///
/// Can be switched into a failing mode to exercise send-error paths.
struct RecordingChannel {
    sent: Mutex<Vec<(UserId, String, SendOptions)>>,
    next_handle: AtomicI64,
    failing: AtomicBool,
}

impl RecordingChannel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            next_handle: AtomicI64::new(1),
            failing: AtomicBool::new(false),
        })
    }

    fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text, _)| text.clone())
            .collect()
    }

    fn texts_for(&self, user: UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(recipient, _, _)| *recipient == user)
            .map(|(_, text, _)| text.clone())
            .collect()
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl OutboundChannel for RecordingChannel {
    async fn send_text(
        &self,
        recipient: UserId,
        text: &str,
        opts: SendOptions,
    ) -> Result<MessageHandle> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReplyProbeError::Api("simulated outage".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient, text.to_string(), opts));
        Ok(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }
}

fn manager(script: &str, channel: Arc<RecordingChannel>) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        ScriptSource::parse(script),
        channel,
        DelayRange::none(),
        "TestBot",
    ))
}

// ============================================================================
// Full Session Flows
// ============================================================================

#[tokio::test]
async fn test_three_prompt_script_runs_to_summary() {
    let channel = RecordingChannel::new();
    let mgr = manager("A|B|C", channel.clone());
    let user = UserId::from_raw(1);

    mgr.start_session(user, None).await.unwrap();
    for _ in 0..3 {
        mgr.handle_reply(user).await.unwrap();
    }

    let texts = channel.texts();
    assert_eq!(texts.len(), 5); // intro, A, B, C, summary
    assert_eq!(&texts[1..4], &["A", "B", "C"]);
    assert!(texts[4].contains("Questions answered: *3*"));
    assert!(texts[4].contains("Average response time"));
    assert!(texts[4].contains("Slowest response"));

    // Session is gone; further replies change nothing.
    assert_eq!(mgr.store().count(), 0);
    mgr.handle_reply(user).await.unwrap();
    assert_eq!(channel.texts().len(), 5);
}

#[tokio::test]
async fn test_summary_links_correlation_id() {
    let channel = RecordingChannel::new();
    let mgr = manager("A", channel.clone());
    let user = UserId::from_raw(1);

    mgr.start_session(user, Some("XK29QA".into())).await.unwrap();
    mgr.handle_reply(user).await.unwrap();

    let texts = channel.texts();
    assert!(texts[0].contains("XK29QA"));
    assert!(texts.last().unwrap().contains("XK29QA"));
}

#[tokio::test]
async fn test_concurrent_users_progress_independently() {
    let channel = RecordingChannel::new();
    let mgr = manager("A|B", channel.clone());

    let users: Vec<UserId> = (1..=10).map(UserId::from_raw).collect();
    for &user in &users {
        mgr.start_session(user, None).await.unwrap();
    }
    assert_eq!(mgr.store().count(), 10);

    // Only half the users finish.
    for &user in &users[..5] {
        mgr.handle_reply(user).await.unwrap();
        mgr.handle_reply(user).await.unwrap();
    }

    assert_eq!(mgr.store().count(), 5);
    for &user in &users[..5] {
        let texts = channel.texts_for(user);
        assert!(texts.last().unwrap().contains("Questions answered: *2*"));
    }
    for &user in &users[5..] {
        let texts = channel.texts_for(user);
        assert_eq!(texts.len(), 2); // intro + first prompt only
        assert_eq!(texts[1], "A");
    }
}

#[tokio::test]
async fn test_restart_resets_progress() {
    let channel = RecordingChannel::new();
    let mgr = manager("A|B|C", channel.clone());
    let user = UserId::from_raw(1);

    mgr.start_session(user, None).await.unwrap();
    mgr.handle_reply(user).await.unwrap();
    mgr.handle_reply(user).await.unwrap();

    // Restart mid-script; the finish must reflect only the new run.
    mgr.start_session(user, None).await.unwrap();
    for _ in 0..3 {
        mgr.handle_reply(user).await.unwrap();
    }

    let texts = channel.texts();
    assert!(texts.last().unwrap().contains("Questions answered: *3*"));
    assert_eq!(mgr.store().count(), 0);
}

// ============================================================================
// Timing
// ============================================================================

#[tokio::test]
async fn test_zero_delay_run_is_immediate() {
    let channel = RecordingChannel::new();
    let mgr = manager("A|B|C|D|E", channel.clone());
    let user = UserId::from_raw(1);

    let started = std::time::Instant::now();
    mgr.start_session(user, None).await.unwrap();
    for _ in 0..5 {
        mgr.handle_reply(user).await.unwrap();
    }

    // No observable suspension anywhere in the run.
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(channel
        .texts()
        .last()
        .unwrap()
        .contains("Questions answered: *5*"));
}

#[tokio::test]
async fn test_delayed_delivery_does_not_block_other_sessions() {
    let channel = RecordingChannel::new();
    let mgr = Arc::new(SessionManager::new(
        ScriptSource::parse("A|B"),
        channel.clone(),
        DelayRange::new(0.2, 0.2).unwrap(),
        "TestBot",
    ));
    let slow = UserId::from_raw(1);
    let fast = UserId::from_raw(2);

    mgr.start_session(slow, None).await.unwrap();

    // The slow user's reply starts a 200ms pause before prompt B.
    let pending = {
        let mgr = Arc::clone(&mgr);
        tokio::spawn(async move { mgr.handle_reply(slow).await })
    };

    // Meanwhile the fast user's start is served immediately.
    let started = std::time::Instant::now();
    mgr.start_session(fast, None).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(channel.texts_for(fast).len(), 2);

    pending.await.unwrap().unwrap();
    assert_eq!(channel.texts_for(slow).last().unwrap(), "B");
}

// ============================================================================
// Failure Isolation
// ============================================================================

#[tokio::test]
async fn test_send_failure_does_not_affect_other_sessions() {
    let channel = RecordingChannel::new();
    let mgr = manager("A|B", channel.clone());
    let unlucky = UserId::from_raw(1);
    let fine = UserId::from_raw(2);

    channel.set_failing(true);
    mgr.start_session(unlucky, None).await.unwrap();
    channel.set_failing(false);

    // The unlucky session exists but its first prompt never went out.
    assert!(mgr.store().contains(unlucky).unwrap());
    assert!(channel.texts_for(unlucky).is_empty());

    // Everyone else is unaffected.
    mgr.start_session(fine, None).await.unwrap();
    mgr.handle_reply(fine).await.unwrap();
    mgr.handle_reply(fine).await.unwrap();
    assert!(channel
        .texts_for(fine)
        .last()
        .unwrap()
        .contains("Questions answered: *2*"));
}

#[tokio::test]
async fn test_stray_reply_sends_nothing() {
    let channel = RecordingChannel::new();
    let mgr = manager("A", channel.clone());

    mgr.handle_reply(UserId::from_raw(99)).await.unwrap();

    assert!(channel.texts().is_empty());
    assert_eq!(mgr.store().count(), 0);
}
