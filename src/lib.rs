//! # reply-probe
//!
//! Scripted reply-latency probe bot for Telegram.
//!
//! The bot walks a user through a fixed sequence of prompts, measures
//! how quickly each prompt is answered, and reports summary statistics
//! at the end. A companion "starter" role issues short test ids so
//! several probe bots can be attributed to one logical test run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use reply_probe::{
//!     DelayRange, ScriptSource, SessionManager, TelegramChannel, UserId,
//! };
//!
//! #[tokio::main]
//! async fn main() -> reply_probe::Result<()> {
//!     reply_probe::logging::try_init().ok();
//!
//!     let channel = Arc::new(TelegramChannel::new("123:ABC".into()));
//!     let manager = SessionManager::new(
//!         ScriptSource::parse("Hey|What's up?|And now?"),
//!         channel,
//!         DelayRange::new(5.0, 10.0)?,
//!         "TestBot",
//!     );
//!
//!     manager.start_session(UserId::from_raw(42), None).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod script;
pub mod session;
pub mod testid;

// Re-export commonly used types
pub use channel::{InboundEvent, MessageHandle, OutboundChannel, SendOptions, TelegramChannel};
pub use config::{BotRole, Config};
pub use error::{ReplyProbeError, Result};
pub use script::ScriptSource;
pub use session::{
    DelayRange, Exchange, ReplySummary, Session, SessionManager, SessionStore, UserId,
};
pub use testid::IdentifierIssuer;
