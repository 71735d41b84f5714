//! Session management module.
//!
//! This module is the core of the bot: the per-user session table, the
//! prompt-delivery state machine and the end-of-session statistics.

mod id;
mod manager;
mod store;
mod summary;

pub use id::UserId;
pub use manager::{DelayRange, SessionManager};
pub use store::{Exchange, OutstandingPrompt, Session, SessionStore};
pub use summary::{summarize, ReplySummary};
