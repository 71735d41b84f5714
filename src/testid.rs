//! Test identifier issuance.
//!
//! The starter role hands out short codes so several independently
//! hosted probe bots can be attributed to the same logical test run.
//! Codes are kept in memory with their creation time; nothing is ever
//! deleted, records live for the process lifetime.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use rand::Rng;

use crate::error::ReplyProbeError;
use crate::Result;

/// Characters a test id is drawn from.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of an issued test id.
pub const ID_LENGTH: usize = 6;

/// Issues unique correlation codes and remembers when each was issued.
pub struct IdentifierIssuer {
    issued: Mutex<HashMap<String, SystemTime>>,
}

impl IdentifierIssuer {
    /// Create an issuer with an empty registry.
    pub fn new() -> Self {
        Self {
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh test id.
    ///
    /// Collisions with live records are resolved by regenerating, so no
    /// two records ever share an id.
    pub fn issue(&self) -> Result<String> {
        let mut issued = self
            .issued
            .lock()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;

        loop {
            let id = generate_id();
            if !issued.contains_key(&id) {
                issued.insert(id.clone(), SystemTime::now());
                return Ok(id);
            }
        }
    }

    /// Whether `id` has been issued by this process.
    pub fn contains(&self, id: &str) -> Result<bool> {
        let issued = self
            .issued
            .lock()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;
        Ok(issued.contains_key(id))
    }

    /// When `id` was issued, if it was.
    pub fn issued_at(&self, id: &str) -> Result<Option<SystemTime>> {
        let issued = self
            .issued
            .lock()
            .map_err(|_| ReplyProbeError::LockPoisoned)?;
        Ok(issued.get(id).copied())
    }

    /// Number of ids issued so far.
    pub fn count(&self) -> usize {
        self.issued.lock().map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for IdentifierIssuer {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
