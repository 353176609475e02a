//! Type-safe identifiers and correlation tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use uuid::Uuid;

use crate::phase::AgentKind;

/// Last stamp handed out by [`next_stamp`], in epoch milliseconds.
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Returns a strictly increasing millisecond stamp for this process.
///
/// Falls back to `last + 1` when the wall clock has not moved (or moved
/// backwards) since the previous call.
fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Short random hex suffix.
fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Identifier of one agent session (also the tmux session name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random session ID for the given agent kind.
    pub fn new(kind: AgentKind) -> Self {
        Self(format!("gumploop-{}-{}", kind.agent_name(), random_suffix()))
    }

    /// Creates an ID from an existing string (for deserialization/testing).
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single correlation token embedded in, or echoed after, a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request token plus the acknowledgment token the agent must echo back.
///
/// Both tokens share the same stamp and suffix so a detected
/// acknowledgment can always be traced to the request that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Token placed at the start of the outgoing message.
    pub request: CorrelationToken,
    /// Token the agent is told to print at the end of its reply.
    pub ack: CorrelationToken,
}

impl TokenPair {
    /// Generates a fresh token pair.
    pub fn generate() -> Self {
        let stamp = next_stamp();
        let suffix = random_suffix();
        Self {
            request: CorrelationToken(format!("GUMPLOOP-REQ-{}-{}", stamp, suffix)),
            ack: CorrelationToken(format!("GUMPLOOP-DONE-{}-{}", stamp, suffix)),
        }
    }
}
