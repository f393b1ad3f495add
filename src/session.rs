//! Session-scoped attribute storage
//!
//! Attributes live for one conversational session. Handlers read and write
//! them through [`SessionAttributes`]; the runtime persists them between
//! requests through a [`SessionStore`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// A single session attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Text(String),
    /// Anything else the platform echoes back; kept as-is
    Json(Value),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Key-value bag scoped to one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionAttributes {
    values: BTreeMap<String, AttributeValue>,
}

impl SessionAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    /// String value for `key`, `None` if absent or not a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[allow(dead_code)] // API completeness
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Persistence for session attributes, keyed by session id
///
/// Read-modify-write per session; callers guarantee at most one in-flight
/// request per session.
pub trait SessionStore: Send + Sync {
    /// Attributes stored for the session, if any
    fn get(&self, session_id: &str) -> Option<SessionAttributes>;

    /// Replace the attributes stored for the session
    fn set(&self, session_id: &str, attributes: SessionAttributes);

    /// Drop everything stored for the session
    fn remove(&self, session_id: &str);
}

/// How long an untouched session is kept by default
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
struct StoredSession {
    attributes: SessionAttributes,
    last_seen: Instant,
}

/// Process-local session store
///
/// The platform does not always report a session ending (for example after
/// handing off to audio playback), so entries idle for longer than the TTL
/// are dropped on the next write and never returned by reads.
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, StoredSession>>,
    idle_ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_SESSION_IDLE_TTL)
    }
}

impl InMemorySessionStore {
    #[allow(dead_code)] // Used by tests
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Number of sessions currently held, expired ones included
    #[allow(dead_code)] // Used by tests
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn is_expired(&self, session: &StoredSession, now: Instant) -> bool {
        now.saturating_duration_since(session.last_seen) >= self.idle_ttl
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &str) -> Option<SessionAttributes> {
        let now = Instant::now();
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .filter(|session| !self.is_expired(session, now))
            .map(|session| session.attributes.clone())
    }

    fn set(&self, session_id: &str, attributes: SessionAttributes) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }

        sessions.insert(
            session_id.to_string(),
            StoredSession {
                attributes,
                last_seen: now,
            },
        );
    }

    fn remove(&self, session_id: &str) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
    }
}
