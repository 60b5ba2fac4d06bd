//! In-memory registry of live sessions. Nothing is persisted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::SessionContext;

/// Opaque session identifier, always issued by the store.
pub type SessionId = String;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1_000;

struct SessionEntry {
    context: Arc<Mutex<SessionContext>>,
    last_seen: Instant,
}

/// Maps session ids to independent [`SessionContext`]s.
///
/// Each context sits behind its own async mutex; holding it for a whole submission keeps
/// one session strictly sequential while other sessions proceed. A session ends after
/// `idle_timeout` without access, on explicit removal, or when it is the least recently
/// used one and the store is full.
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionEntry>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Returns the live session for `id`, or starts an empty one under a fresh UUID.
    ///
    /// Ids the store did not issue (or that already ended) are never adopted.
    pub fn get_or_create(&self, id: Option<&str>) -> (SessionId, Arc<Mutex<SessionContext>>) {
        let now = Instant::now();
        self.expire_idle(now);

        if let Some(id) = id {
            if let Some(context) = self.touch(id, now) {
                return (id.to_string(), context);
            }
        }

        while self.sessions.len() >= self.max_sessions {
            if !self.evict_least_recent() {
                break;
            }
        }

        let id = Uuid::new_v4().to_string();
        let context = Arc::new(Mutex::new(SessionContext::new()));
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                context: Arc::clone(&context),
                last_seen: now,
            },
        );
        tracing::debug!(target: "unitchat::session", session_id = %id, "Session started");
        (id, context)
    }

    /// Live session for `id`; counts as an access.
    pub fn get(&self, id: &str) -> Option<Arc<Mutex<SessionContext>>> {
        let now = Instant::now();
        self.expire_idle(now);
        self.touch(id, now)
    }

    /// Ends a session, discarding its history and transcript. Returns false if unknown.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::debug!(target: "unitchat::session", session_id = %id, "Session ended");
        }
        removed
    }

    /// Drops every session idle for longer than the timeout as of `now`. Returns how many.
    pub fn expire_idle(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= self.idle_timeout);
        let expired = before.saturating_sub(self.sessions.len());
        if expired > 0 {
            tracing::debug!(target: "unitchat::session", expired, "Idle sessions expired");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn touch(&self, id: &str, now: Instant) -> Option<Arc<Mutex<SessionContext>>> {
        let mut entry = self.sessions.get_mut(id)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.context))
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_seen)
            .map(|entry| entry.key().clone());
        match oldest {
            Some(id) => {
                tracing::debug!(target: "unitchat::session", session_id = %id, "Session evicted");
                self.sessions.remove(&id).is_some()
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_interaction_creates_empty_session() {
        let store = SessionStore::new();
        let (id, session) = store.get_or_create(None);
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(store.len(), 1);

        let ctx = session.lock().await;
        assert!(ctx.state.is_empty());
        assert!(ctx.transcript.is_empty());
    }

    #[tokio::test]
    async fn issued_id_returns_same_session() {
        let store = SessionStore::new();
        let (id, first) = store.get_or_create(None);
        first.lock().await.state.append_exchange("q", "r");

        let (again, second) = store.get_or_create(Some(id.as_str()));
        assert_eq!(again, id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.state.len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        let (_, alice) = store.get_or_create(None);
        let (_, bob) = store.get_or_create(None);

        {
            let mut ctx = alice.lock().await;
            ctx.state.append_exchange("q", "r");
            ctx.transcript.record("q", "r");
        }

        let bob = bob.lock().await;
        assert!(bob.state.is_empty());
        assert!(bob.transcript.is_empty());
    }

    #[test]
    fn client_chosen_ids_are_never_adopted() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(Some("alice"));
        assert_ne!(id, "alice");
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(store.get("alice").is_none());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = SessionStore::with_limits(Duration::from_secs(60), 10);
        let (id, _) = store.get_or_create(None);

        assert_eq!(store.expire_idle(Instant::now() + Duration::from_secs(30)), 0);
        assert!(store.get(&id).is_some());

        assert_eq!(store.expire_idle(Instant::now() + Duration::from_secs(61)), 1);
        assert!(store.get(&id).is_none());
        let (fresh, _) = store.get_or_create(Some(id.as_str()));
        assert_ne!(fresh, id);
    }

    #[test]
    fn store_never_exceeds_capacity() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TIMEOUT, 100);
        for i in 0..10_000 {
            let client_id = format!("client-{i}");
            store.get_or_create(Some(client_id.as_str()));
        }
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn least_recently_used_session_is_evicted_first() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TIMEOUT, 2);
        let (first, _) = store.get_or_create(None);
        std::thread::sleep(Duration::from_millis(5));
        let (second, _) = store.get_or_create(None);
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get(&first).is_some());
        std::thread::sleep(Duration::from_millis(5));

        let (third, _) = store.get_or_create(None);

        assert!(store.get(&first).is_some());
        assert!(store.get(&second).is_none());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn remove_discards_session() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(None);
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }
}
