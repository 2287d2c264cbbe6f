//! Session registry.
//!
//! Process-wide store mapping a workspace id to at most one live session.
//! Sessions survive view unmount; the registry is the sole owner and the only
//! place irreversible teardown happens. Constructed once at application start
//! and injected where needed, never reached for as an ambient global.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::session::Session;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a session. No side effects.
    pub async fn get(&self, workspace_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(workspace_id).cloned()
    }

    /// Return the existing session for `workspace_id`, or build one with
    /// `factory` and store it.
    ///
    /// The check and the insert happen under one write lock around a
    /// synchronous factory, so no interleaving can create two sessions for
    /// the same id.
    pub async fn get_or_create<F>(&self, workspace_id: &str, factory: F) -> Arc<Session>
    where
        F: FnOnce() -> Session,
    {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(workspace_id) {
            return existing.clone();
        }
        let session = Arc::new(factory());
        sessions.insert(workspace_id.to_string(), session.clone());
        info!(workspace_id, "session created");
        session
    }

    /// Close and delete a session. Removing an absent id is a no-op.
    pub async fn remove(&self, workspace_id: &str) {
        let removed = self.sessions.write().await.remove(workspace_id);
        if let Some(session) = removed {
            session.close().await;
            info!(workspace_id, "session removed");
        }
    }

    /// Evict every session older than `max_age`, applying the same disposal
    /// as `remove`. Returns the evicted workspace ids.
    pub async fn sweep(&self, max_age: Duration) -> Vec<String> {
        let expired: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, s)| s.age() > max_age)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id))
                .collect()
        };

        let mut removed = Vec::new();
        for session in expired {
            session.close().await;
            removed.push(session.workspace_id().to_string());
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "sweep evicted sessions");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{session_fixture, settle, FakeConnector};

    #[tokio::test(start_paused = true)]
    async fn get_or_create_returns_the_same_session() {
        let connector = FakeConnector::new();
        let registry = SessionRegistry::new();

        let (session, _probe) = session_fixture("ws-1", &connector);
        let first = registry.get_or_create("ws-1", move || session).await;
        // The factory must not run again for a present id.
        let second = registry
            .get_or_create("ws-1", || panic!("factory invoked for existing session"))
            .await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_ids_get_distinct_sessions() {
        let connector = FakeConnector::new();
        let registry = SessionRegistry::new();

        let (s1, _p1) = session_fixture("ws-1", &connector);
        let (s2, _p2) = session_fixture("ws-2", &connector);
        let a = registry.get_or_create("ws-1", move || s1).await;
        let b = registry.get_or_create("ws-2", move || s2).await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn get_has_no_side_effects() {
        let registry = SessionRegistry::new();
        assert!(registry.get("ws-1").await.is_none());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_disposes_surface_and_closes_transport() {
        let connector = FakeConnector::new();
        let registry = SessionRegistry::new();

        let (session, probe) = session_fixture("ws-1", &connector);
        let session = registry.get_or_create("ws-1", move || session).await;
        session.transport().connect();
        settle().await;
        connector.probe(0).opened().await;
        settle().await;

        registry.remove("ws-1").await;
        settle().await;

        assert!(probe.disposed());
        assert!(connector.probe(0).is_closed());
        assert!(registry.get("ws-1").await.is_none());

        // Removing an absent id is a no-op.
        registry.remove("ws-1").await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_evicts_only_sessions_past_the_age_threshold() {
        let connector = FakeConnector::new();
        let registry = SessionRegistry::new();

        let (old, old_probe) = session_fixture("ws-old", &connector);
        registry.get_or_create("ws-old", move || old).await;

        tokio::time::advance(Duration::from_secs(2 * 60 * 60)).await;

        let (young, young_probe) = session_fixture("ws-young", &connector);
        registry.get_or_create("ws-young", move || young).await;

        let evicted = registry.sweep(Duration::from_secs(60 * 60)).await;
        assert_eq!(evicted, vec!["ws-old".to_string()]);
        assert!(old_probe.disposed());
        assert!(!young_probe.disposed());
        assert!(registry.get("ws-old").await.is_none());
        assert!(registry.get("ws-young").await.is_some());
    }
}
