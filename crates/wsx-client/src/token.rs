//! Shared auth token store.

use std::sync::{Arc, RwLock};

/// Process-wide API token, shared by the REST client and the socket
/// transport.
///
/// The transport refuses to open a socket while no token is present;
/// retrying without credentials cannot succeed, so nothing is scheduled
/// either.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(Some(token.into()));
        store
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set(&self, token: Option<String>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_token() {
        let store = TokenStore::new();
        let other = store.clone();
        assert!(!other.is_set());

        store.set(Some("secret".into()));
        assert_eq!(other.get().as_deref(), Some("secret"));

        other.set(None);
        assert!(!store.is_set());
    }
}
