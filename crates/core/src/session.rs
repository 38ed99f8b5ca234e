use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::venue::VenueId;
use crate::errors::SessionError;

/// Conversation-context key: one bag of fields per user per venue.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub venue: VenueId,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(venue: VenueId, user_id: impl Into<String>) -> Self {
        Self { venue, user_id: user_id.into() }
    }
}

/// Map-like view over the external conversation-context store. Every write
/// refreshes the bag's TTL; reads past the TTL behave as if the bag were
/// deleted. A Redis-backed deployment implements this same trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &SessionKey, field: &str) -> Result<Option<Value>, SessionError>;

    async fn set(
        &self,
        key: &SessionKey,
        field: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    async fn delete(&self, key: &SessionKey, field: &str) -> Result<(), SessionError>;

    async fn clear(&self, key: &SessionKey) -> Result<(), SessionError>;
}

struct FieldBag {
    fields: HashMap<String, Value>,
    expires_at: Instant,
}

/// In-process session store with lazy expiry. Used by tests and the CLI;
/// production deployments swap in an external store behind the trait.
#[derive(Default)]
pub struct InMemorySessionStore {
    bags: Mutex<HashMap<SessionKey, FieldBag>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionKey, FieldBag>>, SessionError>
    {
        self.bags.lock().map_err(|_| SessionError::Backend("session lock poisoned".to_owned()))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &SessionKey, field: &str) -> Result<Option<Value>, SessionError> {
        let mut bags = self.lock()?;
        match bags.get(key) {
            Some(bag) if bag.expires_at > Instant::now() => Ok(bag.fields.get(field).cloned()),
            Some(_) => {
                bags.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &SessionKey,
        field: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let mut bags = self.lock()?;
        let now = Instant::now();
        let bag = bags.entry(key.clone()).or_insert_with(|| FieldBag {
            fields: HashMap::new(),
            expires_at: now + ttl,
        });
        if bag.expires_at <= now {
            bag.fields.clear();
        }
        bag.fields.insert(field.to_owned(), value);
        bag.expires_at = now + ttl;
        Ok(())
    }

    async fn delete(&self, key: &SessionKey, field: &str) -> Result<(), SessionError> {
        let mut bags = self.lock()?;
        if let Some(bag) = bags.get_mut(key) {
            bag.fields.remove(field);
            if bag.fields.is_empty() {
                bags.remove(key);
            }
        }
        Ok(())
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), SessionError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::{InMemorySessionStore, SessionKey, SessionStore};
    use crate::domain::venue::VenueId;

    fn key() -> SessionKey {
        SessionKey::new(VenueId(702), "user-1")
    }

    #[tokio::test]
    async fn set_then_get_round_trips_within_ttl() {
        let store = InMemorySessionStore::new();
        store
            .set(&key(), "current_intention", json!("find_car"), Duration::from_secs(60))
            .await
            .unwrap();

        let value = store.get(&key(), "current_intention").await.unwrap();
        assert_eq!(value, Some(json!("find_car")));
    }

    #[tokio::test]
    async fn expired_bags_read_as_absent() {
        let store = InMemorySessionStore::new();
        store.set(&key(), "current_intention", json!("find_car"), Duration::ZERO).await.unwrap();

        let value = store.get(&key(), "current_intention").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn delete_removes_a_single_field() {
        let store = InMemorySessionStore::new();
        store.set(&key(), "current_intention", json!("find_car"), Duration::from_secs(60)).await.unwrap();
        store.set(&key(), "last_plate", json!("辽A66D6J"), Duration::from_secs(60)).await.unwrap();

        store.delete(&key(), "current_intention").await.unwrap();

        assert_eq!(store.get(&key(), "current_intention").await.unwrap(), None);
        assert_eq!(store.get(&key(), "last_plate").await.unwrap(), Some(json!("辽A66D6J")));
    }

    #[tokio::test]
    async fn clear_drops_the_whole_bag() {
        let store = InMemorySessionStore::new();
        store.set(&key(), "a", json!(1), Duration::from_secs(60)).await.unwrap();
        store.set(&key(), "b", json!(2), Duration::from_secs(60)).await.unwrap();

        store.clear(&key()).await.unwrap();

        assert_eq!(store.get(&key(), "a").await.unwrap(), None);
        assert_eq!(store.get(&key(), "b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_are_scoped_per_venue_and_user() {
        let store = InMemorySessionStore::new();
        let other = SessionKey::new(VenueId(801), "user-1");
        store.set(&key(), "field", json!("a"), Duration::from_secs(60)).await.unwrap();
        store.set(&other, "field", json!("b"), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get(&key(), "field").await.unwrap(), Some(json!("a")));
        assert_eq!(store.get(&other, "field").await.unwrap(), Some(json!("b")));
    }
}
