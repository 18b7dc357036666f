//! Concurrent in-memory session store.
//!
//! The only mutable state shared between the dispatcher and the expiry
//! sweeper. Backed by a `DashMap`, so operations on different identities
//! never contend on the same lock, while every operation on one identity is
//! atomic with respect to the others. Callers never see the raw map.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use surveybot_types::error::SessionError;
use surveybot_types::identity::ParticipantId;
use surveybot_types::session::Session;

use crate::machine::{Next, Step};

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<ParticipantId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the session for `identity`.
    pub fn get(&self, identity: ParticipantId) -> Result<Session, SessionError> {
        self.sessions
            .get(&identity)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::NotFound)
    }

    /// Create a fresh session, replacing any existing one.
    pub fn create(&self, identity: ParticipantId, now: Instant) -> Session {
        let session = Session::new(identity, now);
        self.sessions.insert(identity, session.clone());
        session
    }

    /// Mutate the session in place under its entry lock.
    pub fn update<F, R>(&self, identity: ParticipantId, mutator: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut entry = self
            .sessions
            .get_mut(&identity)
            .ok_or(SessionError::NotFound)?;
        Ok(mutator(entry.value_mut()))
    }

    pub fn delete(&self, identity: ParticipantId) -> Option<Session> {
        self.sessions.remove(&identity).map(|(_, session)| session)
    }

    pub fn list_expired(&self, now: Instant, ttl: Duration) -> Vec<ParticipantId> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now, ttl))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Remove and return every expired session.
    ///
    /// Each removal happens under its shard's write lock, so a session is
    /// either evicted here or seen by a concurrent `apply`, never both.
    pub fn evict_expired(&self, now: Instant, ttl: Duration) -> Vec<Session> {
        let mut evicted = Vec::new();
        self.sessions.retain(|_, session| {
            if session.is_expired(now, ttl) {
                evicted.push(session.clone());
                false
            } else {
                true
            }
        });
        evicted
    }

    /// Run a pure step function against the entry for `identity` and commit
    /// its result while still holding the entry lock.
    ///
    /// `step` must not block: it runs with the shard locked.
    pub fn apply<F>(&self, identity: ParticipantId, step: F) -> Step
    where
        F: FnOnce(Option<&Session>) -> Step,
    {
        match self.sessions.entry(identity) {
            Entry::Occupied(mut occupied) => {
                let result = step(Some(occupied.get()));
                match &result.next {
                    Next::Replace(session) => {
                        occupied.insert(session.clone());
                    }
                    Next::Keep => {}
                    Next::Remove => {
                        occupied.remove();
                    }
                }
                result
            }
            Entry::Vacant(vacant) => {
                let result = step(None);
                if let Next::Replace(session) = &result.next {
                    vacant.insert(session.clone());
                }
                result
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use surveybot_types::session::Stage;

    use super::*;
    use crate::machine::Effect;

    const TTL: Duration = Duration::from_secs(180);

    fn keep() -> Step {
        Step {
            next: Next::Keep,
            effects: Vec::new(),
            rejected: None,
        }
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = SessionStore::new();
        assert_eq!(store.get(ParticipantId(1)), Err(SessionError::NotFound));
        assert!(store.update(ParticipantId(1), |_| ()).is_err());
    }

    #[test]
    fn create_replaces_existing_session() {
        let store = SessionStore::new();
        let t0 = Instant::now();
        store.create(ParticipantId(1), t0);
        store
            .update(ParticipantId(1), |s| s.age = Some(50))
            .unwrap();

        let later = t0 + Duration::from_secs(30);
        let fresh = store.create(ParticipantId(1), later);
        assert!(fresh.age.is_none());
        assert_eq!(store.get(ParticipantId(1)).unwrap().started_at, later);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_returns_removed_session() {
        let store = SessionStore::new();
        store.create(ParticipantId(1), Instant::now());
        assert!(store.delete(ParticipantId(1)).is_some());
        assert!(store.delete(ParticipantId(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn expired_listing_and_eviction_share_threshold() {
        let store = SessionStore::new();
        let t0 = Instant::now();
        store.create(ParticipantId(1), t0);
        store.create(ParticipantId(2), t0 + Duration::from_secs(60));

        let now = t0 + TTL + Duration::from_secs(1);
        assert_eq!(store.list_expired(now, TTL), vec![ParticipantId(1)]);

        let evicted = store.evict_expired(now, TTL);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].identity, ParticipantId(1));
        assert!(store.get(ParticipantId(2)).is_ok());
        assert!(store.evict_expired(now, TTL).is_empty());
    }

    #[test]
    fn apply_commits_replace_keep_and_remove() {
        let store = SessionStore::new();
        let id = ParticipantId(9);
        let t0 = Instant::now();

        let step = store.apply(id, |current| {
            assert!(current.is_none());
            Step {
                next: Next::Replace(Session::new(id, t0)),
                effects: vec![Effect::NotifyExpired],
                rejected: None,
            }
        });
        assert_eq!(step.effects.len(), 1);
        assert_eq!(store.get(id).unwrap().stage, Stage::AwaitingAge);

        store.apply(id, |current| {
            assert!(current.is_some());
            keep()
        });
        assert!(store.get(id).is_ok());

        store.apply(id, |_| Step {
            next: Next::Remove,
            ..keep()
        });
        assert!(store.get(id).is_err());
    }

    #[test]
    fn apply_remove_on_vacant_is_noop() {
        let store = SessionStore::new();
        store.apply(ParticipantId(3), |_| Step {
            next: Next::Remove,
            ..keep()
        });
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_updates_to_one_identity_are_not_lost() {
        let store = Arc::new(SessionStore::new());
        let id = ParticipantId(5);
        store.create(id, Instant::now());
        store.update(id, |s| s.age = Some(0)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        store
                            .update(id, |s| s.age = s.age.map(|a| a + 1))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get(id).unwrap().age, Some(4000));
    }
}
