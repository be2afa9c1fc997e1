//! Per-user mutual exclusion
//!
//! Every mutation of a user's account unit runs inside that user's scope, so
//! read-modify-write sequences against the store never interleave for the
//! same user. Scopes spanning two users are always acquired in ascending
//! [`UserId`] order.
//!
//! Entries live only while someone holds or waits for them: the last scope
//! to release a user removes its mutex, so the registry is bounded by the
//! number of users with an operation in flight.

use crate::types::UserId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = DashMap<UserId, Arc<Mutex<()>>>;

/// Registry of per-user async mutexes
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Arc<Registry>,
}

/// Held scope for one or two users; released on drop
#[derive(Debug)]
pub struct UserScope {
    guards: Vec<OwnedMutexGuard<()>>,
    users: Vec<UserId>,
    registry: Arc<Registry>,
}

impl Drop for UserScope {
    fn drop(&mut self) {
        self.guards.clear();
        for user_id in &self.users {
            // Handles are cloned under the shard lock, so a count of one
            // means nobody holds or awaits this mutex.
            self.registry
                .remove_if(user_id, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

impl UserLocks {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire a single user's scope
    pub async fn lock(&self, user_id: &UserId) -> UserScope {
        let guard = self.handle(user_id).lock_owned().await;
        UserScope {
            guards: vec![guard],
            users: vec![user_id.clone()],
            registry: self.locks.clone(),
        }
    }

    /// Acquire two users' scopes in a fixed order
    pub async fn lock_pair(&self, a: &UserId, b: &UserId) -> UserScope {
        if a == b {
            return self.lock(a).await;
        }

        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.handle(first).lock_owned().await;
        let second_guard = self.handle(second).lock_owned().await;

        UserScope {
            guards: vec![first_guard, second_guard],
            users: vec![first.clone(), second.clone()],
            registry: self.locks.clone(),
        }
    }

    /// Number of users with a scope held or awaited
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no scope is held or awaited
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
