//! # Cart Store
//!
//! One cart per user, created lazily on first access. Each entry carries its
//! own async mutex; holding it serializes every mutation (add, sync, clear,
//! checkout's read-and-clear) for that user without blocking other users.

use shop_core::Cart;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct CartStore {
    carts: RwLock<HashMap<String, Arc<Mutex<Cart>>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
        }
    }

    /// Get the user's cart entry, creating an empty cart on first access.
    /// Callers lock the returned mutex for the duration of a mutation.
    pub async fn entry(&self, user_id: &str) -> Arc<Mutex<Cart>> {
        if let Some(entry) = self.carts.read().await.get(user_id) {
            return entry.clone();
        }

        let mut carts = self.carts.write().await;
        // A racing creator may have won between the read and write lock
        carts
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Cart::new(user_id))))
            .clone()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cart_created_lazily_and_reused() {
        let store = CartStore::new();
        let first = store.entry("u1").await;
        let id = first.lock().await.id.clone();

        let second = store.entry("u1").await;
        assert_eq!(second.lock().await.id, id);
    }

    #[tokio::test]
    async fn test_entries_are_per_user() {
        let store = CartStore::new();
        let a = store.entry("u1").await;
        let b = store.entry("u2").await;
        assert_ne!(a.lock().await.id, b.lock().await.id);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_yields_one_cart() {
        let store = Arc::new(CartStore::new());
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.entry("u1").await.lock().await.id.clone() })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }
}
