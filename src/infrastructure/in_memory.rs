use crate::domain::card::{Card, CardNumber};
use crate::domain::ports::{CardStore, UserStore};
use crate::domain::user::{User, Username};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory card store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. The paired write
/// happens under a single write guard, so both cards become visible together.
#[derive(Default, Clone)]
pub struct InMemoryCardStore {
    cards: Arc<RwLock<HashMap<CardNumber, Card>>>,
}

impl InMemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn put(&self, card: Card) -> Result<()> {
        let mut cards = self.cards.write().await;
        cards.insert(card.number.clone(), card);
        Ok(())
    }

    async fn put_pair(&self, first: Card, second: Card) -> Result<()> {
        let mut cards = self.cards.write().await;
        cards.insert(first.number.clone(), first);
        cards.insert(second.number.clone(), second);
        Ok(())
    }

    async fn get(&self, number: &CardNumber) -> Result<Option<Card>> {
        let cards = self.cards.read().await;
        Ok(cards.get(number).cloned())
    }

    async fn delete(&self, number: &CardNumber) -> Result<()> {
        let mut cards = self.cards.write().await;
        cards.remove(number);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Card>> {
        let cards = self.cards.read().await;
        Ok(cards.values().cloned().collect())
    }
}

/// A thread-safe in-memory user store keyed by username.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Username, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn put(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn get(&self, username: &Username) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }

    async fn delete(&self, username: &Username) -> Result<()> {
        let mut users = self.users.write().await;
        users.remove(username);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }
}
