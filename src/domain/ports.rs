use crate::domain::card::{Card, CardNumber};
use crate::domain::user::{User, Username};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Storage port for cards, keyed by the unique card number.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn put(&self, card: Card) -> Result<()>;
    /// Writes both cards as one atomic unit: either both updates become
    /// durable or neither does. The backbone of the transfer protocol.
    async fn put_pair(&self, first: Card, second: Card) -> Result<()>;
    async fn get(&self, number: &CardNumber) -> Result<Option<Card>>;
    async fn delete(&self, number: &CardNumber) -> Result<()>;
    async fn all(&self) -> Result<Vec<Card>>;
}

/// Storage port for users, keyed by the unique username.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn put(&self, user: User) -> Result<()>;
    async fn get(&self, username: &Username) -> Result<Option<User>>;
    async fn delete(&self, username: &Username) -> Result<()>;
    async fn all(&self) -> Result<Vec<User>>;
}

pub type CardStoreHandle = Arc<dyn CardStore>;
pub type UserStoreHandle = Arc<dyn UserStore>;

/// Time source for token issuance and expiry derivation. Injected so tests
/// can issue tokens and read card status at a chosen instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub type ClockHandle = Arc<dyn Clock>;
