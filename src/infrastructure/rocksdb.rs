use crate::domain::card::{Card, CardNumber};
use crate::domain::ports::{CardStore, UserStore};
use crate::domain::user::{User, Username};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family for card records, keyed by card number.
pub const CF_CARDS: &str = "cards";
/// Column Family for user records, keyed by username.
pub const CF_USERS: &str = "users";

/// A persistent store backed by RocksDB.
///
/// Cards and users live in separate Column Families. The two-card write of a
/// transfer goes through a `WriteBatch`, so both updates hit the log as one
/// atomic unit. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at `path`, ensuring both column
    /// families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_cards = ColumnFamilyDescriptor::new(CF_CARDS, Options::default());
        let cf_users = ColumnFamilyDescriptor::new(CF_USERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_cards, cf_users])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::storage(std::io::Error::other(format!(
                "column family {name} not found"
            )))
        })
    }
}

#[async_trait]
impl CardStore for RocksDbStore {
    async fn put(&self, card: Card) -> Result<()> {
        let cf = self.cf(CF_CARDS)?;
        let value = serde_json::to_vec(&card)?;
        self.db.put_cf(cf, card.number.as_str(), value)?;
        Ok(())
    }

    async fn put_pair(&self, first: Card, second: Card) -> Result<()> {
        let cf = self.cf(CF_CARDS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(cf, first.number.as_str(), serde_json::to_vec(&first)?);
        batch.put_cf(cf, second.number.as_str(), serde_json::to_vec(&second)?);
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, number: &CardNumber) -> Result<Option<Card>> {
        let cf = self.cf(CF_CARDS)?;
        match self.db.get_cf(cf, number.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, number: &CardNumber) -> Result<()> {
        let cf = self.cf(CF_CARDS)?;
        self.db.delete_cf(cf, number.as_str())?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Card>> {
        let cf = self.cf(CF_CARDS)?;
        let mut cards = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry?;
            cards.push(serde_json::from_slice(&value)?);
        }
        Ok(cards)
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn put(&self, user: User) -> Result<()> {
        let cf = self.cf(CF_USERS)?;
        let value = serde_json::to_vec(&user)?;
        self.db.put_cf(cf, user.username.as_str(), value)?;
        Ok(())
    }

    async fn get(&self, username: &Username) -> Result<Option<User>> {
        let cf = self.cf(CF_USERS)?;
        match self.db.get_cf(cf, username.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, username: &Username) -> Result<()> {
        let cf = self.cf(CF_USERS)?;
        self.db.delete_cf(cf, username.as_str())?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<User>> {
        let cf = self.cf(CF_USERS)?;
        let mut users = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry?;
            users.push(serde_json::from_slice(&value)?);
        }
        Ok(users)
    }
}
