use crate::application::policy::AccessPolicy;
use crate::domain::card::{Amount, Card, CardNumber, CardView, ValidityPeriod};
use crate::domain::ports::{CardStoreHandle, ClockHandle, UserStoreHandle};
use crate::domain::user::Identity;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The card engine: lifecycle transitions and the two-card atomic transfer.
///
/// Every operation takes an explicit [`Identity`]; authorization runs before
/// any read-modify-write begins. Mutations on a card serialize through a
/// per-card async lock, and a transfer takes both locks in ascending
/// card-number order, so concurrent transfers over disjoint pairs never
/// contend and shared-card transfers cannot deadlock or lose updates.
pub struct CardEngine {
    cards: CardStoreHandle,
    users: UserStoreHandle,
    clock: ClockHandle,
    locks: Mutex<HashMap<CardNumber, Arc<Mutex<()>>>>,
}

impl CardEngine {
    pub fn new(cards: CardStoreHandle, users: UserStoreHandle, clock: ClockHandle) -> Self {
        Self {
            cards,
            users,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, number: &CardNumber) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(number.clone()).or_default().clone()
    }

    async fn fetch(&self, number: &CardNumber) -> Result<Card> {
        self.cards
            .get(number)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("card {number} not found")))
    }

    /// Creates a card for an existing holder. Administrative; the new card is
    /// active with a zero balance.
    pub async fn create_card(
        &self,
        number: &str,
        holder_username: &str,
        validity: &str,
        identity: &Identity,
    ) -> Result<CardView> {
        AccessPolicy::require_admin(identity)?;
        let number = CardNumber::new(number)?;
        let validity = ValidityPeriod::new(validity)?;

        let holder_username = crate::domain::user::Username::new(holder_username)?;
        let holder = self
            .users
            .get(&holder_username)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("user {holder_username} not found")))?;

        let lock = self.lock_for(&number).await;
        let _guard = lock.lock().await;

        if self.cards.get(&number).await?.is_some() {
            return Err(LedgerError::Conflict(format!(
                "card {number} already exists"
            )));
        }

        let card = Card::new(
            number,
            holder.id,
            holder.username.as_str().to_string(),
            validity,
        );
        self.cards.put(card.clone()).await?;
        tracing::info!(card = %card.number, holder = %card.holder_username, "created card");
        Ok(card.view(self.clock.now()))
    }

    /// Blocks a card. Admins may block any card; a holder may block their own.
    pub async fn block_card(&self, number: &str, identity: &Identity) -> Result<CardView> {
        let number = CardNumber::new(number)?;
        let lock = self.lock_for(&number).await;
        let _guard = lock.lock().await;

        let mut card = self.fetch(&number).await?;
        AccessPolicy::require_admin_or_owner(identity, &card)?;

        let now = self.clock.now();
        card.block(now)?;
        self.cards.put(card.clone()).await?;
        tracing::info!(card = %card.number, "blocked card");
        Ok(card.view(now))
    }

    /// Re-activates a blocked card. Administrative.
    pub async fn activate_card(&self, number: &str, identity: &Identity) -> Result<CardView> {
        AccessPolicy::require_admin(identity)?;
        let number = CardNumber::new(number)?;
        let lock = self.lock_for(&number).await;
        let _guard = lock.lock().await;

        let mut card = self.fetch(&number).await?;
        let now = self.clock.now();
        card.activate(now)?;
        self.cards.put(card.clone()).await?;
        tracing::info!(card = %card.number, "activated card");
        Ok(card.view(now))
    }

    /// Deletes a card. Administrative.
    pub async fn delete_card(&self, number: &str, identity: &Identity) -> Result<()> {
        AccessPolicy::require_admin(identity)?;
        let number = CardNumber::new(number)?;
        let lock = self.lock_for(&number).await;
        let _guard = lock.lock().await;

        self.fetch(&number).await?;
        self.cards.delete(&number).await?;
        tracing::info!(card = %number, "deleted card");
        Ok(())
    }

    /// Moves `amount` between two cards held by the acting user.
    ///
    /// Precondition order (first failure wins): resolution, ownership, status,
    /// amount validity, funds. The debit and credit are persisted through one
    /// atomic write; no partial transfer is ever observable.
    pub async fn transfer(
        &self,
        sender_number: &str,
        recipient_number: &str,
        amount: Decimal,
        identity: &Identity,
    ) -> Result<(CardView, CardView)> {
        let sender_number = CardNumber::new(sender_number)?;
        let recipient_number = CardNumber::new(recipient_number)?;
        if sender_number == recipient_number {
            return Err(LedgerError::Validation(
                "sender and recipient must be different cards".to_string(),
            ));
        }

        // Both locks, ascending card-number order.
        let (first, second) = if sender_number < recipient_number {
            (&sender_number, &recipient_number)
        } else {
            (&recipient_number, &sender_number)
        };
        let first_lock = self.lock_for(first).await;
        let second_lock = self.lock_for(second).await;
        let _first_guard = first_lock.lock().await;
        let _second_guard = second_lock.lock().await;

        let mut sender = self.fetch(&sender_number).await?;
        let mut recipient = self.fetch(&recipient_number).await?;

        AccessPolicy::require_owner(identity, &sender)?;
        AccessPolicy::require_owner(identity, &recipient)?;

        let now = self.clock.now();
        if !sender.is_active(now) {
            return Err(LedgerError::InvalidState(format!(
                "sender card {sender_number} is {}",
                sender.status_at(now).as_str()
            )));
        }
        if !recipient.is_active(now) {
            return Err(LedgerError::InvalidState(format!(
                "recipient card {recipient_number} is {}",
                recipient.status_at(now).as_str()
            )));
        }

        let amount = Amount::new(amount)?;
        sender.debit(amount)?;
        recipient.credit(amount);

        self.cards
            .put_pair(sender.clone(), recipient.clone())
            .await?;
        tracing::info!(
            from = %sender.number,
            to = %recipient.number,
            amount = %amount.value(),
            "transfer applied"
        );
        Ok((sender.view(now), recipient.view(now)))
    }

    /// Returns the balance of one of the acting user's own active cards.
    pub async fn get_balance(&self, number: &str, identity: &Identity) -> Result<Decimal> {
        let number = CardNumber::new(number)?;
        let card = self.fetch(&number).await?;
        AccessPolicy::require_owner(identity, &card)?;

        let now = self.clock.now();
        if !card.is_active(now) {
            return Err(LedgerError::InvalidState(format!(
                "card {number} is {}",
                card.status_at(now).as_str()
            )));
        }
        Ok(card.balance().value())
    }
}
