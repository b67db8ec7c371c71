use cardledger::application::engine::CardEngine;
use cardledger::application::query::LedgerQuery;
use cardledger::domain::card::{Balance, Card, CardNumber, ValidityPeriod};
use cardledger::domain::ports::{CardStore, SystemClock, UserStore};
use cardledger::domain::user::{Identity, Role, User, Username};
use cardledger::infrastructure::in_memory::{InMemoryCardStore, InMemoryUserStore};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Shared wiring for the integration suites: in-memory stores, the engine and
/// the query service over them, and a couple of seeded identities.
pub struct TestLedger {
    pub engine: Arc<CardEngine>,
    pub query: LedgerQuery,
    pub cards: Arc<InMemoryCardStore>,
    pub users: Arc<InMemoryUserStore>,
    pub admin: Identity,
    pub alice: Identity,
    pub bob: Identity,
}

pub async fn ledger() -> TestLedger {
    let cards = Arc::new(InMemoryCardStore::new());
    let users = Arc::new(InMemoryUserStore::new());
    let clock = Arc::new(SystemClock);

    let admin = User::new(Username::new("root").unwrap(), "hash".into(), Role::Admin);
    let alice = User::new(Username::new("alice").unwrap(), "hash".into(), Role::User);
    let bob = User::new(Username::new("bob").unwrap(), "hash".into(), Role::User);
    for user in [&admin, &alice, &bob] {
        users.put(user.clone()).await.unwrap();
    }

    TestLedger {
        engine: Arc::new(CardEngine::new(
            cards.clone(),
            users.clone(),
            clock.clone(),
        )),
        query: LedgerQuery::new(cards.clone(), users.clone(), clock),
        cards,
        users,
        admin: Identity::from(&admin),
        alice: Identity::from(&alice),
        bob: Identity::from(&bob),
    }
}

pub async fn seed_card(
    ledger: &TestLedger,
    number: &str,
    holder: &Identity,
    balance: Decimal,
) -> Card {
    let card = Card::new(
        CardNumber::new(number).unwrap(),
        holder.id,
        holder.username.as_str().to_string(),
        ValidityPeriod::new("12/30").unwrap(),
    )
    .with_balance(Balance::new(balance));
    ledger.cards.put(card.clone()).await.unwrap();
    card
}
