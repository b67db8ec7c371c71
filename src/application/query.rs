use crate::application::policy::AccessPolicy;
use crate::domain::card::{Card, CardStatus, CardView};
use crate::domain::ports::{CardStoreHandle, ClockHandle, UserStoreHandle};
use crate::domain::user::{Identity, Username};
use crate::error::{LedgerError, Result};
use std::str::FromStr;

/// Zero-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub size: usize,
}

impl Page {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.page.saturating_mul(self.size).min(items.len());
        let end = start.saturating_add(self.size).min(items.len());
        &items[start..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(LedgerError::Validation(format!(
                "sort direction must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Number,
    Holder,
    Validity,
    Status,
    Balance,
}

impl FromStr for SortField {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(Self::Number),
            "holder" => Ok(Self::Holder),
            "validity" => Ok(Self::Validity),
            "status" => Ok(Self::Status),
            "balance" => Ok(Self::Balance),
            other => Err(LedgerError::Validation(format!(
                "unknown sort field: {other}"
            ))),
        }
    }
}

/// Optional filter axes for card listings. `None` means "no filter on this
/// axis"; an owner that is present but unknown matches nothing.
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub owner: Option<Username>,
    pub status: Option<CardStatus>,
}

/// Filtered, sorted, paginated read access over the card ledger.
///
/// Strictly read-only; identical arguments return identical results absent an
/// intervening mutation.
pub struct LedgerQuery {
    cards: CardStoreHandle,
    users: UserStoreHandle,
    clock: ClockHandle,
}

impl LedgerQuery {
    pub fn new(cards: CardStoreHandle, users: UserStoreHandle, clock: ClockHandle) -> Self {
        Self { cards, users, clock }
    }

    /// Lists cards across all holders. Administrative.
    pub async fn list_cards(
        &self,
        identity: &Identity,
        filter: &CardFilter,
        page: Page,
        sort: SortField,
        direction: SortDirection,
    ) -> Result<Vec<CardView>> {
        AccessPolicy::require_admin(identity)?;
        self.run(filter, page, sort, direction).await
    }

    /// Lists the acting user's own cards. Self-service.
    pub async fn list_own_cards(
        &self,
        identity: &Identity,
        page: Page,
        sort: SortField,
        direction: SortDirection,
    ) -> Result<Vec<CardView>> {
        let filter = CardFilter {
            owner: Some(identity.username.clone()),
            status: None,
        };
        self.run(&filter, page, sort, direction).await
    }

    async fn run(
        &self,
        filter: &CardFilter,
        page: Page,
        sort: SortField,
        direction: SortDirection,
    ) -> Result<Vec<CardView>> {
        // Resolve the owner filter to a stable id. An unknown owner matches
        // nothing; only an absent filter means "all holders".
        let owner_id = match &filter.owner {
            Some(username) => match self.users.get(username).await? {
                Some(user) => Some(user.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let now = self.clock.now();
        let mut cards: Vec<Card> = self
            .cards
            .all()
            .await?
            .into_iter()
            .filter(|card| owner_id.is_none_or(|id| card.holder_id == id))
            .filter(|card| {
                filter
                    .status
                    .is_none_or(|status| card.status_at(now) == status)
            })
            .collect();

        cards.sort_by(|a, b| {
            let ord = match sort {
                SortField::Number => a.number.cmp(&b.number),
                SortField::Holder => a.holder_username.cmp(&b.holder_username),
                SortField::Validity => a.validity.cmp(&b.validity),
                SortField::Status => a.status_at(now).cmp(&b.status_at(now)),
                SortField::Balance => a.balance().cmp(&b.balance()),
            };
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        Ok(page
            .slice(&cards)
            .iter()
            .map(|card| card.view(now))
            .collect())
    }
}
