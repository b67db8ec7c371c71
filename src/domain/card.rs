use crate::domain::user::UserId;
use crate::error::LedgerError;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use uuid::Uuid;

/// A validated card number in the canonical `dddd dddd dddd dddd` format.
///
/// The full number is the storage key and must be unique system-wide. At any
/// outward boundary only the masked form is shown. Ordering is lexicographic
/// over the canonical string, which doubles as the global lock order for
/// two-card operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(String);

impl CardNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, LedgerError> {
        let value = value.into();
        let trimmed = value.trim();
        if !Self::well_formed(trimmed) {
            return Err(LedgerError::Validation(format!(
                "card number must match 'dddd dddd dddd dddd', got '{trimmed}'"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    fn well_formed(s: &str) -> bool {
        let groups: Vec<&str> = s.split(' ').collect();
        groups.len() == 4
            && groups
                .iter()
                .all(|g| g.len() == 4 && g.chars().all(|c| c.is_ascii_digit()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked display form: `**** **** **** dddd`.
    pub fn masked(&self) -> String {
        format!("**** **** **** {}", &self.0[15..])
    }
}

impl TryFrom<String> for CardNumber {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CardNumber> for String {
    fn from(number: CardNumber) -> Self {
        number.0
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// A card validity period in `MM/YY` form, month 01-12.
///
/// A card is valid through the last day of its month; expiry is derived at
/// read time rather than written back by a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValidityPeriod {
    // Field order matters: derived ordering is chronological.
    year: i32,
    month: u32,
}

impl ValidityPeriod {
    pub fn new(value: &str) -> Result<Self, LedgerError> {
        let value = value.trim();
        let invalid = || {
            LedgerError::Validation(format!(
                "validity period must match 'MM/YY' with month 01-12, got '{value}'"
            ))
        };
        let (month, year) = value.split_once('/').ok_or_else(invalid)?;
        if month.len() != 2 || year.len() != 2 {
            return Err(invalid());
        }
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self {
            year: 2000 + year,
            month,
        })
    }

    /// Whether the period has elapsed at `now` (UTC month granularity).
    pub fn elapsed(&self, now: DateTime<Utc>) -> bool {
        (now.year(), now.month()) > (self.year, self.month)
    }
}

impl TryFrom<String> for ValidityPeriod {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ValidityPeriod> for String {
    fn from(period: ValidityPeriod) -> Self {
        period.to_string()
    }
}

impl fmt::Display for ValidityPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year % 100)
    }
}

/// A card balance with fixed decimal precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A strictly positive transfer amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Balance(amount.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Blocked => "BLOCKED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::str::FromStr for CardStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "BLOCKED" => Ok(Self::Blocked),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(LedgerError::Validation(format!(
                "unknown card status: {other}"
            ))),
        }
    }
}

/// A bank card: a balance-bearing record with a lifecycle status and exactly
/// one owning user.
///
/// Status transitions go through [`Card::block`] and [`Card::activate`];
/// balance mutation goes through [`Card::debit`] and [`Card::credit`]. Nothing
/// else writes these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub number: CardNumber,
    pub holder_id: UserId,
    pub holder_username: String,
    pub validity: ValidityPeriod,
    status: CardStatus,
    balance: Balance,
}

impl Card {
    pub fn new(
        number: CardNumber,
        holder_id: UserId,
        holder_username: String,
        validity: ValidityPeriod,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            holder_id,
            holder_username,
            validity,
            status: CardStatus::Active,
            balance: Balance::ZERO,
        }
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Effective status at `now`: an elapsed validity period overrides the
    /// stored status with `Expired`.
    pub fn status_at(&self, now: DateTime<Utc>) -> CardStatus {
        if self.validity.elapsed(now) {
            CardStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == CardStatus::Active
    }

    /// Blocks the card. Legal only from the (effective) `Active` status.
    pub fn block(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        match self.status_at(now) {
            CardStatus::Active => {
                self.status = CardStatus::Blocked;
                Ok(())
            }
            CardStatus::Blocked => Err(LedgerError::InvalidState(
                "card is already blocked".to_string(),
            )),
            CardStatus::Expired => Err(LedgerError::InvalidState("card has expired".to_string())),
        }
    }

    /// Re-activates a blocked card. Legal only from `Blocked`.
    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        match self.status_at(now) {
            CardStatus::Blocked => {
                self.status = CardStatus::Active;
                Ok(())
            }
            CardStatus::Active => Err(LedgerError::InvalidState(
                "card is already active".to_string(),
            )),
            CardStatus::Expired => Err(LedgerError::InvalidState("card has expired".to_string())),
        }
    }

    /// Removes `amount` from the balance if covered.
    pub fn debit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        let debit: Balance = amount.into();
        if self.balance >= debit {
            self.balance -= debit;
            Ok(())
        } else {
            Err(LedgerError::InsufficientFunds)
        }
    }

    /// Adds `amount` to the balance.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }

    pub fn view(&self, now: DateTime<Utc>) -> CardView {
        CardView {
            number: self.number.masked(),
            holder: self.holder_username.clone(),
            validity: self.validity.to_string(),
            status: self.status_at(now),
            balance: self.balance.value(),
        }
    }

    /// Builder used when seeding a card with an opening balance, before it is
    /// first persisted. Stored cards only change balance through the engine.
    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = balance;
        self
    }
}

/// Outward projection of a card with the number masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub number: String,
    pub holder: String,
    pub validity: String,
    pub status: CardStatus,
    pub balance: Decimal,
}
