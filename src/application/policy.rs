use crate::domain::card::Card;
use crate::domain::user::Identity;
use crate::error::{LedgerError, Result};

/// Authorization checks for the two policy axes: role and ownership.
///
/// Ownership is decided by stable identifier equality, never by comparing
/// entity instances. All checks run before any mutation is attempted, so a
/// denied request has no side effects.
pub struct AccessPolicy;

impl AccessPolicy {
    /// Administrative operations: create/delete/activate any card, list all
    /// cards and users, delete users.
    pub fn require_admin(identity: &Identity) -> Result<()> {
        if identity.is_admin() {
            Ok(())
        } else {
            Err(LedgerError::AccessDenied(format!(
                "operation requires the ADMIN role, {} has {:?}",
                identity.username, identity.role
            )))
        }
    }

    /// Self-service operations: the acting identity must be the card holder.
    pub fn require_owner(identity: &Identity, card: &Card) -> Result<()> {
        if identity.id == card.holder_id {
            Ok(())
        } else {
            Err(LedgerError::AccessDenied(format!(
                "card {} is not held by {}",
                card.number, identity.username
            )))
        }
    }

    /// Blocking is allowed for admins on any card and for holders on their own.
    pub fn require_admin_or_owner(identity: &Identity, card: &Card) -> Result<()> {
        if identity.is_admin() {
            Ok(())
        } else {
            Self::require_owner(identity, card)
        }
    }
}
