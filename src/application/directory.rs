use crate::application::policy::AccessPolicy;
use crate::application::query::{Page, SortDirection};
use crate::domain::ports::UserStoreHandle;
use crate::domain::user::{Identity, Role, User, UserView, Username};
use crate::error::{LedgerError, Result};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// The user directory: owns identity records and the credential hashes that
/// guard them.
pub struct UserDirectory {
    users: UserStoreHandle,
}

impl UserDirectory {
    pub fn new(users: UserStoreHandle) -> Self {
        Self { users }
    }

    /// Registers a new user. Usernames are unique; a duplicate yields
    /// `Conflict`.
    pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let username = Username::new(username)?;
        if self.users.get(&username).await?.is_some() {
            return Err(LedgerError::Conflict(format!(
                "username {username} is already taken"
            )));
        }

        let user = User::new(username, hash_password(password)?, role);
        self.users.put(user.clone()).await?;
        tracing::info!(username = %user.username, role = ?user.role, "registered user");
        Ok(user)
    }

    pub async fn get(&self, username: &Username) -> Result<User> {
        self.users
            .get(username)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("user {username} not found")))
    }

    /// Checks a presented password against the stored hash.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<User> {
        let username = Username::new(username)?;
        let user = self
            .users
            .get(&username)
            .await?
            .ok_or_else(|| LedgerError::Authentication("bad credentials".to_string()))?;

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|_| LedgerError::Authentication("bad credentials".to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| LedgerError::Authentication("bad credentials".to_string()))?;
        Ok(user)
    }

    /// Removes a user record. Administrative.
    pub async fn delete(&self, username: &Username, identity: &Identity) -> Result<()> {
        AccessPolicy::require_admin(identity)?;
        // Ensure the target exists so absence surfaces as NotFound.
        self.get(username).await?;
        self.users.delete(username).await?;
        tracing::info!(%username, "deleted user");
        Ok(())
    }

    /// All users, sorted by username, paged zero-based. Administrative.
    pub async fn list(
        &self,
        identity: &Identity,
        page: Page,
        direction: SortDirection,
    ) -> Result<Vec<UserView>> {
        AccessPolicy::require_admin(identity)?;
        let mut users = self.users.all().await?;
        users.sort_by(|a, b| {
            let ord = a.username.cmp(&b.username);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        Ok(page.slice(&users).iter().map(UserView::from).collect())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| LedgerError::storage(std::io::Error::other(err.to_string())))
}
