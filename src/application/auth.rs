use crate::application::directory::UserDirectory;
use crate::domain::ports::{ClockHandle, UserStoreHandle};
use crate::domain::user::{Identity, Role, User, Username};
use crate::error::{LedgerError, Result};
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token lifetime: issuance plus 24 hours.
const TOKEN_TTL_HOURS: i64 = 24;

/// Claim set carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Stable user identifier.
    pub id: Uuid,
    pub role: Role,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiry (Unix timestamp).
    pub exp: i64,
}

/// Stateless signed-token identity layer.
///
/// Tokens are HS256 JWTs; validity is wholly determined by the token content
/// and the signing secret, so there is no revocation before natural expiry.
/// The secret is supplied externally at construction and never lives in
/// source. Issuance timestamps come from the injected clock; expiry checking
/// on validation is done by `jsonwebtoken` against the system clock with zero
/// leeway.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    users: UserStoreHandle,
    clock: ClockHandle,
}

impl TokenService {
    pub fn new(secret: &[u8], users: UserStoreHandle, clock: ClockHandle) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            users,
            clock,
        }
    }

    /// Issues a token asserting `user`'s identity for the next 24 hours.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user.username.as_str().to_string(),
            id: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Decodes and verifies a token without touching the directory.
    ///
    /// Signature integrity (constant-time MAC comparison inside
    /// `jsonwebtoken`) and expiry are checked here.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Validates a token and resolves it to a canonical identity.
    ///
    /// The subject must name an existing user and the token's id claim must
    /// match the stored identifier; the role comes from the directory, not
    /// from the token.
    pub async fn validate(&self, token: &str) -> Result<Identity> {
        let claims = self.decode(token)?;
        let username = Username::new(claims.sub.clone())
            .map_err(|_| LedgerError::Authentication("malformed token subject".to_string()))?;
        let user = self
            .users
            .get(&username)
            .await?
            .ok_or_else(|| LedgerError::Authentication("unknown token subject".to_string()))?;
        if user.id != claims.id {
            return Err(LedgerError::Authentication(
                "token subject does not match stored identity".to_string(),
            ));
        }
        Ok(Identity::from(&user))
    }
}

/// Registration and login on top of the directory and the token service.
pub struct AuthService {
    directory: UserDirectory,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(directory: UserDirectory, tokens: TokenService) -> Self {
        Self { directory, tokens }
    }

    /// Registers a user and returns a token for the fresh identity.
    pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<String> {
        let user = self.directory.register(username, password, role).await?;
        self.tokens.issue(&user)
    }

    /// Verifies credentials and returns a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let user = self.directory.verify_password(username, password).await?;
        self.tokens.issue(&user)
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
