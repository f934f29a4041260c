//! Bearer tokens.
//!
//! On the wire a token reads `<user id>:<secret>:<salt>`, both binary parts in
//! standard base64. The store only ever sees the Argon2 hash of the secret,
//! which doubles as the lookup key.

use crate::model::{Id, user::UserMarker};
use argon2::{Argon2, Params};
use base64::{DecodeError, Engine, display::Base64Display, prelude::BASE64_STANDARD};
use std::{
    fmt::{Debug, Formatter},
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

pub const SECRET_LEN: usize = 24;
pub const SALT_LEN: usize = 18;
pub const HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing auth token failed: {0}")]
pub struct AuthTokenHashError(argon2::Error);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum AuthTokenDecodeError {
    #[error("Expected `<user id>:<secret>:<salt>`")]
    Shape,
    #[error("Invalid user id: {0}")]
    InvalidUserId(#[from] ParseIntError),
    #[error("The {part} is not valid base64: {source}")]
    Base64 {
        part: &'static str,
        source: DecodeError,
    },
    #[error("The {part} should decode to {expected} bytes")]
    Length { part: &'static str, expected: usize },
}

/// Why a token that matched a stored hash is still refused.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum TokenRejection {
    #[error("Token was presented under another user id")]
    WrongUser,
    #[error("Token has expired")]
    Expired,
}

/// A token as handed out to, and presented by, a client.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct AuthToken {
    user_id: Id<UserMarker>,
    secret: [u8; SECRET_LEN],
    salt: [u8; SALT_LEN],
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct AuthTokenHash(Box<[u8; HASH_LEN]>);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The auth token hash had an invalid length")]
pub struct InvalidAuthTokenHashError;

/// How long a token stays valid after it was issued.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash)]
pub struct TokenLifetime(Duration);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Token lifetime must be positive, got {0} seconds")]
pub struct InvalidTokenLifetimeError(i64);

/// A stored token: whose it is, the hash to compare against and its validity window.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Authentication {
    pub user: Id<UserMarker>,
    pub token_hash: AuthTokenHash,
    pub created_at: UtcDateTime,
    pub expires_after: Option<TokenLifetime>,
}

impl AuthToken {
    #[must_use]
    pub fn generate_random(user_id: Id<UserMarker>) -> Self {
        Self {
            user_id,
            secret: rand::random(),
            salt: rand::random(),
        }
    }

    /// The user this token claims to belong to. Only trustworthy after
    /// [`Authentication::verify`].
    #[must_use]
    pub fn user_id(&self) -> Id<UserMarker> {
        self.user_id
    }

    /// The string a client sends as its bearer credential.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            self.user_id,
            Base64Display::new(&self.secret, &BASE64_STANDARD),
            Base64Display::new(&self.salt, &BASE64_STANDARD),
        )
    }

    pub fn hash(&self) -> Result<AuthTokenHash, AuthTokenHashError> {
        let mut hash = Box::new([0; HASH_LEN]);
        Argon2::default()
            .hash_password_into(&self.secret, &self.salt, &mut *hash)
            .map_err(AuthTokenHashError)?;

        Ok(AuthTokenHash(hash))
    }
}

fn decode_part<const N: usize>(
    part: &'static str,
    encoded: &str,
) -> Result<[u8; N], AuthTokenDecodeError> {
    BASE64_STANDARD
        .decode(encoded)
        .map_err(|source| AuthTokenDecodeError::Base64 { part, source })?
        .try_into()
        .map_err(|_| AuthTokenDecodeError::Length { part, expected: N })
}

impl FromStr for AuthToken {
    type Err = AuthTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user_id, rest) = s.split_once(':').ok_or(AuthTokenDecodeError::Shape)?;
        let (secret, salt) = rest.split_once(':').ok_or(AuthTokenDecodeError::Shape)?;

        Ok(Self {
            user_id: user_id.parse::<u64>()?.into(),
            secret: decode_part("secret", secret)?,
            salt: decode_part("salt", salt)?,
        })
    }
}

impl Debug for AuthToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl AuthTokenHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Debug for AuthTokenHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthTokenHash(..)")
    }
}

impl TryFrom<Box<[u8]>> for AuthTokenHash {
    type Error = InvalidAuthTokenHashError;

    fn try_from(value: Box<[u8]>) -> Result<Self, Self::Error> {
        value
            .try_into()
            .map(Self)
            .map_err(|_| InvalidAuthTokenHashError)
    }
}

impl TokenLifetime {
    pub fn from_seconds(seconds: i64) -> Result<Self, InvalidTokenLifetimeError> {
        if seconds > 0 {
            Ok(Self(Duration::seconds(seconds)))
        } else {
            Err(InvalidTokenLifetimeError(seconds))
        }
    }

    #[must_use]
    pub fn whole_seconds(self) -> i64 {
        self.0.whole_seconds()
    }
}

impl Authentication {
    /// The record to store for a freshly handed out `token`.
    pub fn issue(
        token: &AuthToken,
        issued_at: UtcDateTime,
        expires_after: Option<TokenLifetime>,
    ) -> Result<Self, AuthTokenHashError> {
        Ok(Self {
            user: token.user_id,
            token_hash: token.hash()?,
            created_at: issued_at,
            expires_after,
        })
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<UtcDateTime> {
        self.expires_after
            .map(|lifetime| self.created_at + lifetime.0)
    }

    /// Checks `token`, whose hash led to this record, and yields the user it
    /// authenticates.
    pub fn verify(
        &self,
        token: &AuthToken,
        now: UtcDateTime,
    ) -> Result<Id<UserMarker>, TokenRejection> {
        if token.user_id != self.user {
            return Err(TokenRejection::WrongUser);
        }
        if self.expires_at().is_some_and(|expires_at| expires_at < now) {
            return Err(TokenRejection::Expired);
        }

        Ok(self.user)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        auth::{
            AuthToken, AuthTokenDecodeError, Authentication, SECRET_LEN, TokenLifetime,
            TokenRejection,
        },
    };
    use time::{Duration, macros::utc_datetime};

    #[test]
    fn token_string_parses_back() {
        let token = AuthToken::generate_random(Id::new(42));
        let parsed: AuthToken = token.encode().parse().unwrap();

        assert_eq!(parsed, token);
        assert_eq!(parsed.user_id(), Id::new(42));
        assert_eq!(parsed.hash().unwrap(), token.hash().unwrap());
    }

    #[test]
    fn malformed_tokens() {
        assert_eq!("42".parse::<AuthToken>(), Err(AuthTokenDecodeError::Shape));
        assert_eq!("42:AAAA".parse::<AuthToken>(), Err(AuthTokenDecodeError::Shape));
        assert!(matches!(
            "x:AAAA:AAAA".parse::<AuthToken>(),
            Err(AuthTokenDecodeError::InvalidUserId(_))
        ));
        assert!(matches!(
            "42:!!!!:AAAA".parse::<AuthToken>(),
            Err(AuthTokenDecodeError::Base64 { part: "secret", .. })
        ));
        assert_eq!(
            "42:AAAA:AAAA".parse::<AuthToken>(),
            Err(AuthTokenDecodeError::Length {
                part: "secret",
                expected: SECRET_LEN
            })
        );
    }

    #[test]
    fn debug_hides_secret() {
        let token = AuthToken::generate_random(Id::new(7));
        let encoded = token.encode();
        let (_, secret_and_salt) = encoded.split_once(':').unwrap();

        let debug = format!("{token:?} {:?}", token.hash().unwrap());
        assert!(!debug.contains(secret_and_salt));
        assert!(debug.contains("AuthTokenHash(..)"));
    }

    #[test]
    fn verify_checks_owner_and_expiry() {
        let issued_at = utc_datetime!(2025-06-01 12:00);
        let token = AuthToken::generate_random(Id::new(1));
        let lifetime = TokenLifetime::from_seconds(60).unwrap();
        let authentication = Authentication::issue(&token, issued_at, Some(lifetime)).unwrap();

        assert_eq!(
            authentication.verify(&token, issued_at + Duration::seconds(60)),
            Ok(Id::new(1))
        );
        assert_eq!(
            authentication.verify(&token, issued_at + Duration::seconds(61)),
            Err(TokenRejection::Expired)
        );

        let borrowed: AuthToken = token.encode().replacen('1', "2", 1).parse().unwrap();
        assert_eq!(
            authentication.verify(&borrowed, issued_at),
            Err(TokenRejection::WrongUser)
        );
    }

    #[test]
    fn tokens_without_lifetime_never_expire() {
        let issued_at = utc_datetime!(2025-06-01 12:00);
        let token = AuthToken::generate_random(Id::new(3));
        let authentication = Authentication::issue(&token, issued_at, None).unwrap();

        assert_eq!(authentication.expires_at(), None);
        assert!(
            authentication
                .verify(&token, issued_at + Duration::days(10_000))
                .is_ok()
        );
    }

    #[test]
    fn lifetime_must_be_positive() {
        assert_eq!(TokenLifetime::from_seconds(60).unwrap().whole_seconds(), 60);
        assert!(TokenLifetime::from_seconds(0).is_err());
        assert!(TokenLifetime::from_seconds(-5).is_err());
    }
}
