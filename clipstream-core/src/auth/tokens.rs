use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The two credential kinds minted by the codec. Each kind signs with its
/// own secret and carries its own time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in every signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    /// Unique per mint, so rotation always yields a fresh string even when
    /// two tokens for the same subject are issued within the same second.
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("malformed or unsigned token")]
    Invalid,
    #[error("token signing failed")]
    Signing,
}

/// Secrets and lifetimes for both token kinds, supplied via configuration.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Stateless mint/verify for signed, expiring tokens.
///
/// Verification never touches a store: validity of an access token is
/// signature + expiry alone, and the refresh-matching invariant lives one
/// layer up in the session manager.
pub struct TokenCodec {
    access: KindKeys,
    refresh: KindKeys,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(settings: &TokenSettings) -> Self {
        Self {
            access: KindKeys {
                encoding: EncodingKey::from_secret(settings.access_secret.as_ref()),
                decoding: DecodingKey::from_secret(settings.access_secret.as_ref()),
                ttl: settings.access_ttl,
            },
            refresh: KindKeys {
                encoding: EncodingKey::from_secret(settings.refresh_secret.as_ref()),
                decoding: DecodingKey::from_secret(settings.refresh_secret.as_ref()),
                ttl: settings.refresh_ttl,
            },
        }
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn mint(&self, subject: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let now = Utc::now();

        let claims = Claims {
            sub: subject,
            kind,
            iat: now.timestamp(),
            exp: (now + keys.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|_| TokenError::Signing)
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let keys = self.keys(kind);
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        // A token signed with the right secret but minted for the other
        // purpose is still not acceptable here.
        if data.claims.kind != kind {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&TokenSettings {
            access_secret: "access-secret-for-tests".to_string(),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            access_ttl: Duration::seconds(900),
            refresh_ttl: Duration::days(30),
        })
    }

    #[test]
    fn mint_and_verify_round_trip() {
        let codec = codec();
        let subject = Uuid::new_v4();

        let token = codec.mint(subject, TokenKind::Access).unwrap();
        let claims = codec.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, subject);
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn kinds_do_not_cross_verify() {
        let codec = codec();
        let subject = Uuid::new_v4();

        let access = codec.mint(subject, TokenKind::Access).unwrap();
        let refresh = codec.mint(subject, TokenKind::Refresh).unwrap();

        assert!(matches!(
            codec.verify(&access, TokenKind::Refresh),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            codec.verify(&refresh, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let now = Utc::now();

        let claims = Claims {
            sub: Uuid::new_v4(),
            kind: TokenKind::Refresh,
            iat: (now - Duration::days(31)).timestamp(),
            exp: (now - Duration::days(1)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("refresh-secret-for-tests".as_ref()),
        )
        .unwrap();

        assert!(matches!(
            codec.verify(&token, TokenKind::Refresh),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn garbage_is_invalid_not_expired() {
        let codec = codec();
        assert!(matches!(
            codec.verify("not-a-real-token", TokenKind::Refresh),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn successive_mints_differ() {
        let codec = codec();
        let subject = Uuid::new_v4();

        let first = codec.mint(subject, TokenKind::Refresh).unwrap();
        let second = codec.mint(subject, TokenKind::Refresh).unwrap();

        assert_ne!(first, second);
    }
}
