use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("password hashing failed")]
    Hash,
    #[error("stored password hash is malformed")]
    MalformedHash,
}

/// Argon2id password hashing and verification.
///
/// Verification is a pure decision over the stored hash; persistence of a
/// new hash is always performed explicitly by the caller.
#[derive(Debug, Clone, Default)]
pub struct AuthCrypto;

impl AuthCrypto {
    pub fn new() -> Self {
        Self
    }

    pub fn hash_password(&self, plaintext: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| CryptoError::Hash)?;

        Ok(hash.to_string())
    }

    /// Returns whether `plaintext` matches `hash`. A wrong password is
    /// `Ok(false)`; only an undecodable stored hash is an error.
    pub fn verify_password(&self, plaintext: &str, hash: &str) -> Result<bool, CryptoError> {
        let parsed = PasswordHash::new(hash).map_err(|_| CryptoError::MalformedHash)?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_round_trip() {
        let crypto = AuthCrypto::new();
        let hash = crypto.hash_password("correct horse").unwrap();

        assert!(crypto.verify_password("correct horse", &hash).unwrap());
        assert!(!crypto.verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        let crypto = AuthCrypto::new();
        assert!(matches!(
            crypto.verify_password("anything", "not-a-phc-string"),
            Err(CryptoError::MalformedHash)
        ));
    }
}
