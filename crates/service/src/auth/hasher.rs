use bcrypt::BcryptError;
use thiserror::Error;

pub const DEFAULT_COST: u32 = 10;
const BCRYPT_HASH_LEN: usize = 60;
const BCRYPT_SALT_LEN: usize = 29;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// The stored string is not a hash this component could have produced.
    #[error("invalid hash format: {0}")]
    InvalidHashFormat(String),
    #[error("password is longer than bcrypt can hash")]
    PasswordTooLong,
    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// One-way password derivation.
pub trait PasswordHasher: Send + Sync {
    /// Hash with a fresh random salt embedded in the result.
    /// Input past bcrypt's 72-byte key limit is refused, never cut short.
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch, including over-long input; `Err` only when `hash` is malformed.
    fn compare(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        bcrypt::non_truncating_hash(plaintext, self.cost).map_err(|e| match e {
            BcryptError::Truncation(_) => HashError::PasswordTooLong,
            other => HashError::Hashing(other.to_string()),
        })
    }

    fn compare(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        match bcrypt::non_truncating_verify(plaintext, hash) {
            Ok(matched) => Ok(matched),
            // No stored hash can stand for more than 72 bytes of input.
            Err(BcryptError::Truncation(_)) => Ok(false),
            Err(e) => Err(HashError::InvalidHashFormat(e.to_string())),
        }
    }
}

/// The `$2b$10$<22 chars>` prefix of a bcrypt hash.
pub fn salt_of(hash: &str) -> Option<&str> {
    if hash.len() != BCRYPT_HASH_LEN || !hash.starts_with("$2") {
        return None;
    }
    hash.get(..BCRYPT_SALT_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fast_hasher;

    #[test]
    fn same_plaintext_hashes_differently() {
        let h = fast_hasher();
        let a = h.hash("correct horse").unwrap();
        let b = h.hash("correct horse").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 60);
        assert!(h.compare("correct horse", &a).unwrap());
        assert!(h.compare("correct horse", &b).unwrap());
    }

    #[test]
    fn mismatch_is_false_not_error() {
        let h = fast_hasher();
        let hash = h.hash("pw-one").unwrap();
        assert_eq!(h.compare("pw-two", &hash), Ok(false));
        assert_eq!(h.compare("", &hash), Ok(false));
    }

    #[test]
    fn malformed_hash_is_distinct_error() {
        let h = fast_hasher();
        let err = h.compare("pw", "not-a-bcrypt-hash").unwrap_err();
        assert!(matches!(err, HashError::InvalidHashFormat(_)));
    }

    #[test]
    fn cost_is_embedded() {
        let h = BcryptHasher::new(5);
        assert!(h.hash("pw").unwrap().starts_with("$2b$05$"));
        assert_eq!(BcryptHasher::default().cost(), DEFAULT_COST);
    }

    #[test]
    fn bytes_past_72_are_not_ignored() {
        let h = fast_hasher();
        let prefix = "x".repeat(72);
        let a = format!("{prefix}A");
        let b = format!("{prefix}B");
        assert_eq!(h.hash(&a), Err(HashError::PasswordTooLong));

        // A hash written by a truncating bcrypt for `a` covers only the prefix.
        let legacy = bcrypt::hash(&a, 4).unwrap();
        assert_eq!(h.compare(&b, &legacy), Ok(false));
        assert_eq!(h.compare(&a, &legacy), Ok(false));

        let long = "x".repeat(64);
        let hash = h.hash(&long).unwrap();
        assert_eq!(h.compare(&long, &hash), Ok(true));
        assert_eq!(h.compare(&b, &hash), Ok(false));
    }

    #[test]
    fn salt_prefix_extraction() {
        let hash = fast_hasher().hash("pw").unwrap();
        let salt = salt_of(&hash).unwrap();
        assert_eq!(salt.len(), 29);
        assert!(hash.starts_with(salt));
        assert_eq!(salt_of("short"), None);
        assert_eq!(salt_of(&"x".repeat(60)), None);
    }
}
