//! Password hashing utilities

use bcrypt::{hash, verify, DEFAULT_COST};

/// bcrypt hasher with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    /// Lowest cost bcrypt accepts. Only for tests.
    pub const MIN_COST: u32 = 4;

    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt
    pub fn hash(&self, password: &str) -> Result<String, bcrypt::BcryptError> {
        hash(password, self.cost)
    }

    /// Verify a password against a hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
        verify(password, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = PasswordHasher::with_cost(PasswordHasher::MIN_COST);
        let hashed = hasher.hash("hunter22").unwrap();

        assert_ne!(hashed, "hunter22");
        assert!(hasher.verify("hunter22", &hashed).unwrap());
        assert!(!hasher.verify("hunter23", &hashed).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = PasswordHasher::default();
        assert!(hasher.verify("whatever", "not-a-bcrypt-hash").is_err());
    }
}
