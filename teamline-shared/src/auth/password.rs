/// Password hashing with bcrypt
///
/// Passwords are hashed with bcrypt, a salted adaptive hash whose cost (the
/// "work factor") is configurable and embedded in the produced hash string.
/// Verification therefore needs no configuration: the parameters are read
/// back out of the stored hash.
///
/// Hashing is intentionally CPU-expensive; callers on an async runtime should
/// run it via `tokio::task::spawn_blocking`.
///
/// # Example
///
/// ```
/// use teamline_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct-horse-battery", 4)?;
///
/// assert!(verify_password("correct-horse-battery", &hash)?);
/// assert!(!verify_password("wrong-password", &hash)?);
/// # Ok(())
/// # }
/// ```

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    Hash(String),

    /// Cost parameter outside bcrypt's supported range
    #[error("Invalid bcrypt cost {0}: must be between 4 and 31")]
    InvalidCost(u32),

    /// Stored hash is not a valid bcrypt string
    ///
    /// This is an integrity error in stored data, never a plain mismatch.
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with bcrypt at the given cost
///
/// The salt is generated internally from the OS RNG and embedded, together
/// with the cost, in the returned hash string (`$2b$...`).
///
/// # Errors
///
/// - `PasswordError::InvalidCost` if `cost` is outside 4..=31
/// - `PasswordError::Hash` if hashing fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    if !(4..=31).contains(&cost) {
        return Err(PasswordError::InvalidCost(cost));
    }

    bcrypt::hash(password, cost).map_err(|e| PasswordError::Hash(format!("Hash generation failed: {}", e)))
}

/// Verifies a password against a stored bcrypt hash
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
/// A mismatching password is NOT an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the test suite fast; production uses the configured
    // work factor (default 12).
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123", TEST_COST).expect("Hash should succeed");

        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$04$"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let password = "same_password";

        let hash1 = hash_password(password, TEST_COST).expect("Hash 1 should succeed");
        let hash2 = hash_password(password, TEST_COST).expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "correct_password";
        let hash = hash_password(password, TEST_COST).expect("Hash should succeed");

        assert!(verify_password(password, &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = "correct_password";
        let hash = hash_password(password, TEST_COST).expect("Hash should succeed");

        assert!(!verify_password("correct_passworD", &hash).expect("Verify should succeed"));
        assert!(!verify_password("", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_single_char_variation() {
        let password = "longenoughpassword";
        let hash = hash_password(password, TEST_COST).expect("Hash should succeed");

        for i in 0..password.len() {
            let mut variant: Vec<char> = password.chars().collect();
            variant[i] = if variant[i] == 'x' { 'y' } else { 'x' };
            let variant: String = variant.into_iter().collect();

            assert!(
                !verify_password(&variant, &hash).expect("Verify should succeed"),
                "Variant '{}' should not verify",
                variant
            );
        }
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        assert!(matches!(
            verify_password("password", "not-a-bcrypt-hash"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(matches!(hash_password("pw", 3), Err(PasswordError::InvalidCost(3))));
        assert!(matches!(hash_password("pw", 32), Err(PasswordError::InvalidCost(32))));
    }
}
