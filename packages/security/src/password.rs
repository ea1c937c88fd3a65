// ABOUTME: Password hashing with Argon2id
// ABOUTME: Produces and verifies PHC-format hash strings

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};

use bookshare_storage::StorageError;

/// Argon2id with OWASP's minimum recommendation (19 MiB, 2 passes)
fn hasher() -> Result<Argon2<'static>, StorageError> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|e| StorageError::Password(format!("Invalid Argon2 params: {}", e)))?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password into a PHC string
pub fn hash_password(password: &str) -> Result<String, StorageError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StorageError::Password(e.to_string()))
}

/// Check a plaintext password against a stored PHC string.
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    match hasher() {
        Ok(argon2) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
