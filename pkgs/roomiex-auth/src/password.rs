//! Password hashing
//!
//! Passwords are hashed with Argon2id and stored as a PHC string, which
//! carries the algorithm, parameters and salt alongside the hash.

use argon2::password_hash::{
    self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use rand::RngCore;

const SALT_LEN: usize = 16;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash `password` with a fresh random salt, returning the PHC string
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)?;

    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(hash) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}
