use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use log::error;

use crate::fallible::Error;

lazy_static! {
    static ref ARGON2: Argon2<'static> = Argon2::default();
}

/// Hashes ``password`` with argon2id and a random salt.
/// The result is a PHC string ($argon2id$v=19$...) that contains the salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    ARGON2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("failed to hash password: {}", e);
            Error::Internal
        })
}

/// Whether ``password`` matches the stored PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!("stored password hash is malformed: {}", e);
        Error::Internal
    })?;
    Ok(ARGON2.verify_password(password.as_bytes(), &parsed).is_ok())
}
