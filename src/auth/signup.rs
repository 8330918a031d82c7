//! Signup
//!
//! Validation of the ``addUser`` arguments.
use lazy_static::lazy_static;
use regex::Regex;

use super::password::hash_password;
use crate::{fallible::Error, models::NewUser};

/// Minimum length of a password in characters
pub const MIN_PASSWORD_LENGTH: usize = 5;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r".+@.+\..+").expect("email regex is valid");
}

/// Checks the signup arguments and hashes the password
pub fn new_user(username: &str, email: &str, password: &str) -> Result<NewUser, Error> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::bad_input("username must not be empty"));
    }

    let email = email.trim();
    if !EMAIL.is_match(email) {
        return Err(Error::bad_input("must match an email address"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::bad_input(format!(
            "password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }

    Ok(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_username_and_email() {
        let user = new_user("  alice ", " alice@example.com", "secret").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.password_hash, "secret");
    }

    #[test]
    fn test_rejects() {
        for (username, email, password) in [
            ("   ", "alice@example.com", "secret"),
            ("alice", "alice@example", "secret"),
            ("alice", "example.com", "secret"),
            ("alice", "alice@example.com", "1234"),
        ] {
            let e = new_user(username, email, password).unwrap_err();
            assert_eq!(e.code(), "BAD_USER_INPUT", "{} {} {}", username, email, password);
        }
    }
}
