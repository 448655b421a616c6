//! Password hashing and account name rules.

use crate::error::{AuthError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Username length bounds, in characters.
pub const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=32;

/// A valid PHC string, with default parameters, that no password matches.
///
/// Logins for unknown usernames are verified against it.
pub const UNMATCHABLE_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$YYO/0wtEWH6Ky4nxdq1pvA$I99FW9YWC71Zyar8MOk4HLNggnwSTS0UldiagNuzBV8";

/// Hash a password into an argon2 PHC string.
///
/// # Errors
///
/// [`AuthError::InternalError`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC string.
///
/// A hash that does not parse never verifies.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Enforce the minimum password length.
///
/// # Errors
///
/// [`AuthError::Validation`] for passwords shorter than [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Trim and check a username.
///
/// Allowed characters are ASCII letters, digits, `_`, `.` and `-`.
///
/// # Errors
///
/// [`AuthError::Validation`] for empty, too long or ill-formed names.
///
/// # Examples
///
/// ```
/// use rifa_auth::password::normalize_username;
///
/// assert_eq!(normalize_username("  ana.m ").unwrap(), "ana.m");
/// assert!(normalize_username("a b").is_err());
/// ```
pub fn normalize_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    let length = username.chars().count();
    if !USERNAME_LENGTH.contains(&length) {
        return Err(AuthError::Validation(format!(
            "username must be between {} and {} characters",
            USERNAME_LENGTH.start(),
            USERNAME_LENGTH.end()
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(AuthError::Validation(
            "username may only contain letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(username.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-real-hash"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_unmatchable_hash_costs_like_a_real_one() {
        let dummy = PasswordHash::new(UNMATCHABLE_HASH).unwrap();
        let real_hash = hash_password("correct horse").unwrap();
        let real = PasswordHash::new(&real_hash).unwrap();

        assert_eq!(dummy.algorithm.to_string(), real.algorithm.to_string());
        assert_eq!(dummy.params.to_string(), real.params.to_string());
        assert!(!verify_password("correct horse", UNMATCHABLE_HASH));
        assert!(!verify_password("", UNMATCHABLE_HASH));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(normalize_username(" admin ").unwrap(), "admin");
        assert_eq!(normalize_username("ana_m-2.x").unwrap(), "ana_m-2.x");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username(&"a".repeat(33)).is_err());
        assert!(normalize_username("ana@mail").is_err());
        assert!(normalize_username("   ").is_err());
    }
}
