//! Credential and session token hashing
//!
//! Passwords are stored as `SHA-256(salt || password)` with a per-user random
//! salt. Session tokens are random 256-bit values handed to the client once;
//! only their SHA-256 digest is persisted, so a leaked database does not
//! yield usable tokens.
//!
//! Pure functions only. Session lookup and HTTP extraction live in the API
//! crate.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Credential validation failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Password shorter than [`MIN_PASSWORD_LEN`]
    PasswordTooShort { length: usize },

    /// Email without a local part, `@`, or dotted domain
    InvalidEmail(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::PasswordTooShort { length } => write!(
                f,
                "Password must be at least {} characters (got {})",
                MIN_PASSWORD_LEN, length
            ),
            CredentialError::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Generate a random 128-bit salt as 32 hex characters
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Generate a random 256-bit session token as 64 hex characters
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Hash a password with its salt
///
/// # Examples
///
/// ```
/// use lico_common::auth::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse", "0011aabb");
/// assert_eq!(hash.len(), 64);
/// assert!(verify_password("correct horse", "0011aabb", &hash));
/// assert!(!verify_password("wrong horse", "0011aabb", &hash));
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password against a stored salt and hash
///
/// Comparison touches every byte regardless of where the first mismatch is.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let calculated = hash_password(password, salt);
    if calculated.len() != stored_hash.len() {
        return false;
    }
    calculated
        .bytes()
        .zip(stored_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Digest under which a session token is stored
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate registration credentials
pub fn validate_credentials(email: &str, password: &str) -> Result<(), CredentialError> {
    let email = email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid_email {
        return Err(CredentialError::InvalidEmail(email.to_string()));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort { length });
    }

    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
