use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash verified against when an email is unknown, so failed logins take the
/// same time either way.
static UNKNOWN_ACCOUNT_HASH: OnceLock<Option<String>> = OnceLock::new();

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Verify `password` against an optional stored hash. A missing account still
/// pays for one verification and always fails.
pub fn verify_login(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash).unwrap_or(false),
        None => {
            let dummy = UNKNOWN_ACCOUNT_HASH.get_or_init(|| hash_password("unknown-account").ok());
            if let Some(hash) = dummy {
                let _ = verify_password(password, hash);
            }
            false
        }
    }
}
