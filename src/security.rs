use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

/// A real Argon2id hash of a throwaway secret. Verifying against it costs the
/// same as verifying a stored hash, so logins for unknown emails take as long
/// as logins with a wrong password.
pub fn decoy_hash() -> Result<String> {
    let mut secret = [0u8; 16];
    getrandom::getrandom(&mut secret).map_err(|e| anyhow!(e.to_string()))?;
    hash_password(&base64::Engine::encode(&base64::engine::general_purpose::STANDARD_NO_PAD, secret))
}

/// False for a wrong password and for anything that is not a PHC string.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}
