use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

/// Hashes a plaintext secret with Argon2id and a per-hash random salt.
/// Used for both user passwords and stored document credentials; the output
/// is a one-way PHC string, so the original plaintext is unrecoverable.
pub fn hash_secret(plain: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("hashing failed: {e}"))
}

/// Verifies a plaintext secret against a stored hash.
/// Returns `Ok(true)` on a match, `Ok(false)` on a mismatch; `Err` only for
/// a malformed stored hash.
pub fn verify_secret(plain: &str, stored: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored).map_err(|e| format!("invalid stored hash: {e}"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(format!("verification failed: {e}")),
    }
}
