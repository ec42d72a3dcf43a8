use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use tracing::{instrument, warn};

/// Salted argon2id PHC string for a non-member booking password.
#[instrument(skip(password))]
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// False on mismatch and on an unreadable stored hash.
#[instrument(skip(password, hash))]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("1234").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("1234"));
        assert!(verify_password("1234", &hash));
        assert!(!verify_password("4321", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("1234").unwrap(), hash_password("1234").unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("1234", "not-a-phc-string"));
    }
}
