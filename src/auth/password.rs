use argon2::{
    Argon2,
    password_hash::{Error, PasswordHash, PasswordVerifier},
};

/// Checks `password` against a stored PHC-format argon2 hash. Accounts are
/// provisioned by the HR profile service, which owns hashing.
pub fn verify_password(password: &str, hashed: &str) -> Result<(), Error> {
    let parsed = PasswordHash::new(hashed)?;
    Argon2::default().verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    fn hash(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn verifies_matching_password() {
        let stored = hash("s3cret");
        assert!(verify_password("s3cret", &stored).is_ok());
        assert!(verify_password("wrong", &stored).is_err());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_panic() {
        assert!(verify_password("s3cret", "not-a-phc-string").is_err());
    }
}
