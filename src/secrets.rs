use rand::TryRngCore;
use rand::distr::slice::Choose;
use rand::prelude::*;
use rand::rngs::OsRng;
use thiserror::Error;

/// Characters eligible for a generated secret.
pub const ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*(-_=+)";

/// Length of the application signing key.
pub const SECRET_KEY_LENGTH: usize = 50;

pub const MAX_SECRET_LENGTH: usize = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("Secret length must be between 1 and {max}, got {length}")]
    InvalidLength { length: usize, max: usize },
}

/// Generates `length` characters drawn uniformly from [`ALPHABET`] using the
/// operating system's random source.
///
/// # Panics
///
/// Panics if the operating system cannot provide entropy.
pub fn generate_secret(length: usize) -> Result<String, SecretError> {
    if length == 0 || length > MAX_SECRET_LENGTH {
        return Err(SecretError::InvalidLength {
            length,
            max: MAX_SECRET_LENGTH,
        });
    }

    let Ok(alphabet) = Choose::new(ALPHABET) else {
        unreachable!("alphabet is not empty");
    };

    let rng = OsRng.unwrap_err();

    Ok(rng
        .sample_iter(alphabet)
        .take(length)
        .map(|&c| c as char)
        .collect::<String>())
}
