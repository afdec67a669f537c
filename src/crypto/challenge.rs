use rand::{distributions::Alphanumeric, Rng};

/// Length of nonces produced by [`generate_nonce`]
pub const NONCE_LENGTH: usize = 17;

/// Shortest nonce a message may carry
pub const MIN_NONCE_LENGTH: usize = 8;

/// Generate a random alphanumeric nonce
///
/// Returns 17 characters drawn from `[A-Za-z0-9]`, roughly 96 bits of
/// entropy. Messages that are serialized without a nonce get one of these.
///
/// # Example
/// ```rust
/// use siwx::crypto::challenge::{generate_nonce, is_valid_nonce};
///
/// let nonce = generate_nonce();
/// assert!(is_valid_nonce(&nonce));
/// ```
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether the whole string is at least 8 ASCII alphanumeric characters
pub fn is_valid_nonce(nonce: &str) -> bool {
    nonce.len() >= MIN_NONCE_LENGTH && nonce.chars().all(|c| c.is_ascii_alphanumeric())
}
