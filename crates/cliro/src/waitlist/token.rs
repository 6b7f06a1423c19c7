use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length in hex characters of a verification token.
pub const VERIFICATION_TOKEN_LENGTH: usize = 32;

/// Opaque email-verification token: a truncated SHA-256 over the email, a random salt and the
/// issue time. Nothing consumes it yet.
pub fn verification_token(email: &str, issued_at: DateTime<Utc>) -> String {
    let salt = Uuid::new_v4();

    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(issued_at.timestamp_micros().to_le_bytes());
    let digest = hasher.finalize();

    hex::encode(&digest[..VERIFICATION_TOKEN_LENGTH / 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_32_lowercase_hex_characters() {
        let token = verification_token("test@example.com", Utc::now());
        assert_eq!(token.len(), VERIFICATION_TOKEN_LENGTH);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn tokens_do_not_repeat_for_same_input() {
        let issued_at = Utc::now();
        let tokens: HashSet<String> = (0..256)
            .map(|_| verification_token("test@example.com", issued_at))
            .collect();
        assert_eq!(tokens.len(), 256);
    }

    #[test]
    fn tokens_do_not_embed_the_email() {
        let token = verification_token("visible@example.com", Utc::now());
        assert!(!token.contains("visible"));
    }
}
