/// Single-use link tokens
///
/// Email-confirmation and password-recovery links carry a random token. Only
/// its SHA-256 hash is stored (see [`crate::models::auth_token`]), so a leaked
/// table does not leak working links.
///
/// # Example
///
/// ```
/// use inyeon_shared::auth::tokens::{generate_link_token, hash_link_token};
///
/// let (token, hash) = generate_link_token();
/// assert_eq!(token.len(), 48);
/// assert_eq!(hash, hash_link_token(&token));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a link token in characters
pub const LINK_TOKEN_LENGTH: usize = 48;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a URL-safe token and its hash
///
/// Returns `(plaintext, sha256_hex)`. The plaintext goes into the emailed
/// link and is never stored.
pub fn generate_link_token() -> (String, String) {
    let mut rng = rand::thread_rng();

    let token: String = (0..LINK_TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let hash = hash_link_token(&token);

    (token, hash)
}

/// Hex-encoded SHA-256 of a token (64 characters)
pub fn hash_link_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check before touching the database
pub fn is_well_formed(token: &str) -> bool {
    token.len() == LINK_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_link_token() {
        let (token1, hash1) = generate_link_token();
        let (token2, hash2) = generate_link_token();

        assert!(is_well_formed(&token1));
        assert_eq!(hash1.len(), 64);
        assert_ne!(token1, token2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_link_token("abc"), hash_link_token("abc"));
        assert_eq!(
            hash_link_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_is_well_formed() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a-".repeat(24)));
        assert!(is_well_formed(&"a1".repeat(24)));
    }
}
