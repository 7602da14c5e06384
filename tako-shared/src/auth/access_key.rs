/// Access key generation and hashing
///
/// Access keys are the single-use credentials emailed to prospective users.
/// They unlock the Slack install link exactly once.
///
/// # Key Format
///
/// `KEY-XXXXXX-TK` where `XXXXXX` is six uppercase hex characters
/// (three random bytes). Only the SHA-256 hex digest of the full key is
/// persisted.
///
/// # Example
///
/// ```
/// use tako_shared::auth::access_key::{generate_access_key, hash_access_key, validate_access_key_format};
///
/// let (key, hash) = generate_access_key();
/// assert!(validate_access_key_format(&key));
/// assert_eq!(hash_access_key(&key), hash);
/// assert_eq!(hash.len(), 64);
/// ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Access key prefix
pub const KEY_PREFIX: &str = "KEY-";

/// Access key suffix
pub const KEY_SUFFIX: &str = "-TK";

/// Number of random bytes in the middle segment
const KEY_RANDOM_BYTES: usize = 3;

/// Total length of an access key
pub const ACCESS_KEY_LENGTH: usize = KEY_PREFIX.len() + KEY_RANDOM_BYTES * 2 + KEY_SUFFIX.len();

/// Generates a new access key
///
/// Returns `(plaintext_key, sha256_hex_digest)`. The plaintext is meant to be
/// delivered once and then forgotten.
pub fn generate_access_key() -> (String, String) {
    let mut bytes = [0u8; KEY_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let key = format!("{}{}{}", KEY_PREFIX, hex::encode_upper(bytes), KEY_SUFFIX);
    let hash = hash_access_key(&key);

    (key, hash)
}

/// Hashes an access key with SHA-256 (lowercase hex, 64 characters)
pub fn hash_access_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks that `key` looks like `KEY-XXXXXX-TK` with uppercase hex digits
pub fn validate_access_key_format(key: &str) -> bool {
    if key.len() != ACCESS_KEY_LENGTH {
        return false;
    }

    key.strip_prefix(KEY_PREFIX)
        .and_then(|rest| rest.strip_suffix(KEY_SUFFIX))
        .is_some_and(|middle| {
            middle
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_access_key_format() {
        let (key, hash) = generate_access_key();

        assert!(key.starts_with("KEY-"));
        assert!(key.ends_with("-TK"));
        assert_eq!(key.len(), 13);
        assert!(validate_access_key_format(&key));
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let hash = hash_access_key("KEY-0A1B2C-TK");
        assert_eq!(hash, hash_access_key("KEY-0A1B2C-TK"));
        assert_ne!(hash, hash_access_key("KEY-0A1B2D-TK"));
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_known_value() {
        // sha256("abc")
        assert_eq!(
            hash_access_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_validate_access_key_format() {
        assert!(validate_access_key_format("KEY-ABCDEF-TK"));
        assert!(validate_access_key_format("KEY-012345-TK"));

        assert!(!validate_access_key_format("KEY-abcdef-TK"));
        assert!(!validate_access_key_format("KEY-ABCDEG-TK"));
        assert!(!validate_access_key_format("KEY-ABCDE-TK"));
        assert!(!validate_access_key_format("KEY-ABCDEF0-TK"));
        assert!(!validate_access_key_format("XEY-ABCDEF-TK"));
        assert!(!validate_access_key_format("KEY-ABCDEF-TX"));
        assert!(!validate_access_key_format(""));
    }

    #[test]
    fn test_generated_keys_differ() {
        let keys: std::collections::HashSet<String> =
            (0..32).map(|_| generate_access_key().0).collect();
        // 24 bits of entropy per key
        assert!(keys.len() > 30);
    }
}
