//! Deterministic meeting passwords.
//!
//! A password is derived from the meeting title and a secret salt, so
//! re-running a batch produces the same password for the same meeting
//! without storing it anywhere.

use sha2::{Digest, Sha256};

use crate::reconciler::MAX_PASSWORD_LEN;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of the alphabet size below 256; bytes at or above it
/// are skipped so every character is equally likely.
const SAMPLE_LIMIT: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Derive a password of `length` characters (capped at the meeting
/// password limit) from `title` and `salt`.
pub fn derive_password(title: &str, salt: &str, length: usize) -> String {
    let length = length.min(MAX_PASSWORD_LEN);
    let mut password = String::with_capacity(length);
    let mut block: u32 = 0;

    while password.len() < length {
        let digest = Sha256::new()
            .chain_update(title.as_bytes())
            .chain_update(salt.as_bytes())
            .chain_update(block.to_be_bytes())
            .finalize();

        for byte in digest {
            if password.len() == length {
                break;
            }
            if byte < SAMPLE_LIMIT {
                password.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
            }
        }

        block += 1;
    }

    password
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = derive_password("BAICS Meet-and-Greet: Ada and Grace", "salt", 10);
        let b = derive_password("BAICS Meet-and-Greet: Ada and Grace", "salt", 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn test_salt_and_title_change_password() {
        let base = derive_password("Talk A", "salt", 10);
        assert_ne!(base, derive_password("Talk A", "pepper", 10));
        assert_ne!(base, derive_password("Talk B", "salt", 10));
    }

    #[test]
    fn test_alphanumeric_only() {
        let password = derive_password("Talk A", "salt", 10);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_length_capped_at_limit() {
        assert_eq!(derive_password("Talk A", "", 64).len(), MAX_PASSWORD_LEN);
        assert_eq!(derive_password("Talk A", "", 6).len(), 6);
        assert_eq!(derive_password("Talk A", "", 0), "");
    }
}
