//! Refresh tokens (§3): random 64-byte opaque strings, stored hashed so a
//! DB leak doesn't hand out usable tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Plaintext handed to the client, and the hash persisted in the DB.
pub struct IssuedRefreshToken {
    pub plaintext: String,
    pub hash: Vec<u8>,
}

pub fn generate() -> IssuedRefreshToken {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plaintext = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_token(&plaintext);
    IssuedRefreshToken { plaintext, hash }
}

pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_generate_is_random_and_hash_matches() {
        let a = generate();
        let b = generate();
        assert_ne!(a.plaintext, b.plaintext);
        assert_eq!(hash_token(&a.plaintext), a.hash);
    }
}
