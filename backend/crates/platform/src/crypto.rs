//! Cryptographic Utilities

use rand::RngCore;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Draw characters uniformly from an alphabet
///
/// The caller must pass an alphabet whose length divides 256, otherwise
/// the draw is biased toward the low end of the alphabet.
pub fn random_string(alphabet: &[u8], len: usize) -> String {
    debug_assert!(!alphabet.is_empty() && 256 % alphabet.len() == 0);
    random_bytes(len)
        .into_iter()
        .map(|b| alphabet[b as usize % alphabet.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length() {
        assert_eq!(random_bytes(32).len(), 32);
        assert_eq!(random_bytes(0).len(), 0);
        assert_eq!(random_bytes(64).len(), 64);
    }

    #[test]
    fn test_random_bytes_not_all_zeros() {
        let bytes = random_bytes(32);
        assert!(
            bytes.iter().any(|&b| b != 0),
            "Random bytes should not be all zeros"
        );
    }

    #[test]
    fn test_random_string_alphabet() {
        let alphabet = b"AB23";
        let s = random_string(alphabet, 100);
        assert_eq!(s.len(), 100);
        assert!(s.bytes().all(|b| alphabet.contains(&b)));
    }

    #[test]
    fn test_random_string_empty() {
        assert_eq!(random_string(b"ABCD", 0), "");
    }
}
