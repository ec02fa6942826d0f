//! Visit secrets
//!
//! Tokens and session ids come from the OS CSPRNG. The verification code is
//! six digits for humans to type and only gates read access.

use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

use crate::utils::AppError;

/// 256-bit visit token → 64 hex chars
const VISIT_TOKEN_BYTES: usize = 32;
/// Session ids are customer-facing: 128 bits as well
const SESSION_ID_BYTES: usize = 16;

const CODE_MIN: u32 = 100_000;
const CODE_SPAN: u32 = 900_000;

fn random_bytes(rng: &SystemRandom, len: usize) -> Result<Vec<u8>, AppError> {
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| AppError::internal("Secure random generator unavailable"))?;
    Ok(buf)
}

/// Fresh visit token (hex)
pub fn visit_token(rng: &SystemRandom) -> Result<String, AppError> {
    random_bytes(rng, VISIT_TOKEN_BYTES).map(hex::encode)
}

/// Fresh device session id (hex)
pub fn session_id(rng: &SystemRandom) -> Result<String, AppError> {
    random_bytes(rng, SESSION_ID_BYTES).map(hex::encode)
}

/// Fresh 6-digit verification code, uniform over 100000..=999999
pub fn verification_code(rng: &SystemRandom) -> Result<String, AppError> {
    // Rejection sampling keeps the distribution uniform
    let zone = u32::MAX - (u32::MAX % CODE_SPAN);
    loop {
        let mut bytes = [0u8; 4];
        rng.fill(&mut bytes)
            .map_err(|_| AppError::internal("Secure random generator unavailable"))?;
        let n = u32::from_le_bytes(bytes);
        if n < zone {
            return Ok((CODE_MIN + n % CODE_SPAN).to_string());
        }
    }
}

/// Compare two secrets without short-circuiting on the first differing byte.
/// Lengths are not secret: a length mismatch returns false immediately.
pub fn secrets_match(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_shape() {
        let rng = SystemRandom::new();
        let token = visit_token(&rng).unwrap();
        assert_eq!(token.len(), VISIT_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, visit_token(&rng).unwrap());
    }

    #[test]
    fn test_code_is_six_digits() {
        let rng = SystemRandom::new();
        let codes: HashSet<String> = (0..200).map(|_| verification_code(&rng).unwrap()).collect();
        for code in &codes {
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
        assert!(codes.len() > 150);
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
        assert!(!secrets_match("ABC", "abc"));
        assert!(!secrets_match("", "abc"));
    }
}
