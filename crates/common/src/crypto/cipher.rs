//! Password-based authenticated encryption
//!
//! Keys are derived with PBKDF2-HMAC-SHA256 from the session [`Secret`] and a fresh
//! random salt, then used with ChaCha20-Poly1305. The envelope is
//! `version (1) || iterations (4, BE) || salt (32) || nonce (12) || ciphertext || tag (16)`,
//! and the header is bound to the ciphertext as associated data, so changing any
//! header byte fails authentication exactly like changing the ciphertext.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use sha2::Sha256;

use super::Secret;

/// Current envelope version
pub const ENVELOPE_VERSION: u8 = 1;
/// Size of the random key-derivation salt in bytes
pub const SALT_SIZE: usize = 32;
/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the derived ChaCha20-Poly1305 key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;
/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;
/// Size of the authenticated envelope header
pub const HEADER_SIZE: usize = 1 + 4 + SALT_SIZE + NONCE_SIZE;
/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("failed to gather randomness: {0}")]
    Random(String),
    #[error("key derivation needs at least one iteration")]
    Iterations,
    #[error("envelope too short: {0} bytes")]
    Truncated(usize),
    #[error("unsupported envelope version {0}")]
    Version(u8),
    #[error("encrypt error")]
    Encrypt,
    #[error("decryption failed: wrong secret or tampered data")]
    Decrypt,
}

fn derive_key(secret: &Secret, salt: &[u8], iterations: u32) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, iterations, &mut key);
    key
}

fn random_bytes<const N: usize>() -> Result<[u8; N], CipherError> {
    let mut buff = [0u8; N];
    getrandom::getrandom(&mut buff).map_err(|e| CipherError::Random(e.to_string()))?;
    Ok(buff)
}

/// Encrypt `plaintext` under `secret`
///
/// A new salt and nonce are drawn for every call, so sealing the same plaintext
/// twice never yields the same envelope.
pub fn seal(secret: &Secret, plaintext: &[u8], iterations: u32) -> Result<Vec<u8>, CipherError> {
    if iterations == 0 {
        return Err(CipherError::Iterations);
    }

    let salt = random_bytes::<SALT_SIZE>()?;
    let nonce_bytes = random_bytes::<NONCE_SIZE>()?;

    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.push(ENVELOPE_VERSION);
    header.extend_from_slice(&iterations.to_be_bytes());
    header.extend_from_slice(&salt);
    header.extend_from_slice(&nonce_bytes);

    let key = derive_key(secret, &salt, iterations);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|_| CipherError::Encrypt)?;

    let mut out = header;
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt an envelope produced by [`seal`]
pub fn open(secret: &Secret, envelope: &[u8]) -> Result<Vec<u8>, CipherError> {
    if envelope.len() < HEADER_SIZE + TAG_SIZE {
        return Err(CipherError::Truncated(envelope.len()));
    }

    let (header, ciphertext) = envelope.split_at(HEADER_SIZE);
    if header[0] != ENVELOPE_VERSION {
        return Err(CipherError::Version(header[0]));
    }

    let mut iterations = [0u8; 4];
    iterations.copy_from_slice(&header[1..5]);
    let iterations = u32::from_be_bytes(iterations);
    if iterations == 0 {
        return Err(CipherError::Iterations);
    }

    let salt = &header[5..5 + SALT_SIZE];
    let nonce = &header[5 + SALT_SIZE..];

    let key = derive_key(secret, salt, iterations);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| CipherError::Decrypt)
}

#[cfg(test)]
mod test {
    use super::*;

    const TEST_ITERATIONS: u32 = 10;

    fn secret(s: &str) -> Secret {
        Secret::new(s).unwrap()
    }

    #[test]
    fn test_seal_open() {
        let secret = Secret::generate();
        let data = b"hello world, this is a test message for encryption";

        let sealed = seal(&secret, data, TEST_ITERATIONS).unwrap();
        assert_eq!(sealed.len(), HEADER_SIZE + data.len() + TAG_SIZE);

        let opened = open(&secret, &sealed).unwrap();
        assert_eq!(opened, data.to_vec());
    }

    #[test]
    fn test_fresh_salt_and_nonce() {
        let secret = secret("ABC123");
        let a = seal(&secret, b"same", TEST_ITERATIONS).unwrap();
        let b = seal(&secret, b"same", TEST_ITERATIONS).unwrap();
        assert_ne!(a[5..HEADER_SIZE], b[5..HEADER_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sealed = seal(&secret("ABC123"), b"console.log(1)", TEST_ITERATIONS).unwrap();
        assert_eq!(open(&secret("WRONG1"), &sealed), Err(CipherError::Decrypt));
    }

    #[test]
    fn test_tampering_fails() {
        let secret = secret("ABC123");
        let sealed = seal(&secret, b"payload", TEST_ITERATIONS).unwrap();

        let mut body = sealed.clone();
        body[HEADER_SIZE + 2] ^= 0xFF;
        assert_eq!(open(&secret, &body), Err(CipherError::Decrypt));

        // the iteration count is authenticated too
        let mut header = sealed.clone();
        header[4] ^= 0x01;
        assert_eq!(open(&secret, &header), Err(CipherError::Decrypt));

        let mut version = sealed;
        version[0] = 9;
        assert_eq!(open(&secret, &version), Err(CipherError::Version(9)));
    }

    #[test]
    fn test_truncated_envelope() {
        let secret = secret("ABC123");
        assert_eq!(open(&secret, &[1, 2, 3]), Err(CipherError::Truncated(3)));
    }

    #[test]
    fn test_empty_plaintext() {
        let secret = Secret::generate();
        let sealed = seal(&secret, b"", TEST_ITERATIONS).unwrap();
        assert!(open(&secret, &sealed).unwrap().is_empty());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert_eq!(
            seal(&Secret::generate(), b"x", 0),
            Err(CipherError::Iterations)
        );
    }
}
