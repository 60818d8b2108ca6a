//! Cryptographic primitives for tanglepaste
//!
//! - **Secrets**: the payload [`Secret`] a reader needs to decrypt, and the
//!   independent [`ChannelSecret`] used for addressing and restricted retrieval
//! - **Encryption**: PBKDF2-HMAC-SHA256 key derivation with a per-upload random
//!   salt, then ChaCha20-Poly1305 so a wrong secret or a tampered fragment is an
//!   explicit failure instead of garbage

pub mod cipher;
mod secret;

pub use cipher::{open, seal, CipherError, DEFAULT_ITERATIONS};
pub use secret::{ChannelSecret, Secret, SecretError, SECRET_LENGTH};
