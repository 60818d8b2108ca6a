//! Payload codec
//!
//! Write path: JSON -> gzip -> AEAD envelope -> URL-safe base64.
//! Read path runs the same steps backwards. The base64 text is what the
//! transport turns into channel symbols.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crypto::{self, Secret, DEFAULT_ITERATIONS};

mod compression;
mod payload;

pub use compression::{compress, decompress, CompressionError};
pub use payload::{
    MetaData, Payload, DEFAULT_FONT_SIZE, DEFAULT_MODE, DEFAULT_TAB_SIZE, DEFAULT_THEME,
    FONT_SIZES, MODES, TAB_SIZES, THEMES,
};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload could not be serialized or compressed
    #[error("encoding error: {0}")]
    Encoding(String),
    /// Decoding, decryption, decompression or parsing failed
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),
}

/// Writer-side knobs; readers recover them from the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// PBKDF2 iteration count
    pub iterations: u32,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Serialize, compress, encrypt and text-encode a value
pub fn encode<T: Serialize>(
    value: &T,
    secret: &Secret,
    options: &CodecOptions,
) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value).map_err(|e| CodecError::Encoding(e.to_string()))?;
    let compressed = compress(&json).map_err(|e| CodecError::Encoding(e.to_string()))?;
    let sealed = crypto::seal(secret, &compressed, options.iterations)
        .map_err(|e| CodecError::Encoding(e.to_string()))?;

    tracing::debug!(
        json_bytes = json.len(),
        compressed_bytes = compressed.len(),
        sealed_bytes = sealed.len(),
        "encoded payload"
    );

    Ok(URL_SAFE_NO_PAD.encode(sealed))
}

/// Invert [`encode`]
pub fn decode<T: DeserializeOwned>(text: &str, secret: &Secret) -> Result<T, CodecError> {
    let sealed = URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| CodecError::CorruptPayload(format!("base64: {}", e)))?;
    let compressed =
        crypto::open(secret, &sealed).map_err(|e| CodecError::CorruptPayload(e.to_string()))?;
    let json = decompress(&compressed).map_err(|e| CodecError::CorruptPayload(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| CodecError::CorruptPayload(format!("json: {}", e)))
}
