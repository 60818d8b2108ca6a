//! The channel alphabet
//!
//! Ledger messages are strings over 27 symbols: the padding symbol `9`
//! followed by `A` to `Z`. Arbitrary bytes are carried two symbols per byte,
//! low digit first, so `b` becomes `ALPHABET[b % 27]` then `ALPHABET[b / 27]`.
//! For printable ASCII the high digit is never zero, which means an encoded
//! text can never end in the padding symbol.

/// The 27 channel symbols, in digit order
pub const ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// The symbol a channel uses to fill unused message space
pub const PADDING: char = '9';
/// Number of symbols in the alphabet
pub const RADIX: usize = 27;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TryteError {
    #[error("tryte string has odd length {0}")]
    OddLength(usize),
    #[error("invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { symbol: char, position: usize },
    #[error("tryte pair at position {0} does not encode a byte")]
    OutOfRange(usize),
}

/// Digit value of a channel symbol
pub fn digit(symbol: char) -> Option<usize> {
    match symbol {
        '9' => Some(0),
        'A'..='Z' => Some(symbol as usize - 'A' as usize + 1),
        _ => None,
    }
}

/// Channel symbol for a digit in `0..27`
pub fn symbol(digit: usize) -> char {
    ALPHABET[digit % RADIX] as char
}

/// Whether every character of `s` belongs to the channel alphabet
pub fn is_trytes(s: &str) -> bool {
    s.chars().all(|c| digit(c).is_some())
}

/// Encode arbitrary bytes as channel symbols
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let value = *b as usize;
        out.push(symbol(value % RADIX));
        out.push(symbol(value / RADIX));
    }
    out
}

/// Decode channel symbols produced by [`encode`]
pub fn decode(trytes: &str) -> Result<Vec<u8>, TryteError> {
    let symbols: Vec<char> = trytes.chars().collect();
    if symbols.len() % 2 != 0 {
        return Err(TryteError::OddLength(symbols.len()));
    }

    let mut out = Vec::with_capacity(symbols.len() / 2);
    for (pair, chunk) in symbols.chunks(2).enumerate() {
        let position = pair * 2;
        let low = digit(chunk[0]).ok_or(TryteError::InvalidSymbol {
            symbol: chunk[0],
            position,
        })?;
        let high = digit(chunk[1]).ok_or(TryteError::InvalidSymbol {
            symbol: chunk[1],
            position: position + 1,
        })?;
        let value = low + high * RADIX;
        if value > u8::MAX as usize {
            return Err(TryteError::OutOfRange(position));
        }
        out.push(value as u8);
    }
    Ok(out)
}

/// Map digest bytes onto channel symbols, one symbol per byte
pub fn from_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| symbol(*b as usize)).collect()
}
