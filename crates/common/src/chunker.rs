//! Splitting encoded text into channel-sized fragments and putting it back together.
//!
//! Channels right-pad every message with [`PADDING`] up to the slot width. Two
//! reassembly paths exist:
//! - [`join`] strips a trailing padding run from the *last* fragment only. Text that
//!   legitimately ends in the padding symbol loses those symbols. Tryte-encoded
//!   ASCII never ends that way, which is what the pipeline feeds it.
//! - [`frame`] / [`unframe`] prefix each fragment with its exact length so padding
//!   is irrelevant. The transport always frames.

use crate::trytes::{self, PADDING, RADIX};

/// Symbols used by the frame length header
pub const FRAME_HEADER_LEN: usize = 4;
/// Largest body a frame header can describe (27^4 - 1)
pub const MAX_FRAME_BODY: usize = RADIX * RADIX * RADIX * RADIX - 1;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("corrupt fragment: {0}")]
    CorruptFrame(String),
    #[error("incomplete chunk set: {0}")]
    IncompleteChunkSet(String),
}

/// One fragment of an upload together with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub index: u32,
    pub total: u32,
    pub body: String,
}

/// Partition `text` into contiguous pieces of at most `max_len` symbols
///
/// Empty input yields a single empty fragment, so `join(split(t))` holds for every `t`.
pub fn split(text: &str, max_len: usize) -> Result<Vec<String>, ChunkError> {
    if max_len == 0 {
        return Err(ChunkError::Encoding(
            "fragment length must be positive".to_string(),
        ));
    }
    if text.is_empty() {
        return Ok(vec![String::new()]);
    }

    let symbols: Vec<char> = text.chars().collect();
    Ok(symbols
        .chunks(max_len)
        .map(|chunk| chunk.iter().collect())
        .collect())
}

/// Concatenate fragments in the given order, removing channel padding from the last one
pub fn join<S: AsRef<str>>(fragments: &[S]) -> Result<String, ChunkError> {
    let Some((last, rest)) = fragments.split_last() else {
        return Err(ChunkError::Encoding("nothing to join".to_string()));
    };

    let mut out = String::with_capacity(fragments.iter().map(|f| f.as_ref().len()).sum());
    for fragment in rest {
        out.push_str(fragment.as_ref());
    }
    out.push_str(last.as_ref().trim_end_matches(PADDING));
    Ok(out)
}

/// Prefix `body` with its length in base-27 channel symbols
pub fn frame(body: &str) -> Result<String, ChunkError> {
    let len = body.chars().count();
    if len > MAX_FRAME_BODY {
        return Err(ChunkError::Encoding(format!(
            "fragment of {} symbols exceeds frame limit {}",
            len, MAX_FRAME_BODY
        )));
    }

    let mut header = [PADDING; FRAME_HEADER_LEN];
    let mut remaining = len;
    for slot in header.iter_mut().rev() {
        *slot = trytes::symbol(remaining % RADIX);
        remaining /= RADIX;
    }

    let mut out = String::with_capacity(FRAME_HEADER_LEN + body.len());
    out.extend(header);
    out.push_str(body);
    Ok(out)
}

/// Recover the body of a framed message, ignoring trailing channel padding
pub fn unframe(message: &str) -> Result<String, ChunkError> {
    let symbols: Vec<char> = message.chars().collect();
    if symbols.len() < FRAME_HEADER_LEN {
        return Err(ChunkError::CorruptFrame(format!(
            "message of {} symbols has no frame header",
            symbols.len()
        )));
    }

    let mut len = 0usize;
    for symbol in &symbols[..FRAME_HEADER_LEN] {
        let digit = trytes::digit(*symbol).ok_or_else(|| {
            ChunkError::CorruptFrame(format!("invalid header symbol {:?}", symbol))
        })?;
        len = len * RADIX + digit;
    }

    let end = FRAME_HEADER_LEN + len;
    if symbols.len() < end {
        return Err(ChunkError::CorruptFrame(format!(
            "frame declares {} symbols but carries {}",
            len,
            symbols.len() - FRAME_HEADER_LEN
        )));
    }
    if symbols[end..].iter().any(|s| *s != PADDING) {
        return Err(ChunkError::CorruptFrame(
            "unexpected data after frame body".to_string(),
        ));
    }

    Ok(symbols[FRAME_HEADER_LEN..end].iter().collect())
}

/// Sort fragments by index and check that `0..total` is covered exactly once
pub fn order(mut fragments: Vec<Fragment>) -> Result<Vec<String>, ChunkError> {
    let Some(first) = fragments.first() else {
        return Err(ChunkError::IncompleteChunkSet("no fragments".to_string()));
    };
    let total = first.total;
    if let Some(odd) = fragments.iter().find(|f| f.total != total) {
        return Err(ChunkError::IncompleteChunkSet(format!(
            "fragments disagree on total: {} vs {}",
            total, odd.total
        )));
    }

    fragments.sort_by_key(|f| f.index);

    let mut expected = 0u32;
    for fragment in &fragments {
        if fragment.index < expected {
            return Err(ChunkError::IncompleteChunkSet(format!(
                "duplicate fragment {}",
                fragment.index
            )));
        }
        if fragment.index > expected {
            return Err(ChunkError::IncompleteChunkSet(format!(
                "missing fragment {} of {}",
                expected, total
            )));
        }
        expected += 1;
    }
    if expected < total {
        return Err(ChunkError::IncompleteChunkSet(format!(
            "missing fragment {} of {}",
            expected, total
        )));
    }
    if expected > total {
        return Err(ChunkError::IncompleteChunkSet(format!(
            "fragment {} beyond declared total {}",
            expected - 1,
            total
        )));
    }

    Ok(fragments.into_iter().map(|f| f.body).collect())
}

#[cfg(test)]
mod test {
    use super::*;

    const L: usize = 5;

    fn text(len: usize) -> String {
        "ABCDEFGHIJKLMNOPQRSTUVWXYZ"
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    fn fragment(index: u32, total: u32, body: &str) -> Fragment {
        Fragment {
            index,
            total,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_chunk_boundaries() {
        for len in [0, 1, L, L + 1, 2 * L, 2 * L + 1] {
            let t = text(len);
            let pieces = split(&t, L).unwrap();
            assert!(pieces.iter().all(|p| p.len() <= L), "len {}", len);
            assert_eq!(pieces.len(), len.div_ceil(L).max(1), "len {}", len);
            assert_eq!(join(&pieces).unwrap(), t, "len {}", len);
        }
    }

    #[test]
    fn test_split_rejects_zero_length() {
        assert!(matches!(split("ABC", 0), Err(ChunkError::Encoding(_))));
    }

    #[test]
    fn test_join_rejects_empty_set() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(join(&empty), Err(ChunkError::Encoding(_))));
    }

    #[test]
    fn test_join_strips_only_trailing_padding_of_last() {
        let pieces = vec!["AB99".to_string(), "C9D".to_string(), "EF999".to_string()];
        assert_eq!(join(&pieces).unwrap(), "AB99C9DEF");
    }

    #[test]
    fn test_join_loses_legitimate_trailing_padding() {
        // this is the hazard framing exists for
        let pieces = split("ABC99", 3).unwrap();
        assert_eq!(join(&pieces).unwrap(), "ABC");
    }

    #[test]
    fn test_frame_survives_padding() {
        let body = "ABC99";
        let mut message = frame(body).unwrap();
        assert_eq!(message, "999EABC99");
        message.push_str(&"9".repeat(20));
        assert_eq!(unframe(&message).unwrap(), body);
    }

    #[test]
    fn test_frame_empty_body() {
        let message = frame("").unwrap();
        assert_eq!(message, "9999");
        assert_eq!(unframe("99999999").unwrap(), "");
    }

    #[test]
    fn test_unframe_rejects_damage() {
        assert!(matches!(unframe("99"), Err(ChunkError::CorruptFrame(_))));
        assert!(matches!(unframe("99ZZAB"), Err(ChunkError::CorruptFrame(_))));
        assert!(matches!(unframe("9!9AB"), Err(ChunkError::CorruptFrame(_))));
        assert!(matches!(
            unframe("999BABX"),
            Err(ChunkError::CorruptFrame(_))
        ));
    }

    #[test]
    fn test_frame_large_length() {
        let body = "A".repeat(2183);
        let message = frame(&body).unwrap();
        assert_eq!(message.len(), 2187);
        assert_eq!(unframe(&message).unwrap(), body);
    }

    #[test]
    fn test_order_sorts_by_index() {
        let fragments = vec![
            fragment(2, 3, "C"),
            fragment(0, 3, "A"),
            fragment(1, 3, "B"),
        ];
        assert_eq!(order(fragments).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_order_detects_gaps_and_duplicates() {
        let gap = vec![fragment(0, 3, "A"), fragment(2, 3, "C")];
        assert!(matches!(
            order(gap),
            Err(ChunkError::IncompleteChunkSet(_))
        ));

        let tail_missing = vec![fragment(0, 3, "A"), fragment(1, 3, "B")];
        assert!(matches!(
            order(tail_missing),
            Err(ChunkError::IncompleteChunkSet(_))
        ));

        let duplicate = vec![
            fragment(0, 2, "A"),
            fragment(1, 2, "B"),
            fragment(1, 2, "B"),
        ];
        assert!(matches!(
            order(duplicate),
            Err(ChunkError::IncompleteChunkSet(_))
        ));

        let beyond = vec![fragment(0, 1, "A"), fragment(1, 1, "B")];
        assert!(matches!(
            order(beyond),
            Err(ChunkError::IncompleteChunkSet(_))
        ));

        let disagree = vec![fragment(0, 2, "A"), fragment(1, 3, "B")];
        assert!(matches!(
            order(disagree),
            Err(ChunkError::IncompleteChunkSet(_))
        ));

        assert!(matches!(
            order(Vec::new()),
            Err(ChunkError::IncompleteChunkSet(_))
        ));
    }
}
