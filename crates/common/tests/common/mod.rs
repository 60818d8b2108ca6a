//! Shared test utilities for store/retrieve integration tests
#![allow(dead_code)]

use common::channel::Channel;
use common::codec::{CodecOptions, MetaData, Payload};
use common::session::Paste;
use common::transport::{Transport, TransportConfig};

/// Key stretching is irrelevant to these tests; keep it cheap
pub const TEST_ITERATIONS: u32 = 10;

pub fn paste_over<C: Channel>(channel: C, config: TransportConfig) -> Paste<C> {
    Paste::new(
        Transport::new(channel, config),
        CodecOptions {
            iterations: TEST_ITERATIONS,
        },
    )
}

pub fn sample_payload() -> Payload {
    Payload::text(
        "function hello() {\n\treturn 'world';\n}\n",
        MetaData::default(),
    )
}

/// Deterministic text that compresses poorly enough to span many fragments
pub fn noisy_source(len: usize) -> String {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            char::from(b' ' + (state % 95) as u8)
        })
        .collect()
}
