/**
 * Channel capability and its implementations.
 *  - In-memory, filesystem and HTTP provider channels
 *  - Addresses, tags and units as a ledger stores them
 */
pub mod channel;
/**
 * Splitting encoded text into slot-sized fragments
 *  and putting them back together.
 */
pub mod chunker;
/**
 * Payload serialization, compression and encryption
 *  down to a single ASCII string.
 */
pub mod codec;
/**
 * Cryptographic types and operations.
 *  - User secrets and channel secrets
 *  - Password-keyed AEAD envelope
 */
pub mod crypto;
/**
 * Store/retrieve orchestration, session state
 *  and shareable handles.
 */
pub mod session;
/**
 * Publishing fragments to a channel and
 *  collecting them in order again.
 */
pub mod transport;
pub mod trytes;

pub mod prelude {
    pub use crate::channel::{Address, Channel, ChannelError, FsChannel, HttpChannel, MemoryChannel};
    pub use crate::codec::{CodecOptions, MetaData, Payload};
    pub use crate::crypto::{ChannelSecret, Secret};
    pub use crate::session::{Handle, Paste, Session, SessionError, SessionState};
    pub use crate::transport::{ChannelMode, Transport, TransportConfig};
}
