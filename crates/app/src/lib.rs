// Library exports for the `paste` binary and integration tests

// HTTP channel provider
pub mod http_server;
// Logging bootstrap and provider process lifecycle
pub mod process;
pub mod state;
pub mod version;

pub use process::{init_logging, spawn_provider};
pub use state::{AppConfig, AppState, ChannelBackend, StateError};
pub use version::build_info;
