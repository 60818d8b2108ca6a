pub mod init;
pub mod retrieve;
pub mod serve;
pub mod store;
pub mod version;

pub use init::Init;
pub use retrieve::Retrieve;
pub use serve::Serve;
pub use store::Store;
pub use version::Version;

use common::session::SessionState;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Echo session status lines to stderr until the session settles
pub(crate) fn report_progress(mut updates: watch::Receiver<SessionState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            match state {
                SessionState::Done | SessionState::Failed(_) => break,
                other => eprintln!("{}", other.status()),
            }
        }
    })
}
