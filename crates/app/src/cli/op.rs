use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::error::Elapsed;

use tanglepaste::state::AppState;

/// Resolve the log level for this invocation.
///
/// Priority: config file `log_level` > info. `RUST_LOG` still wins over both.
pub fn resolve_log_level(config_path: Option<PathBuf>) -> tracing::Level {
    match AppState::load(config_path) {
        Ok(state) => state.config.log_level(),
        Err(_) => tracing::Level::INFO,
    }
}

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.tanglepaste)
    pub config_path: Option<PathBuf>,
    /// Deadline for a single store or retrieve
    pub timeout: Duration,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            config_path,
            timeout,
        }
    }

    pub fn load_state(&self) -> Result<AppState, tanglepaste::StateError> {
        AppState::load(self.config_path.clone())
    }

    /// Run `fut` under the caller deadline
    pub async fn with_deadline<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        tokio::time::timeout(self.timeout, fut).await
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
