use std::fmt;

use serde::Serialize;

/// Build metadata captured by `build.rs`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub package_version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("REPO_VERSION"),
        package_version: env!("CARGO_PKG_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        target: option_env!("BUILD_TARGET"),
    }
}

impl BuildInfo {
    /// Emit the build as one structured startup event
    pub fn log(&self) {
        tracing::info!(
            version = self.version,
            build_profile = self.build_profile,
            rust_version = self.rust_version,
            build_target = self.target,
            "provider starting up"
        );
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tanglepaste {} ({})\nprofile: {}\nbuilt: {}\nrustc: {}",
            self.package_version,
            self.version,
            self.build_profile,
            self.build_timestamp,
            self.rust_version
        )?;
        if let Some(target) = self.target {
            write!(f, "\ntarget: {}", target)?;
        }
        Ok(())
    }
}
