//! Build metadata baked in by `build.rs`.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, built {})",
            self.version, self.build_profile, self.build_timestamp
        )
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: option_env!("REPO_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
        build_profile: option_env!("BUILD_PROFILE").unwrap_or("unknown"),
        build_timestamp: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
    }
}
