use serde::{Deserialize, Serialize};
use std::fmt;

/// Build metadata stamped in by `build.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_profile: String,
    pub build_features: String,
    pub build_timestamp: String,
    pub rust_version: String,
    pub target: String,
}

impl BuildInfo {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: option_env!("REPO_VERSION").unwrap_or("unknown").to_string(),
            build_profile: option_env!("BUILD_PROFILE")
                .unwrap_or("unknown")
                .to_string(),
            build_features: option_env!("BUILD_FEATURES").unwrap_or("none").to_string(),
            build_timestamp: option_env!("BUILD_TIMESTAMP")
                .unwrap_or("unknown")
                .to_string(),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown").to_string(),
            target: option_env!("BUILD_TARGET").unwrap_or("unknown").to_string(),
        }
    }

    pub fn is_release(&self) -> bool {
        self.build_profile == "release"
    }

    pub fn features(&self) -> Vec<&str> {
        if self.build_features == "none" {
            Vec::new()
        } else {
            self.build_features.split(',').map(|f| f.trim()).collect()
        }
    }

    pub fn short_hash(&self) -> &str {
        if self.git_hash.len() > 7 {
            &self.git_hash[..7]
        } else {
            &self.git_hash
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.git_hash.ends_with("-dirty")
    }

    /// Value sent as the `User-Agent` of every outbound backend call
    pub fn user_agent(&self) -> String {
        format!("dspm/{} ({})", self.version, self.short_hash())
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dspm {} ({}{}) {} build for {}",
            self.version,
            self.short_hash(),
            if self.is_dirty() { ", dirty" } else { "" },
            self.build_profile,
            self.target
        )
    }
}

#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo::new()
    };
}

pub fn version() -> String {
    format!(
        "{} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("REPO_VERSION").unwrap_or("unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        assert!(version().starts_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_features_list() {
        let mut info = BuildInfo::new();
        info.build_features = "clap, testkit".to_string();
        assert_eq!(info.features(), vec!["clap", "testkit"]);

        info.build_features = "none".to_string();
        assert!(info.features().is_empty());
    }

    #[test]
    fn test_short_hash_and_dirty() {
        let mut info = BuildInfo::new();
        info.git_hash = "abcdef123456-dirty".to_string();
        assert_eq!(info.short_hash(), "abcdef1");
        assert!(info.is_dirty());

        info.git_hash = "abc".to_string();
        assert_eq!(info.short_hash(), "abc");
        assert!(!info.is_dirty());
    }

    #[test]
    fn test_user_agent() {
        let mut info = BuildInfo::new();
        info.version = "1.2.3".to_string();
        info.git_hash = "0123456789".to_string();
        assert_eq!(info.user_agent(), "dspm/1.2.3 (0123456)");
    }
}
