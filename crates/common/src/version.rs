use std::fmt;

use serde::Serialize;

/// Build metadata baked in by `build.rs`
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub package_version: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        version: env!("REPO_VERSION"),
        package_version: env!("CARGO_PKG_VERSION"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "secretfs {} ({}, profile={}, features={}, built {})",
            self.package_version,
            self.version,
            self.build_profile,
            self.build_features,
            self.build_timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_package_version() {
        let info = build_info();
        let rendered = info.to_string();
        assert!(rendered.starts_with("secretfs "));
        assert!(rendered.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_serializes_every_field() {
        let value = serde_json::to_value(build_info()).unwrap();
        for key in [
            "build_profile",
            "build_features",
            "build_timestamp",
            "version",
            "package_version",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
