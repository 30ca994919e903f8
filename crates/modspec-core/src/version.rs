use serde::Serialize;
use std::fmt::Write;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identity, as printed by `modspec version --json`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<&'static str>,
}

#[must_use]
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: "modspec",
        version: VERSION,
        git_hash: option_env!("MODSPEC_BUILD_GIT_HASH"),
    }
}

/// Returns a formatted version string including build metadata if available.
#[must_use]
pub fn version_string() -> String {
    let info = version_info();
    let mut s = format!("{} {}", info.name, info.version);

    if let Some(hash) = info.git_hash {
        let _ = write!(s, " ({hash})");
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_contains_version() {
        let vs = version_string();
        assert!(vs.contains(VERSION));
        assert!(vs.starts_with("modspec "));
    }

    #[test]
    fn test_version_info_json() {
        let value = serde_json::to_value(version_info()).unwrap();
        assert_eq!(value["name"], "modspec");
        assert_eq!(value["version"], VERSION);
    }
}
