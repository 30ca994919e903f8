use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Stable error codes surfaced to callers.
pub mod codes {
    pub const INVALID_MODULE_SPECIFIER: &str = "INVALID_MODULE_SPECIFIER";
    pub const PACKAGE_PATH_NOT_EXPORTED: &str = "PACKAGE_PATH_NOT_EXPORTED";
    pub const PACKAGE_IMPORT_NOT_DEFINED: &str = "PACKAGE_IMPORT_NOT_DEFINED";
    pub const INVALID_PACKAGE_TARGET: &str = "INVALID_PACKAGE_TARGET";
    pub const INVALID_PACKAGE_CONFIGURATION: &str = "INVALID_PACKAGE_CONFIGURATION";
    pub const UNSUPPORTED_ENGINE: &str = "UNSUPPORTED_ENGINE";
}

/// Ambient errors outside the resolution algorithm.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read options at {path}: {source}")]
    OptionsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse options at {path}: {source}")]
    OptionsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Fatal resolution errors.
///
/// Every variant is a deterministic function of the specifier, the package
/// descriptors and the options; none of them are worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Module specifier '{specifier}' is invalid: {reason}")]
    InvalidModuleSpecifier { specifier: String, reason: String },

    #[error("Package subpath '{subpath}' is not defined by \"exports\" in {package_url}")]
    PackagePathNotExported { subpath: String, package_url: Url },

    #[error("Package import specifier '{specifier}' is not defined in {parent_url}")]
    PackageImportNotDefined { specifier: String, parent_url: Url },

    #[error("Invalid package target '{target}' defined in {package_url}")]
    InvalidPackageTarget { target: String, package_url: Url },

    #[error("Invalid package configuration in {package_url}: {reason}")]
    InvalidPackageConfiguration { package_url: Url, reason: String },

    #[error("Package at {package_url} requires {engine} '{range}' but {version} was supplied")]
    UnsupportedEngine {
        package_url: Url,
        engine: String,
        range: String,
        version: String,
    },
}

impl ResolveError {
    pub(crate) fn invalid_specifier(specifier: &str, reason: impl Into<String>) -> Self {
        Self::InvalidModuleSpecifier {
            specifier: specifier.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidModuleSpecifier { .. } => codes::INVALID_MODULE_SPECIFIER,
            Self::PackagePathNotExported { .. } => codes::PACKAGE_PATH_NOT_EXPORTED,
            Self::PackageImportNotDefined { .. } => codes::PACKAGE_IMPORT_NOT_DEFINED,
            Self::InvalidPackageTarget { .. } => codes::INVALID_PACKAGE_TARGET,
            Self::InvalidPackageConfiguration { .. } => codes::INVALID_PACKAGE_CONFIGURATION,
            Self::UnsupportedEngine { .. } => codes::UNSUPPORTED_ENGINE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_variants() {
        let url = Url::parse("file:///a/b/").unwrap();

        let err = ResolveError::invalid_specifier("@s", "scoped name without '/'");
        assert_eq!(err.code(), codes::INVALID_MODULE_SPECIFIER);

        let err = ResolveError::PackagePathNotExported {
            subpath: "./g".to_string(),
            package_url: url.clone(),
        };
        assert_eq!(err.code(), "PACKAGE_PATH_NOT_EXPORTED");

        let err = ResolveError::UnsupportedEngine {
            package_url: url,
            engine: "node".to_string(),
            range: ">=20".to_string(),
            version: "18.0.0".to_string(),
        };
        assert_eq!(err.code(), "UNSUPPORTED_ENGINE");
    }

    #[test]
    fn test_message_names_offender() {
        let err = ResolveError::PackageImportNotDefined {
            specifier: "#f".to_string(),
            parent_url: Url::parse("file:///a/b/d/").unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#f"));
        assert!(msg.contains("file:///a/b/d/"));
    }
}
