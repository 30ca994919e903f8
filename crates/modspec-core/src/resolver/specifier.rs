//! Specifier classification and package specifier parsing.

use crate::error::ResolveError;
use std::borrow::Cow;
use url::Url;

/// The shape of a module specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `/x`
    AbsolutePath,
    /// `.`, `..`, `./x`, `../x`
    RelativePath,
    /// `name`, `name/sub`, `@scope/name/sub`
    BareSpecifier,
    /// `#x`
    PrivateImport,
    /// Anything that parses as an absolute URL, e.g. `node:fs`.
    UrlLiteral,
    /// `C:/x` or `C:\x`
    WindowsPath,
}

impl SpecifierKind {
    /// Classify a specifier. Total and pure.
    #[must_use]
    pub fn of(specifier: &str) -> Self {
        if starts_with_windows_drive_letter(specifier) {
            Self::WindowsPath
        } else if specifier.starts_with('/') {
            Self::AbsolutePath
        } else if is_relative_path(specifier) {
            Self::RelativePath
        } else if specifier.starts_with('#') {
            Self::PrivateImport
        } else if Url::parse(specifier).is_ok() {
            Self::UrlLiteral
        } else {
            Self::BareSpecifier
        }
    }
}

impl std::fmt::Display for SpecifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AbsolutePath => "absolute",
            Self::RelativePath => "relative",
            Self::BareSpecifier => "bare",
            Self::PrivateImport => "private_import",
            Self::UrlLiteral => "url",
            Self::WindowsPath => "windows_path",
        };
        write!(f, "{s}")
    }
}

fn is_relative_path(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Whether a specifier or target should be resolved as a path against its base.
pub(crate) fn is_path_like(specifier: &str) -> bool {
    specifier.starts_with('/') || is_relative_path(specifier)
}

/// `C:` exactly.
#[must_use]
pub fn is_windows_drive_letter(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && (bytes[1] == b':' || bytes[1] == b'|')
}

/// `C:`, `C:/...` or `C:\...`.
#[must_use]
pub fn starts_with_windows_drive_letter(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() >= 2
        && is_windows_drive_letter(&input[..2])
        && (bytes.len() == 2 || matches!(bytes[2], b'/' | b'\\' | b'?' | b'#'))
}

/// Rewrite a leading drive letter into a path-absolute specifier.
pub(crate) fn normalize_windows_path(specifier: &str) -> Cow<'_, str> {
    if starts_with_windows_drive_letter(specifier) {
        Cow::Owned(format!("/{specifier}"))
    } else {
        Cow::Borrowed(specifier)
    }
}

/// Whether a name carries a percent-encoded `/` or `\`.
pub(crate) fn has_encoded_separator(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("%2f") || lower.contains("%5c")
}

/// A bare specifier split into its package name and subpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpecifier<'a> {
    /// `name` or `@scope/name`, including any `@version` suffix.
    pub name: &'a str,
    /// `.` followed by the remainder of the specifier.
    pub subpath: String,
}

impl<'a> PackageSpecifier<'a> {
    /// Split a bare specifier.
    ///
    /// # Errors
    /// Returns `INVALID_MODULE_SPECIFIER` for empty specifiers, scoped names
    /// without a `/`, and names starting with `.` or containing `\` or `%`.
    pub fn parse(specifier: &'a str) -> Result<Self, ResolveError> {
        if specifier.is_empty() {
            return Err(ResolveError::invalid_specifier(
                specifier,
                "specifier is empty",
            ));
        }

        let name = if specifier.starts_with('@') {
            let Some(scope_end) = specifier.find('/') else {
                return Err(ResolveError::invalid_specifier(
                    specifier,
                    "scoped package name must contain '/'",
                ));
            };
            match specifier[scope_end + 1..].find('/') {
                Some(end) => &specifier[..scope_end + 1 + end],
                None => specifier,
            }
        } else {
            specifier.split('/').next().unwrap_or(specifier)
        };

        if name.starts_with('.') || name.contains('\\') || name.contains('%') {
            return Err(ResolveError::invalid_specifier(
                specifier,
                "not a valid package name",
            ));
        }

        Ok(Self {
            name,
            subpath: format!(".{}", &specifier[name.len()..]),
        })
    }
}

/// Split `name@version`, ignoring a leading scope `@`.
pub(crate) fn split_version(name: &str) -> (&str, Option<&str>) {
    match name.get(1..).and_then(|rest| rest.rfind('@')) {
        Some(i) if !name[i + 2..].is_empty() => (&name[..=i], Some(&name[i + 2..])),
        Some(i) => (&name[..=i], None),
        None => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(SpecifierKind::of("/d"), SpecifierKind::AbsolutePath);
        assert_eq!(SpecifierKind::of("."), SpecifierKind::RelativePath);
        assert_eq!(SpecifierKind::of(".."), SpecifierKind::RelativePath);
        assert_eq!(SpecifierKind::of("./d"), SpecifierKind::RelativePath);
        assert_eq!(SpecifierKind::of("../d"), SpecifierKind::RelativePath);
        assert_eq!(SpecifierKind::of("#e"), SpecifierKind::PrivateImport);
        assert_eq!(SpecifierKind::of("node:fs"), SpecifierKind::UrlLiteral);
        assert_eq!(SpecifierKind::of("https://x.y/z.js"), SpecifierKind::UrlLiteral);
        assert_eq!(SpecifierKind::of("C:/d"), SpecifierKind::WindowsPath);
        assert_eq!(SpecifierKind::of("C:\\d"), SpecifierKind::WindowsPath);
        assert_eq!(SpecifierKind::of("d"), SpecifierKind::BareSpecifier);
        assert_eq!(SpecifierKind::of("@s/d/e"), SpecifierKind::BareSpecifier);
        assert_eq!(SpecifierKind::of(".d"), SpecifierKind::BareSpecifier);
    }

    #[test]
    fn test_normalized_drive_letter_is_absolute() {
        for specifier in ["C:/d", "C:\\d", "c:"] {
            let normalized = normalize_windows_path(specifier);
            assert_eq!(SpecifierKind::of(&normalized), SpecifierKind::AbsolutePath);
            assert!(is_path_like(&normalized));
        }
        assert_eq!(normalize_windows_path("d"), "d");
    }

    #[test]
    fn test_windows_drive_letter() {
        assert!(is_windows_drive_letter("c:"));
        assert!(!is_windows_drive_letter("c:/"));
        assert!(!is_windows_drive_letter("1:"));
        assert!(starts_with_windows_drive_letter("c:"));
        assert!(starts_with_windows_drive_letter("C:\\x"));
        assert!(!starts_with_windows_drive_letter("cd:/x"));
        assert!(!starts_with_windows_drive_letter("c:x"));
        assert_eq!(normalize_windows_path("C:/d"), "/C:/d");
        assert_eq!(normalize_windows_path("./d"), "./d");
    }

    #[test]
    fn test_parse_package_specifier() {
        let spec = PackageSpecifier::parse("d").unwrap();
        assert_eq!(spec.name, "d");
        assert_eq!(spec.subpath, ".");

        let spec = PackageSpecifier::parse("d/e/f.js").unwrap();
        assert_eq!(spec.name, "d");
        assert_eq!(spec.subpath, "./e/f.js");

        let spec = PackageSpecifier::parse("@s/d").unwrap();
        assert_eq!(spec.name, "@s/d");
        assert_eq!(spec.subpath, ".");

        let spec = PackageSpecifier::parse("@s/d/e").unwrap();
        assert_eq!(spec.name, "@s/d");
        assert_eq!(spec.subpath, "./e");

        let spec = PackageSpecifier::parse("d/").unwrap();
        assert_eq!(spec.subpath, "./");
    }

    #[test]
    fn test_parse_package_specifier_invalid() {
        for specifier in ["", "@s", "@s/d\\", "@s/d%", ".d", "d%2f"] {
            let err = PackageSpecifier::parse(specifier).unwrap_err();
            assert_eq!(err.code(), "INVALID_MODULE_SPECIFIER", "{specifier}");
        }
    }

    #[test]
    fn test_split_version() {
        assert_eq!(split_version("d"), ("d", None));
        assert_eq!(split_version("d@1.2.3"), ("d", Some("1.2.3")));
        assert_eq!(split_version("@s/d"), ("@s/d", None));
        assert_eq!(split_version("@s/d@1"), ("@s/d", Some("1")));
        assert_eq!(split_version("d@"), ("d", None));
    }

    #[test]
    fn test_encoded_separator() {
        assert!(has_encoded_separator("./d%2fe"));
        assert!(has_encoded_separator("./d%2Fe"));
        assert!(has_encoded_separator("./d%5ce"));
        assert!(has_encoded_separator("./d%5Ce"));
        assert!(!has_encoded_separator("./d%20e"));
    }
}
