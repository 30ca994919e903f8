//! Engine compatibility checks.
//!
//! Packages declare engine ranges in npm syntax (`">=18 <21 || ^22"`), which
//! is wider than what `semver::VersionReq` accepts, so ranges are rewritten
//! before matching.

use crate::error::ResolveError;
use semver::{Version, VersionReq};
use std::collections::BTreeMap;
use url::Url;

/// Check every engine declared by a package against the supplied versions.
///
/// Engines the caller did not supply are ignored.
///
/// # Errors
/// Returns `UNSUPPORTED_ENGINE` for the first declared range the supplied
/// version does not satisfy.
pub fn validate_engines(
    package_url: &Url,
    declared: &BTreeMap<String, String>,
    supplied: &BTreeMap<String, String>,
) -> Result<(), ResolveError> {
    for (engine, range) in declared {
        let Some(version) = supplied.get(engine) else {
            continue;
        };

        if !satisfies(version, range) {
            return Err(ResolveError::UnsupportedEngine {
                package_url: package_url.clone(),
                engine: engine.clone(),
                range: range.clone(),
                version: version.clone(),
            });
        }
    }

    Ok(())
}

/// Whether `version` satisfies the npm-style `range`.
///
/// Unparseable versions or ranges never satisfy.
#[must_use]
pub fn satisfies(version: &str, range: &str) -> bool {
    let version = version.trim();
    let Ok(version) = Version::parse(version.strip_prefix('v').unwrap_or(version)) else {
        return false;
    };

    range
        .split("||")
        .map(str::trim)
        .filter_map(parse_range)
        .any(|req| req.matches(&version))
}

/// Parse a single range alternative, handling npm-specific syntax.
///
/// Handles:
/// - Standard semver ranges: ^1.0.0, ~1.0.0, >=1.0.0, etc.
/// - Hyphen ranges: 1.0.0 - 2.0.0
/// - X-ranges: 1.x, 1.0.x, *
/// - Space-separated comparators: >= 2.1.2 < 3.0.0
/// - Exact versions: 1.2.3 means =1.2.3, not ^1.2.3
///
/// `None` for ranges that cannot match anything.
fn parse_range(range: &str) -> Option<VersionReq> {
    let range = range.trim();

    if range.is_empty() {
        return Some(VersionReq::STAR);
    }

    if let Some((start, end)) = parse_hyphen_range(range) {
        return VersionReq::parse(&format!(">={start}, <={end}")).ok();
    }

    if range.contains(['x', 'X']) || range == "*" {
        return VersionReq::parse(&convert_x_range(range)?).ok();
    }

    let converted = convert_space_separated_comparators(range);
    let pinned = converted
        .split(", ")
        .map(pin_exact)
        .collect::<Vec<_>>()
        .join(", ");

    VersionReq::parse(&pinned).ok()
}

/// `1.0.0 - 2.0.0`
fn parse_hyphen_range(range: &str) -> Option<(&str, &str)> {
    let (start, end) = range.split_once(" - ")?;
    let (start, end) = (start.trim(), end.trim());
    (!start.is_empty() && !end.is_empty() && !end.contains(" - ")).then_some((start, end))
}

/// `>= 2.1.2 < 3.0.0` becomes `>=2.1.2, <3.0.0`.
fn convert_space_separated_comparators(range: &str) -> String {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();

    for token in range.split_whitespace() {
        if token_has_version(token) {
            comparators.push(format!("{pending_op}{token}"));
            pending_op.clear();
        } else {
            // Operator separated from its version by a space.
            pending_op.push_str(token);
        }
    }

    if !pending_op.is_empty() {
        comparators.push(pending_op);
    }

    comparators.join(", ")
}

fn token_has_version(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

/// A bare full version is exact in npm but caret in `semver`.
fn pin_exact(comparator: &str) -> String {
    let comparator = comparator.strip_prefix('v').unwrap_or(comparator);
    if comparator.starts_with(|c: char| c.is_ascii_digit()) && comparator.split('.').count() >= 3 {
        format!("={comparator}")
    } else {
        comparator.to_string()
    }
}

/// `1.x` becomes `>=1.0.0, <2.0.0`. `None` when the upper bound overflows.
fn convert_x_range(range: &str) -> Option<String> {
    if range == "*" || range == "x" || range == "X" {
        return Some(">=0.0.0".to_string());
    }

    let parts: Vec<&str> = range.split('.').collect();

    match parts.as_slice() {
        [major, "x" | "X" | "*"] | [major, "x" | "X" | "*", "x" | "X" | "*"] => {
            if let Ok(m) = major.parse::<u64>() {
                return Some(format!(">={m}.0.0, <{}.0.0", m.checked_add(1)?));
            }
        }
        [major, minor, "x" | "X" | "*"] => {
            if let (Ok(m), Ok(n)) = (major.parse::<u64>(), minor.parse::<u64>()) {
                return Some(format!(">={m}.{n}.0, <{m}.{}.0", n.checked_add(1)?));
            }
        }
        _ => {}
    }

    Some(range.replace(['x', 'X'], "0"))
}
