//! Package scope discovery.

use super::conditions::condition_matches;
use super::options::ResolveOptions;
use super::specifier::is_windows_drive_letter;
use super::target::Target;
use url::Url;

/// Override keys naming the scope descriptor for a URL, in priority order.
const SCOPE_OVERRIDE_KEYS: [&str; 2] = ["#package", "bare:package"];

/// List the `package.json` URLs that may define the package scope of `url`,
/// nearest first.
///
/// An override registered for `url` in `resolutions` replaces the walk.
/// Otherwise the walk drops one path segment at a time and stops at a
/// `node_modules` boundary (exclusive), the root, or a bare drive root.
#[must_use]
pub fn lookup_package_scope(url: &Url, options: &ResolveOptions) -> Vec<Url> {
    if let Some(map) = options.resolutions.get(url.as_str()) {
        let overridden = SCOPE_OVERRIDE_KEYS
            .iter()
            .filter_map(|key| map.get(key))
            .find_map(|target| static_target(url, target, options.conditions.as_sets()));

        if let Some(package_json_url) = overridden {
            return vec![package_json_url];
        }
    }

    if url.cannot_be_a_base() {
        return Vec::new();
    }

    let mut scopes = Vec::new();
    let mut scope = url.clone();

    loop {
        let Ok(package_json_url) = scope.join("package.json") else {
            break;
        };

        if package_json_url.path().ends_with("/node_modules/package.json") {
            break;
        }
        scopes.push(package_json_url);

        let path = scope.path().to_string();
        let Some(cut) = path.rfind('/') else {
            break;
        };
        let trimmed = &path[..cut];

        if trimmed.is_empty() || trimmed.get(1..).is_some_and(is_windows_drive_letter) {
            break;
        }
        scope.set_path(trimmed);
    }

    scopes
}

/// Evaluate an override target without suspending: the first leaf reachable
/// through declared order and the condition sets, tried in order.
fn static_target(base: &Url, target: &Target, conditions: &[Vec<String>]) -> Option<Url> {
    match target {
        Target::Leaf(leaf) => base.join(leaf).ok(),
        Target::List(items) => items
            .iter()
            .find_map(|item| static_target(base, item, conditions)),
        Target::Conditional(map) => condition_matches(map, conditions)
            .find_map(|(_, target, set)| static_target(base, target, set)),
    }
}
