//! `exports`/`imports` matching and target evaluation.

use super::conditions::condition_matches;
use super::coroutine::Status;
use super::pattern::{is_expansion_key, match_expansion_key, pattern_key_compare, substitute};
use super::resolve::{Ctx, Outcome};
use super::specifier::is_path_like;
use super::target::{is_numeric_key, ExportsField, Target, TargetMap};
use crate::error::ResolveError;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use url::Url;

impl Ctx<'_> {
    /// Resolve `subpath` through a package's `exports` field.
    ///
    /// # Errors
    /// `PACKAGE_PATH_NOT_EXPORTED` when nothing in the field produces a
    /// candidate for the subpath.
    pub(crate) async fn package_exports(
        &self,
        package_url: &Url,
        subpath: &str,
        exports: &Target,
    ) -> Outcome {
        let field = ExportsField::classify(exports);

        if subpath == "." {
            if let Some(main) = field.main() {
                let status = self
                    .package_target(package_url, main, None, false, self.conditions())
                    .await?;
                if !status.is_unresolved() {
                    return Ok(status);
                }
            }
        } else if let ExportsField::Subpaths(map) = field {
            let status = self
                .package_imports_exports(subpath, map, package_url, false)
                .await?;
            if !status.is_unresolved() {
                return Ok(status);
            }
        }

        Err(ResolveError::PackagePathNotExported {
            subpath: subpath.to_string(),
            package_url: package_url.clone(),
        })
    }

    /// Match `match_key` against an `exports` subpath map or an `imports` map.
    ///
    /// An exact key wins outright. Otherwise the most specific matching
    /// expansion key is used, and its result is final.
    pub(crate) async fn package_imports_exports(
        &self,
        match_key: &str,
        map: &TargetMap,
        package_url: &Url,
        is_imports: bool,
    ) -> Outcome {
        if !match_key.contains('*') {
            if let Some(target) = map.get(match_key) {
                return self
                    .package_target(package_url, target, None, is_imports, self.conditions())
                    .await;
            }
        }

        let mut expansion_keys: Vec<(&str, &Target)> =
            map.iter().filter(|(key, _)| is_expansion_key(key)).collect();
        expansion_keys.sort_by(|(a, _), (b, _)| pattern_key_compare(a, b));

        for (key, target) in expansion_keys {
            if let Some(pattern_match) = match_expansion_key(key, match_key) {
                return self
                    .package_target(
                        package_url,
                        target,
                        Some(pattern_match),
                        is_imports,
                        self.conditions(),
                    )
                    .await;
            }
        }

        Ok(Status::Unresolved)
    }

    /// Evaluate a target tree.
    ///
    /// Lists stop at the first item that produces anything. A conditional map
    /// commits to the first key each condition set selects, and the sets are
    /// tried in order until one resolves.
    pub(crate) fn package_target<'s>(
        &'s self,
        package_url: &'s Url,
        target: &'s Target,
        pattern_match: Option<&'s str>,
        is_imports: bool,
        conditions: &'s [Vec<String>],
    ) -> LocalBoxFuture<'s, Outcome> {
        async move {
            match target {
                Target::Leaf(leaf) => {
                    let leaf = match pattern_match {
                        Some(pattern_match) => substitute(leaf, pattern_match),
                        None => leaf.clone(),
                    };

                    if !is_imports && !leaf.starts_with("./") {
                        return Err(ResolveError::InvalidPackageTarget {
                            target: leaf,
                            package_url: package_url.clone(),
                        });
                    }

                    if is_imports {
                        let status = self.url(&leaf, package_url).await?;
                        if !status.is_unresolved() {
                            return Ok(status);
                        }
                    }

                    if is_path_like(&leaf) {
                        return self.candidate(package_url, &leaf).await;
                    }

                    self.package(&leaf, package_url).await
                }
                Target::List(items) => {
                    for item in items {
                        let status = self
                            .package_target(
                                package_url,
                                item,
                                pattern_match,
                                is_imports,
                                conditions,
                            )
                            .await?;
                        if !status.is_unresolved() {
                            return Ok(status);
                        }
                    }
                    Ok(Status::Unresolved)
                }
                Target::Conditional(map) => {
                    check_condition_keys(package_url, map)?;

                    let mut status = Status::Unresolved;
                    for (key, target, set) in condition_matches(map, conditions) {
                        self.record_condition(key);
                        let next = self
                            .package_target(package_url, target, pattern_match, is_imports, set)
                            .await?;
                        status = status.max(next);
                        if status == Status::Resolved {
                            break;
                        }
                    }
                    Ok(status)
                }
            }
        }
        .boxed_local()
    }
}

/// Conditional maps may not use array-index-like keys.
pub(crate) fn check_condition_keys(package_url: &Url, map: &TargetMap) -> Result<(), ResolveError> {
    match map.keys().find(|key| is_numeric_key(key)) {
        Some(key) => Err(ResolveError::InvalidPackageConfiguration {
            package_url: package_url.clone(),
            reason: format!("condition '{key}' must not be a numeric key"),
        }),
        None => Ok(()),
    }
}
