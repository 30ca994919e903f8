//! Specifier dispatch and package resolution.

use super::coroutine::{Co, Status};
use super::engines::validate_engines;
use super::options::ResolveOptions;
use super::package_json::PackageJson;
use super::scope::lookup_package_scope;
use super::specifier::{
    is_path_like, normalize_windows_path, split_version, PackageSpecifier, SpecifierKind,
};
use super::target::TargetMap;
use crate::error::ResolveError;
use std::cell::RefCell;
use url::Url;

pub(crate) type Outcome = Result<Status, ResolveError>;

/// State shared by every step of one resolution.
pub(crate) struct Ctx<'o> {
    pub(crate) options: &'o ResolveOptions,
    pub(crate) co: Co,
    matched_conditions: RefCell<Vec<String>>,
}

/// Resolve `reference` against `base`, reporting failure as an invalid specifier.
pub(crate) fn join(base: &Url, reference: &str) -> Result<Url, ResolveError> {
    base.join(reference)
        .map_err(|e| ResolveError::invalid_specifier(reference, e.to_string()))
}

impl<'o> Ctx<'o> {
    pub(crate) fn new(options: &'o ResolveOptions, co: Co) -> Self {
        Self {
            options,
            co,
            matched_conditions: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn matched_conditions(&self) -> Vec<String> {
        self.matched_conditions.borrow().clone()
    }

    /// The condition sets from the options.
    pub(crate) fn conditions(&self) -> &'o [Vec<String>] {
        self.options.conditions.as_sets()
    }

    pub(crate) fn record_condition(&self, key: &str) {
        self.matched_conditions.borrow_mut().push(key.to_string());
    }

    /// Hand `base + reference` to the consumer.
    pub(crate) async fn candidate(&self, base: &Url, reference: &str) -> Outcome {
        let url = join(base, reference)?;
        Ok(self.co.candidate(url).await)
    }

    /// Entry point: resolve `specifier` as imported from `parent`.
    pub(crate) async fn module(&self, specifier: &str, parent: &Url) -> Outcome {
        let specifier = normalize_windows_path(specifier);
        let specifier = specifier.as_ref();

        if let Some(map) = self.options.resolutions.get(parent.as_str()) {
            let status = self.preresolved(specifier, map, parent).await?;
            if !status.is_unresolved() {
                return Ok(status);
            }
        }

        let kind = SpecifierKind::of(specifier);

        if kind == SpecifierKind::UrlLiteral {
            let status = self.url(specifier, parent).await?;
            if !status.is_unresolved() {
                return Ok(status);
            }
        }

        let status = self.package_imports(specifier, parent).await?;
        if !status.is_unresolved() {
            return Ok(status);
        }

        // Drive letters were rewritten above, so they classify as absolute.
        if matches!(kind, SpecifierKind::AbsolutePath | SpecifierKind::RelativePath) {
            let status = self.file(specifier, parent, false).await?;
            if status == Status::Resolved {
                return Ok(status);
            }
            return Ok(status.max(self.directory(specifier, parent).await?));
        }

        self.package(specifier, parent).await
    }

    /// Apply a caller supplied import map registered for `parent`.
    pub(crate) async fn preresolved(
        &self,
        specifier: &str,
        map: &TargetMap,
        parent: &Url,
    ) -> Outcome {
        self.package_imports_exports(specifier, map, parent, true)
            .await
    }

    /// Absolute URL specifiers. `node:` names re-enter package resolution.
    pub(crate) async fn url(&self, specifier: &str, parent: &Url) -> Outcome {
        let Ok(url) = Url::parse(specifier) else {
            return Ok(Status::Unresolved);
        };

        if url.scheme() == "node" {
            let name = url.path();
            if is_path_like(name) {
                return Err(ResolveError::invalid_specifier(
                    specifier,
                    "node: specifiers must name a package",
                ));
            }
            return self.package(name, parent).await;
        }

        Ok(self.co.candidate(url).await)
    }

    /// `imports` of the caller's options, then of the nearest package scope.
    pub(crate) async fn package_imports(&self, specifier: &str, parent: &Url) -> Outcome {
        if specifier == "#" || specifier.starts_with("#/") {
            return Err(ResolveError::invalid_specifier(
                specifier,
                "'#' and '#/' are not valid import names",
            ));
        }

        if let Some(imports) = &self.options.imports {
            let status = self
                .package_imports_exports(specifier, imports, parent, true)
                .await?;
            if !status.is_unresolved() {
                return Ok(status);
            }
        }

        for package_json_url in lookup_package_scope(parent, self.options) {
            let Some(pkg) = self.co.package(package_json_url.clone()).await else {
                continue;
            };

            if let Some(imports) = &pkg.imports {
                let status = self
                    .package_imports_exports(specifier, imports, &package_json_url, true)
                    .await?;
                if !status.is_unresolved() {
                    return Ok(status);
                }
            }

            break;
        }

        if specifier.starts_with('#') {
            return Err(ResolveError::PackageImportNotDefined {
                specifier: specifier.to_string(),
                parent_url: parent.clone(),
            });
        }

        Ok(Status::Unresolved)
    }

    /// Bare specifiers: builtins, self-reference, then `node_modules` ascent.
    pub(crate) async fn package(&self, specifier: &str, parent: &Url) -> Outcome {
        let PackageSpecifier { name, subpath } = PackageSpecifier::parse(specifier)?;

        let (builtin_name, version) = split_version(specifier);
        for builtin in &self.options.builtins {
            let status = self
                .builtin_target(builtin_name, version, builtin, self.conditions())
                .await?;
            if !status.is_unresolved() {
                return Ok(status);
            }
        }

        if let Some(status) = self.package_self(name, &subpath, parent).await? {
            return Ok(status);
        }

        let mut parent = parent.clone();
        loop {
            let package_url = join(&parent, &format!("node_modules/{name}/"))?;

            let path = parent.path().to_string();
            let Some(cut) = path.rfind('/') else {
                break;
            };
            let (dir, trimmed) = (&path[..=cut], &path[..cut]);

            // Never look for node_modules/node_modules/<name>.
            if !dir.ends_with("/node_modules/") {
                let pkg = self.co.package(join(&package_url, "package.json")?).await;
                if let Some(pkg) = pkg {
                    if let Some(engines) = &pkg.engines {
                        validate_engines(&package_url, engines, &self.options.engines)?;
                    }
                    return self.package_fields(&package_url, &subpath, &pkg).await;
                }
            }

            if trimmed.is_empty() {
                break;
            }
            parent.set_path(trimmed);
        }

        Ok(Status::Unresolved)
    }

    /// A package importing itself by name from inside its own scope.
    ///
    /// Returns `None` when the nearest scope is not the named package.
    async fn package_self(
        &self,
        name: &str,
        subpath: &str,
        parent: &Url,
    ) -> Result<Option<Status>, ResolveError> {
        for package_json_url in lookup_package_scope(parent, self.options) {
            let Some(pkg) = self.co.package(package_json_url.clone()).await else {
                continue;
            };

            if pkg.name.as_deref() != Some(name) {
                return Ok(None);
            }

            let package_url = join(&package_json_url, ".")?;
            return self
                .package_fields(&package_url, subpath, &pkg)
                .await
                .map(Some);
        }

        Ok(None)
    }

    /// Resolve `subpath` inside a package root through its descriptor.
    async fn package_fields(
        &self,
        package_url: &Url,
        subpath: &str,
        pkg: &PackageJson,
    ) -> Outcome {
        if let Some(exports) = &pkg.exports {
            return self.package_exports(package_url, subpath, exports).await;
        }

        let subpath = match (subpath, pkg.main()) {
            (".", Some(main)) => main,
            (".", None) => return self.file("index", package_url, true).await,
            (subpath, _) => subpath,
        };

        let status = self.file(subpath, package_url, false).await?;
        if status == Status::Resolved {
            return Ok(status);
        }
        Ok(status.max(self.directory(subpath, package_url).await?))
    }
}
