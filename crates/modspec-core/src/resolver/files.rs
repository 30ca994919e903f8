//! File and directory candidates.

use super::coroutine::Status;
use super::resolve::{join, Ctx, Outcome};
use super::specifier::has_encoded_separator;
use crate::error::ResolveError;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use url::Url;

impl Ctx<'_> {
    /// Yield `name` (unless `index_only`) and then `name` with each extension.
    ///
    /// # Errors
    /// `INVALID_MODULE_SPECIFIER` if `name` encodes a path separator and
    /// `parent` is a `file:` URL.
    pub(crate) async fn file(&self, name: &str, parent: &Url, index_only: bool) -> Outcome {
        if parent.scheme() == "file" && has_encoded_separator(name) {
            return Err(ResolveError::invalid_specifier(
                name,
                "must not include encoded '/' or '\\' characters",
            ));
        }

        if name == "." || name == ".." || name.ends_with('/') || name.ends_with('\\') {
            return Ok(Status::Unresolved);
        }

        let mut status = Status::Unresolved;

        if !index_only {
            status = self.candidate(parent, name).await?;
            if status == Status::Resolved {
                return Ok(status);
            }
        }

        for ext in &self.options.extensions {
            status = status.max(self.candidate(parent, &format!("{name}{ext}")).await?);
            if status == Status::Resolved {
                return Ok(status);
            }
        }

        Ok(status)
    }

    /// Treat `name` as a directory: its own `package.json`, then `index`.
    pub(crate) fn directory<'s>(
        &'s self,
        name: &'s str,
        parent: &'s Url,
    ) -> LocalBoxFuture<'s, Outcome> {
        async move {
            let dir_url = if name.ends_with('/') {
                join(parent, name)?
            } else {
                join(parent, &format!("{name}/"))?
            };

            if let Some(pkg) = self.co.package(join(&dir_url, "package.json")?).await {
                if let Some(exports) = &pkg.exports {
                    return self.package_exports(&dir_url, ".", exports).await;
                }

                if let Some(main) = pkg.main() {
                    let status = self.file(main, &dir_url, false).await?;
                    if status == Status::Resolved {
                        return Ok(status);
                    }
                    return Ok(status.max(self.directory(main, &dir_url).await?));
                }
            }

            self.file("index", &dir_url, true).await
        }
        .boxed_local()
    }
}
