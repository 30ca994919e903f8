//! Builtin module matching.

use super::conditions::condition_matches;
use super::coroutine::Status;
use super::exports::check_condition_keys;
use super::resolve::{Ctx, Outcome};
use super::specifier::split_version;
use super::target::Target;
use crate::error::ResolveError;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use url::Url;

impl Ctx<'_> {
    /// Match a (possibly versioned) package name against a builtin target tree
    /// whose leaves are `name[@version]`.
    ///
    /// A version is only put in the candidate when the caller asked for one;
    /// the target may leave it open or must agree exactly. The target's own
    /// version is never adopted: `d` against `d@1.2.3` yields `builtin:d`.
    pub(crate) fn builtin_target<'s>(
        &'s self,
        name: &'s str,
        version: Option<&'s str>,
        target: &'s Target,
        conditions: &'s [Vec<String>],
    ) -> LocalBoxFuture<'s, Outcome> {
        async move {
            match target {
                Target::Leaf(leaf) => {
                    let (target_name, target_version) = split_version(leaf);
                    if target_name != name {
                        return Ok(Status::Unresolved);
                    }

                    match (version, target_version) {
                        (Some(wanted), Some(offered)) if wanted != offered => {
                            Ok(Status::Unresolved)
                        }
                        _ => Ok(self.co.candidate(self.builtin_url(name, version)?).await),
                    }
                }
                Target::List(items) => {
                    for item in items {
                        let status = self.builtin_target(name, version, item, conditions).await?;
                        if !status.is_unresolved() {
                            return Ok(status);
                        }
                    }
                    Ok(Status::Unresolved)
                }
                Target::Conditional(map) => {
                    check_condition_keys(&self.builtin_url(name, None)?, map)?;

                    let mut status = Status::Unresolved;
                    for (key, target, set) in condition_matches(map, conditions) {
                        self.record_condition(key);
                        status = status.max(self.builtin_target(name, version, target, set).await?);
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

    fn builtin_url(&self, name: &str, version: Option<&str>) -> Result<Url, ResolveError> {
        let protocol = &self.options.builtin_protocol;
        let href = match version {
            Some(version) => format!("{protocol}{name}@{version}"),
            None => format!("{protocol}{name}"),
        };

        Url::parse(&href).map_err(|e| ResolveError::invalid_specifier(name, e.to_string()))
    }
}
