//! Blocking and async front ends over [`Resolution`].

use super::coroutine::{Resolution, Resume, Status, Step};
use super::options::ResolveOptions;
use super::reader::{AsyncPackageReader, PackageReader};
use crate::error::ResolveError;
use futures::stream::{self, Stream};
use std::iter::FusedIterator;
use url::Url;

/// Resolve `specifier` from `parent`, reading descriptors through `reader`.
///
/// The returned iterator yields candidates lazily in order. An error is
/// yielded at most once and ends the sequence.
///
/// ```
/// use modspec_core::resolver::{resolve, PackageJson, ResolveOptions};
/// use url::Url;
///
/// let options = ResolveOptions::new().with_extensions([".js"]);
/// let parent = Url::parse("file:///a/b/c").unwrap();
/// let reader = |url: &Url| -> Option<PackageJson> {
///     (url.as_str() == "file:///a/b/node_modules/d/package.json").then(PackageJson::default)
/// };
///
/// let candidates: Vec<String> = resolve("d", &parent, &options, reader)
///     .map(|candidate| candidate.unwrap().to_string())
///     .collect();
/// assert_eq!(candidates, vec!["file:///a/b/node_modules/d/index.js"]);
/// ```
pub fn resolve<'o, R: PackageReader>(
    specifier: &str,
    parent: &Url,
    options: &'o ResolveOptions,
    reader: R,
) -> Resolutions<'o, R> {
    Resolutions {
        resolution: Resolution::new(specifier, parent, options),
        reader,
        input: Resume::Continue,
        finished: false,
    }
}

/// Candidates of one resolution, drained synchronously.
#[derive(Debug)]
pub struct Resolutions<'o, R> {
    resolution: Resolution<'o>,
    reader: R,
    input: Resume,
    finished: bool,
}

impl<R> Resolutions<'_, R> {
    /// Accept the candidate most recently returned. The next call to `next`
    /// finishes the resolution without producing anything further.
    pub fn confirm(&mut self) {
        self.input = Resume::Resolved;
    }

    /// Condition keys selected so far, in evaluation order.
    #[must_use]
    pub fn matched_conditions(&self) -> Vec<String> {
        self.resolution.matched_conditions()
    }

    /// The final status, once the sequence has ended without error.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match self.resolution.outcome() {
            Some(Ok(status)) => Some(*status),
            _ => None,
        }
    }
}

impl<R: PackageReader> Iterator for Resolutions<'_, R> {
    type Item = Result<Url, ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let input = std::mem::replace(&mut self.input, Resume::Continue);
            match self.resolution.resume(input) {
                Step::Package(url) => {
                    self.input = Resume::Package(PackageReader::read_package(&mut self.reader, &url));
                }
                Step::Candidate(url) => return Some(Ok(url)),
                Step::Done(result) => {
                    self.finished = true;
                    return result.err().map(Err);
                }
            }
        }
    }
}

impl<R: PackageReader> FusedIterator for Resolutions<'_, R> {}

/// Resolve `specifier` from `parent`, awaiting each descriptor from `reader`.
///
/// Only one descriptor read is ever in flight.
pub fn resolve_async<'o, R: AsyncPackageReader>(
    specifier: &str,
    parent: &Url,
    options: &'o ResolveOptions,
    reader: R,
) -> AsyncResolutions<'o, R> {
    AsyncResolutions {
        resolution: Resolution::new(specifier, parent, options),
        reader,
        input: Resume::Continue,
        finished: false,
    }
}

/// Candidates of one resolution, drained asynchronously.
#[derive(Debug)]
pub struct AsyncResolutions<'o, R> {
    resolution: Resolution<'o>,
    reader: R,
    input: Resume,
    finished: bool,
}

impl<'o, R: AsyncPackageReader> AsyncResolutions<'o, R> {
    /// The next candidate, `None` once finished.
    pub async fn next_candidate(&mut self) -> Option<Result<Url, ResolveError>> {
        if self.finished {
            return None;
        }

        loop {
            let input = std::mem::replace(&mut self.input, Resume::Continue);
            match self.resolution.resume(input) {
                Step::Package(url) => {
                    let pkg = AsyncPackageReader::read_package(&mut self.reader, url).await;
                    self.input = Resume::Package(pkg);
                }
                Step::Candidate(url) => return Some(Ok(url)),
                Step::Done(result) => {
                    self.finished = true;
                    return result.err().map(Err);
                }
            }
        }
    }

    /// Drain every candidate, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<Url>, ResolveError> {
        let mut candidates = Vec::new();
        while let Some(candidate) = self.next_candidate().await {
            candidates.push(candidate?);
        }
        Ok(candidates)
    }

    /// Turn into a [`Stream`] of candidates.
    pub fn into_stream(self) -> impl Stream<Item = Result<Url, ResolveError>> + 'o
    where
        R: 'o,
    {
        stream::unfold(self, |mut this| async move {
            let item = this.next_candidate().await?;
            Some((item, this))
        })
    }
}

impl<R> AsyncResolutions<'_, R> {
    /// Accept the candidate most recently returned.
    pub fn confirm(&mut self) {
        self.input = Resume::Resolved;
    }

    /// Condition keys selected so far, in evaluation order.
    #[must_use]
    pub fn matched_conditions(&self) -> Vec<String> {
        self.resolution.matched_conditions()
    }

    /// The final status, once finished without error.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match self.resolution.outcome() {
            Some(Ok(status)) => Some(*status),
            _ => None,
        }
    }
}
