//! Suspend/resume plumbing for the resolution algorithm.
//!
//! The algorithm is ordinary `async` code that awaits exactly two kinds of
//! suspension: a package descriptor request and a candidate hand-off. Polling
//! it with a no-op waker turns it into a step function, so the same traversal
//! can be drained by a blocking loop or by an async one.

use super::package_json::PackageJson;
use super::resolve::Ctx;
use super::options::ResolveOptions;
use crate::error::ResolveError;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use futures::FutureExt;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use url::Url;

/// How far a resolution step got.
///
/// Ordered so that combining two steps is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// Nothing was produced.
    Unresolved,
    /// At least one candidate was produced.
    Yielded,
    /// The consumer confirmed a candidate; the traversal stops.
    Resolved,
}

impl Status {
    #[must_use]
    pub fn is_unresolved(self) -> bool {
        self == Self::Unresolved
    }
}

/// What the traversal needs next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Supply the descriptor at this URL with [`Resume::Package`].
    Package(Url),
    /// A candidate module URL. Resume with [`Resume::Continue`] to keep going
    /// or [`Resume::Resolved`] to accept it.
    Candidate(Url),
    /// The traversal finished.
    Done(Result<Status, ResolveError>),
}

/// Input fed back into the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resume {
    Continue,
    Package(Option<PackageJson>),
    Resolved,
}

#[derive(Debug)]
enum Request {
    Package(Url),
    Candidate(Url),
}

#[derive(Debug, Default)]
struct Channel {
    outgoing: Option<Request>,
    incoming: Option<Resume>,
}

/// The traversal's side of the channel.
#[derive(Debug, Clone, Default)]
pub(crate) struct Co {
    channel: Rc<RefCell<Channel>>,
}

impl Co {
    /// Suspend until the descriptor at `url` is supplied.
    pub(crate) async fn package(&self, url: Url) -> Option<PackageJson> {
        self.channel.borrow_mut().outgoing = Some(Request::Package(url));
        Suspend::default().await;

        match self.channel.borrow_mut().incoming.take() {
            Some(Resume::Package(pkg)) => pkg,
            _ => None,
        }
    }

    /// Hand a candidate to the consumer.
    pub(crate) async fn candidate(&self, url: Url) -> Status {
        self.channel.borrow_mut().outgoing = Some(Request::Candidate(url));
        Suspend::default().await;

        match self.channel.borrow_mut().incoming.take() {
            Some(Resume::Resolved) => Status::Resolved,
            _ => Status::Yielded,
        }
    }

    fn send(&self, input: Resume) {
        self.channel.borrow_mut().incoming = Some(input);
    }

    fn take_request(&self) -> Option<Request> {
        self.channel.borrow_mut().outgoing.take()
    }
}

/// Pending exactly once.
#[derive(Debug, Default)]
struct Suspend {
    suspended: bool,
}

impl Future for Suspend {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.suspended {
            Poll::Ready(())
        } else {
            self.suspended = true;
            Poll::Pending
        }
    }
}

/// One resolution, advanced step by step.
///
/// ```
/// use modspec_core::resolver::{Resolution, ResolveOptions, Resume, Step};
/// use url::Url;
///
/// let options = ResolveOptions::new();
/// let parent = Url::parse("file:///a/b/c").unwrap();
/// let mut resolution = Resolution::new("./d", &parent, &options);
///
/// let mut candidates = Vec::new();
/// let mut input = Resume::Continue;
/// loop {
///     match resolution.resume(input) {
///         Step::Package(_) => input = Resume::Package(None),
///         Step::Candidate(url) => {
///             candidates.push(url.to_string());
///             input = Resume::Continue;
///         }
///         Step::Done(result) => {
///             result.unwrap();
///             break;
///         }
///     }
/// }
/// assert_eq!(candidates, vec!["file:///a/b/d"]);
/// ```
pub struct Resolution<'o> {
    task: Option<LocalBoxFuture<'o, Result<Status, ResolveError>>>,
    ctx: Rc<Ctx<'o>>,
    outcome: Option<Result<Status, ResolveError>>,
}

impl<'o> Resolution<'o> {
    /// Prepare to resolve `specifier` from `parent`. Nothing runs until the
    /// first [`resume`](Self::resume).
    #[must_use]
    pub fn new(specifier: &str, parent: &Url, options: &'o ResolveOptions) -> Self {
        let ctx = Rc::new(Ctx::new(options, Co::default()));

        let task = {
            let ctx = Rc::clone(&ctx);
            let specifier = specifier.to_string();
            let parent = parent.clone();
            async move { ctx.module(&specifier, &parent).await }.boxed_local()
        };

        Self {
            task: Some(task),
            ctx,
            outcome: None,
        }
    }

    /// Feed `input` back in and run until the next suspension.
    ///
    /// The input to the first call is ignored. Once finished, every further
    /// call returns the same [`Step::Done`].
    pub fn resume(&mut self, input: Resume) -> Step {
        let Some(task) = self.task.as_mut() else {
            return Step::Done(self.outcome.clone().unwrap_or(Ok(Status::Unresolved)));
        };

        self.ctx.co.send(input);

        let mut cx = Context::from_waker(noop_waker_ref());
        let outcome = match task.poll_unpin(&mut cx) {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => match self.ctx.co.take_request() {
                Some(Request::Package(url)) => return Step::Package(url),
                Some(Request::Candidate(url)) => return Step::Candidate(url),
                None => Ok(Status::Unresolved),
            },
        };

        self.task = None;
        self.outcome = Some(outcome.clone());
        Step::Done(outcome)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.task.is_none()
    }

    /// The final result, once done.
    #[must_use]
    pub fn outcome(&self) -> Option<&Result<Status, ResolveError>> {
        self.outcome.as_ref()
    }

    /// Condition keys selected so far, in evaluation order.
    #[must_use]
    pub fn matched_conditions(&self) -> Vec<String> {
        self.ctx.matched_conditions()
    }
}

impl std::fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("done", &self.is_done())
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parent() -> Url {
        Url::parse("file:///a/b/c").unwrap()
    }

    #[test]
    fn test_status_order() {
        assert!(Status::Unresolved < Status::Yielded);
        assert!(Status::Yielded < Status::Resolved);
        assert_eq!(Status::Yielded.max(Status::Unresolved), Status::Yielded);
    }

    #[test]
    fn test_steps_request_then_candidate() {
        let options = ResolveOptions::new();
        let mut resolution = Resolution::new("d", &parent(), &options);

        // Scope walk for imports, then self-reference, then node_modules.
        let mut requested = Vec::new();
        let mut input = Resume::Continue;
        let candidate = loop {
            match resolution.resume(input) {
                Step::Package(url) => {
                    let pkg = (url.as_str() == "file:///a/b/node_modules/d/package.json")
                        .then(|| PackageJson::from_value(json!({ "main": "e.js" })).unwrap());
                    requested.push(url.to_string());
                    input = Resume::Package(pkg);
                }
                Step::Candidate(url) => break url,
                Step::Done(result) => panic!("finished early: {result:?}"),
            }
        };

        assert_eq!(candidate.as_str(), "file:///a/b/node_modules/d/e.js");
        assert_eq!(
            requested.last().map(String::as_str),
            Some("file:///a/b/node_modules/d/package.json")
        );
        assert!(!resolution.is_done());
    }

    #[test]
    fn test_confirm_stops_traversal() {
        let options = ResolveOptions::new().with_extensions([".js"]);
        let mut resolution = Resolution::new("./d", &parent(), &options);

        let mut input = Resume::Continue;
        loop {
            match resolution.resume(input) {
                Step::Package(_) => input = Resume::Package(None),
                Step::Candidate(url) => {
                    assert_eq!(url.as_str(), "file:///a/b/d");
                    input = Resume::Resolved;
                }
                Step::Done(result) => {
                    assert_eq!(result, Ok(Status::Resolved));
                    break;
                }
            }
        }

        assert!(resolution.is_done());
        assert_eq!(
            resolution.resume(Resume::Continue),
            Step::Done(Ok(Status::Resolved))
        );
    }

    #[test]
    fn test_error_is_final() {
        let options = ResolveOptions::new();
        let mut resolution = Resolution::new("", &parent(), &options);

        let mut input = Resume::Continue;
        let err = loop {
            match resolution.resume(input) {
                Step::Package(_) => input = Resume::Package(None),
                Step::Candidate(url) => panic!("unexpected candidate {url}"),
                Step::Done(result) => break result.unwrap_err(),
            }
        };

        assert_eq!(err.code(), "INVALID_MODULE_SPECIFIER");
        assert!(matches!(
            resolution.outcome(),
            Some(Err(ResolveError::InvalidModuleSpecifier { .. }))
        ));
    }
}
