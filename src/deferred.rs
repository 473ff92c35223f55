//! Values that may or may not be available yet.
//!
//! [`Deferred`] is the element type accepted by [`call_each`](crate::call_each),
//! [`find`](crate::find) and [`all_props`]: a value that is already there, a
//! future still in flight, an eager failure, or a zero-argument callable
//! that produces the future on demand. Anything can be turned into a ready
//! `Deferred` through `From`, so plain collections work unchanged.

use std::{
    fmt,
    hash::Hash,
    pin::Pin,
    task::{Context, Poll},
};

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use tracing::debug;

use crate::{Collection, Error};

type Producer<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

enum Inner<T, E> {
    Ready(Option<T>),
    Failed(Option<E>),
    Pending(BoxFuture<'static, Result<T, E>>),
    Call(Option<Producer<T, E>>),
}

/// A value-or-deferred element.
///
/// `Deferred` is itself a future resolving to `Result<T, E>`. A callable is
/// invoked the first time the `Deferred` is polled, and the future it
/// returns is awaited in its place.
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct Deferred<T, E> {
    inner: Inner<T, E>,
}

impl<T, E> Deferred<T, E> {
    /// A value that is already available.
    pub fn ready(value: T) -> Self {
        Deferred {
            inner: Inner::Ready(Some(value)),
        }
    }

    /// A failure that is already known.
    pub fn rejected(error: E) -> Self {
        Deferred {
            inner: Inner::Failed(Some(error)),
        }
    }

    /// A value still being computed by `future`.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        Deferred {
            inner: Inner::Pending(future.boxed()),
        }
    }

    /// A callable that produces the value when the element is resolved.
    pub fn call<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Deferred {
            inner: Inner::Call(Some(Box::new(move || producer().boxed()))),
        }
    }

    /// `true` for in-flight futures and eager failures.
    pub fn is_pending(&self) -> bool {
        matches!(self.inner, Inner::Pending(_) | Inner::Failed(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.inner, Inner::Call(_))
    }
}

impl<T, E> From<T> for Deferred<T, E> {
    fn from(value: T) -> Self {
        Deferred::ready(value)
    }
}

// Nothing inside is ever pinned structurally.
impl<T, E> Unpin for Deferred<T, E> {}

impl<T, E> Future for Deferred<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match &mut this.inner {
                Inner::Ready(value) => match value.take() {
                    Some(value) => return Poll::Ready(Ok(value)),
                    None => panic!("`Deferred` polled after completion"),
                },
                Inner::Failed(error) => match error.take() {
                    Some(error) => return Poll::Ready(Err(error)),
                    None => panic!("`Deferred` polled after completion"),
                },
                Inner::Pending(future) => return future.poll_unpin(cx),
                Inner::Call(producer) => match producer.take() {
                    Some(producer) => this.inner = Inner::Pending(producer()),
                    None => panic!("`Deferred` polled after completion"),
                },
            }
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Inner::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
            Inner::Pending(_) => f.write_str("Pending"),
            Inner::Call(_) => f.write_str("Call"),
        }
    }
}

/// Tells whether `value` is a deferred value rather than a plain one.
///
/// Callables are not deferred values: they only become one once invoked.
pub fn is_promise<T, E>(value: &Deferred<T, E>) -> bool {
    value.is_pending()
}

/// Resolves every value of a mapping concurrently, keeping the keys.
///
/// The result lists keys in the input's enumeration order. The first element
/// to fail fails the whole call with its own error. Input that is not a
/// collection at all is rejected with [`Error::InvalidArgument`].
pub async fn all_props<C, T, E>(promises: C) -> Result<IndexMap<C::Key, T>, E>
where
    C: Collection,
    C::Key: Hash + Eq,
    C::Value: Into<Deferred<T, E>>,
    E: From<Error>,
{
    let entries = promises
        .entries()
        .map_err(|_| Error::InvalidArgument { name: "promises" })?;
    let (keys, pending): (Vec<C::Key>, Vec<Deferred<T, E>>) = entries
        .map(|(key, value)| (key, value.into()))
        .unzip();
    debug!(count = keys.len(), "resolving props");
    let values = future::try_join_all(pending).await?;
    Ok(keys.into_iter().zip(values).collect())
}
