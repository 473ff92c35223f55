//! Fallback values for fallible futures.
//!
//! [`catch_as`] and [`catch_as_default`] turn a future of `Result<T, E>` into
//! a future of `T`, settling on a fallback whenever the inner future fails.

use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use pin_project_lite::pin_project;
use tracing::debug;

pin_project! {
    /// A future that swaps any failure of its inner future for a fallback value.
    ///
    /// Successful results pass through untouched. Every error is absorbed,
    /// whatever its kind. Created by [`catch_as`], [`catch_as_default`] or the
    /// [`catch_as()`](crate::task_ext::TaskExt::catch_as) operator.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct CatchAs<F, T> {
        #[pin]
        future: F,
        fallback: Option<T>,
    }
}

impl<F, T> CatchAs<F, T> {
    pub fn new(future: F, fallback: T) -> Self {
        CatchAs {
            future,
            fallback: Some(fallback),
        }
    }

    /// Consumes the `CatchAs` and returns the inner future.
    pub fn inner(self) -> F {
        self.future
    }
}

impl<F, T, E> Future for CatchAs<F, T>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let outcome = ready!(this.future.poll(cx));
        let fallback = match this.fallback.take() {
            Some(fallback) => fallback,
            None => panic!("`CatchAs` polled after completion"),
        };
        match outcome {
            Ok(value) => Poll::Ready(value),
            Err(_) => {
                debug!("failure replaced by fallback value");
                Poll::Ready(fallback)
            }
        }
    }
}

/// Resolves `value`, or `fallback` if it fails.
///
/// Plain values can be passed as [`Deferred::ready`](crate::Deferred::ready)
/// or [`future::ok`](futures::future::ok).
pub fn catch_as<V, T, E>(value: V, fallback: T) -> CatchAs<V::IntoFuture, T>
where
    V: IntoFuture<Output = Result<T, E>>,
{
    CatchAs::new(value.into_future(), fallback)
}

/// Resolves `value`, or `T::default()` if it fails.
pub fn catch_as_default<V, T, E>(value: V) -> CatchAs<V::IntoFuture, T>
where
    V: IntoFuture<Output = Result<T, E>>,
    T: Default,
{
    CatchAs::new(value.into_future(), T::default())
}
