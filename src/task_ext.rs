//! Operator-style access to [`Delay`] and [`CatchAs`] on any future.

use std::time::Duration;

use crate::{catch::CatchAs, timing::Delay};

/// Extend `Future` with timing and fallback operators.
pub trait TaskExt: Future {
    /// Starts polling `self` only after `duration` has elapsed.
    fn delay(self, duration: Duration) -> Delay<Self>
    where
        Self: Sized,
    {
        Delay::new(self, duration)
    }

    /// Resolves to `fallback` if `self` fails.
    fn catch_as<T, E>(self, fallback: T) -> CatchAs<Self, T>
    where
        Self: Future<Output = Result<T, E>> + Sized,
    {
        CatchAs::new(self, fallback)
    }

    /// Resolves to `T::default()` if `self` fails.
    fn catch_as_default<T, E>(self) -> CatchAs<Self, T>
    where
        Self: Future<Output = Result<T, E>> + Sized,
        T: Default,
    {
        CatchAs::new(self, T::default())
    }
}

impl<T> TaskExt for T where T: Future {}
