//! Scheduling primitives shared by the helpers.
//!
//! [`yield_now`] is the explicit "back to the scheduler" step the loop engine
//! takes between iterations. [`delay`] and friends settle after a duration has
//! elapsed. [`Delay`] postpones the start of another future.
//!
//! None of this is tied to a specific async runtime. By default delays are
//! driven by the `futures-timer` global timer thread, which tracks every
//! pending deadline at once, so each delay settles after its own duration
//! however many others are outstanding. A [`Timer`] hook set on
//! [`DelayOptions`] replaces that clock, like a `setTimeout` override.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use futures::{FutureExt, channel::oneshot};
use pin_project_lite::pin_project;
use tracing::{debug, trace};

/// Duration used by [`delay_default`].
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Callback a [`Timer`] must invoke once the scheduled duration has elapsed.
pub type Wake = Box<dyn FnOnce() + Send + 'static>;

/// Hook that runs a callback after a duration, like a `setTimeout`.
///
/// Implemented for any `Fn(Duration, Wake)` closure, which is handy for tests
/// that want to fire the callback right away.
pub trait Timer: Send + Sync {
    fn schedule(&self, duration: Duration, wake: Wake);
}

impl<F> Timer for F
where
    F: Fn(Duration, Wake) + Send + Sync,
{
    fn schedule(&self, duration: Duration, wake: Wake) {
        self(duration, wake)
    }
}

/// Options for [`delay_with`], [`delay_default_with`] and [`Delay`].
#[derive(Clone, Default)]
pub struct DelayOptions {
    timer: Option<Arc<dyn Timer>>,
}

impl DelayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default clock with `timer`.
    pub fn timer(mut self, timer: impl Timer + 'static) -> Self {
        self.timer = Some(Arc::new(timer));
        self
    }

    fn start(&self, duration: Duration) -> Sleep {
        debug!(?duration, custom_timer = self.timer.is_some(), "scheduling delay");
        let Some(timer) = &self.timer else {
            return Sleep {
                state: SleepState::Clock(futures_timer::Delay::new(duration)),
            };
        };
        let (sender, receiver) = oneshot::channel();
        timer.schedule(
            duration,
            Box::new(move || {
                let _ = sender.send(());
            }),
        );
        Sleep {
            state: SleepState::Hook(receiver),
        }
    }
}

impl fmt::Debug for DelayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayOptions")
            .field("custom_timer", &self.timer.is_some())
            .finish()
    }
}

enum SleepState {
    Clock(futures_timer::Delay),
    Hook(oneshot::Receiver<()>),
}

/// A future that settles once its timer fires. Created by [`delay`].
///
/// The timer starts when the `Sleep` is created, not when it is first polled.
/// Dropping it cancels the pending deadline.
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct Sleep {
    state: SleepState,
}

impl fmt::Debug for Sleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sleep").finish_non_exhaustive()
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            SleepState::Clock(clock) => clock.poll_unpin(cx),
            SleepState::Hook(receiver) => match receiver.poll_unpin(cx) {
                Poll::Ready(Ok(())) => Poll::Ready(()),
                Poll::Ready(Err(oneshot::Canceled)) => {
                    // The hook dropped its callback; there is nothing left to wait for.
                    debug!("timer dropped without firing");
                    Poll::Ready(())
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// Settles after `duration` using the default timer.
pub fn delay(duration: Duration) -> Sleep {
    delay_with(duration, &DelayOptions::default())
}

/// Settles after [`DEFAULT_DELAY`] using the default timer.
pub fn delay_default() -> Sleep {
    delay_default_with(&DelayOptions::default())
}

/// Settles after `duration` using the timer configured in `options`.
pub fn delay_with(duration: Duration, options: &DelayOptions) -> Sleep {
    options.start(duration)
}

/// Settles after [`DEFAULT_DELAY`] using the timer configured in `options`.
pub fn delay_default_with(options: &DelayOptions) -> Sleep {
    delay_with(DEFAULT_DELAY, options)
}

/// Future returned by [`yield_now`].
#[derive(Debug, Default)]
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        // Reschedule behind whatever else the executor has queued.
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Hands control back to the executor once before resuming.
///
/// The current task is woken immediately, so it goes to the back of the run
/// queue instead of continuing on the same call stack.
pub fn yield_now() -> YieldNow {
    YieldNow::default()
}

pin_project! {
    /// A future that begins polling its inner future only after a specified delay.
    ///
    /// The delay is counted from the first poll of the `Delay`. Once it has
    /// passed, every poll is forwarded to the inner future until it completes.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Delay<F> {
        #[pin]
        future: F,
        duration: Duration,
        options: DelayOptions,
        sleep: Option<Sleep>,
        elapsed: bool,
    }
}

impl<F> Delay<F> {
    /// Defers `future` by `duration` using the default timer.
    ///
    /// A more convenient way to construct this is the
    /// [`delay()`](crate::task_ext::TaskExt::delay) operator.
    pub fn new(future: F, duration: Duration) -> Self {
        Self::with_options(future, duration, DelayOptions::default())
    }

    pub fn with_options(future: F, duration: Duration, options: DelayOptions) -> Self {
        Delay {
            future,
            duration,
            options,
            sleep: None,
            elapsed: false,
        }
    }

    /// Consumes the `Delay` and returns the inner future.
    pub fn inner(self) -> F {
        self.future
    }
}

impl<F> Deref for Delay<F> {
    type Target = F;

    fn deref(&self) -> &Self::Target {
        &self.future
    }
}

impl<F> DerefMut for Delay<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.future
    }
}

impl<F> Future for Delay<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if !*this.elapsed {
            let options = &*this.options;
            let duration = *this.duration;
            let sleep = this
                .sleep
                .get_or_insert_with(|| options.start(duration));
            if Pin::new(sleep).poll(cx).is_pending() {
                return Poll::Pending;
            }
            trace!("delay elapsed");
            *this.elapsed = true;
            *this.sleep = None;
        }
        this.future.poll(cx)
    }
}
