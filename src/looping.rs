//! Conditional loops expressed as a single future.
//!
//! A [`Loop`] threads a value through repeated condition checks and actions.
//! Each step runs strictly after the previous one has fully resolved, and the
//! loop hands control back to the executor between an action and the next
//! condition check, so thousands of iterations neither grow the stack nor
//! starve other tasks.
//!
//! Four entry points build the same machine:
//! - [`while_loop`] checks the condition before every action.
//! - [`do_while`] runs the first action unconditionally.
//! - [`repeat`] loops on an action alone, starting from `T::default()`.
//! - [`repeat_from`] loops on an action alone, starting from a given seed.
//!
//! Conditions receive the current value by reference and return a future of
//! `Result<bool, E>`. That future must not borrow the value, which is the same
//! contract as `TryStreamExt::try_filter`. Wrap synchronous answers in
//! [`future::ok`].

use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures::future::{self, Ready};
use pin_project_lite::pin_project;
use tracing::{debug, trace};

use crate::timing::{YieldNow, yield_now};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    While,
    Do,
}

pin_project! {
    #[project = StateProj]
    #[project_replace = StateProjReplace]
    enum State<T, S, CF, AF> {
        Seeding {
            #[pin]
            future: S,
        },
        Checking {
            #[pin]
            future: CF,
            value: T,
        },
        Acting {
            #[pin]
            future: AF,
        },
        Yielding {
            pause: YieldNow,
            value: T,
        },
        Done,
    }
}

pin_project! {
    /// Future driving a conditional loop. Created by [`while_loop`],
    /// [`do_while`], [`repeat`] or [`repeat_from`].
    ///
    /// Resolves to the value produced by the last action, or to the seed when
    /// a `while` loop's first check already fails. The first failure from the
    /// seed, a condition or an action ends the loop and is returned as is.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Loop<T, S, C, CF, A, AF> {
        #[pin]
        state: State<T, S, CF, AF>,
        condition: C,
        action: A,
        mode: Mode,
        steps: usize,
    }
}

impl<T, S, C, CF, A, AF> Loop<T, S, C, CF, A, AF> {
    fn new(mode: Mode, seed: S, condition: C, action: A) -> Self {
        Loop {
            state: State::Seeding { future: seed },
            condition,
            action,
            mode,
            steps: 0,
        }
    }

    /// Number of actions completed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl<T, S, C, CF, A, AF> fmt::Debug for Loop<T, S, C, CF, A, AF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loop")
            .field("mode", &self.mode)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

// Picks the state that follows a freshly produced value: the first `do`
// action runs unchecked, everything else goes through the condition.
fn enter<T, S, C, CF, A, AF>(
    mode: Mode,
    steps: usize,
    value: T,
    condition: &mut C,
    action: &mut A,
) -> State<T, S, CF, AF>
where
    C: FnMut(&T, usize) -> CF,
    A: FnMut(T, usize) -> AF,
{
    match mode {
        Mode::Do if steps == 0 => State::Acting {
            future: action(value, 0),
        },
        Mode::Do => State::Checking {
            future: condition(&value, steps - 1),
            value,
        },
        Mode::While => State::Checking {
            future: condition(&value, steps),
            value,
        },
    }
}

impl<T, E, S, C, CF, A, AF> Future for Loop<T, S, C, CF, A, AF>
where
    S: Future<Output = Result<T, E>>,
    C: FnMut(&T, usize) -> CF,
    CF: Future<Output = Result<bool, E>>,
    A: FnMut(T, usize) -> AF,
    AF: Future<Output = Result<T, E>>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        loop {
            match this.state.as_mut().project() {
                StateProj::Seeding { future } => {
                    let seeded = ready!(future.poll(cx));
                    this.state.set(State::Done);
                    let value = seeded?;
                    debug!(mode = ?this.mode, "loop started");
                    let next = enter(*this.mode, 0, value, this.condition, this.action);
                    this.state.set(next);
                }
                StateProj::Checking { future, .. } => {
                    let verdict = ready!(future.poll(cx));
                    let value = match this.state.as_mut().project_replace(State::Done) {
                        StateProjReplace::Checking { value, .. } => value,
                        _ => unreachable!(),
                    };
                    if !verdict? {
                        debug!(steps = *this.steps, "loop finished");
                        return Poll::Ready(Ok(value));
                    }
                    let future = (this.action)(value, *this.steps);
                    this.state.set(State::Acting { future });
                }
                StateProj::Acting { future } => {
                    let produced = ready!(future.poll(cx));
                    this.state.set(State::Done);
                    let value = produced?;
                    *this.steps += 1;
                    trace!(steps = *this.steps, "loop step completed");
                    this.state.set(State::Yielding {
                        pause: yield_now(),
                        value,
                    });
                }
                StateProj::Yielding { pause, .. } => {
                    ready!(Pin::new(pause).poll(cx));
                    let value = match this.state.as_mut().project_replace(State::Done) {
                        StateProjReplace::Yielding { value, .. } => value,
                        _ => unreachable!(),
                    };
                    let next = enter(*this.mode, *this.steps, value, this.condition, this.action);
                    this.state.set(next);
                }
                StateProj::Done => panic!("`Loop` polled after completion"),
            }
        }
    }
}

/// Runs `action` for as long as `condition` holds, checking before every action.
///
/// `initial` seeds the loop. Pass [`future::ok`] for a plain value, or any
/// future (for example a call to an `async fn`) to have the seed produced
/// and awaited once before the first check.
///
/// The condition sees the current value and the number of actions completed
/// so far; the action consumes the value and produces the next one.
///
/// ```
/// # futures::executor::block_on(async {
/// use futures::future;
///
/// let value: Result<i32, ()> = please::while_loop(
///     future::ok(10),
///     |value: &i32, _| future::ok(*value > 0),
///     |value, _| future::ok(value - 1),
/// )
/// .await;
/// assert_eq!(value, Ok(0));
/// # });
/// ```
pub fn while_loop<T, E, S, C, CF, A, AF>(
    initial: S,
    condition: C,
    action: A,
) -> Loop<T, S::IntoFuture, C, CF, A, AF>
where
    S: IntoFuture<Output = Result<T, E>>,
    C: FnMut(&T, usize) -> CF,
    CF: Future<Output = Result<bool, E>>,
    A: FnMut(T, usize) -> AF,
    AF: Future<Output = Result<T, E>>,
{
    Loop::new(Mode::While, initial.into_future(), condition, action)
}

/// Like [`while_loop`], but the first action runs before any check.
///
/// The condition is first consulted on the value produced by that first
/// action, and is handed index `0` at that point.
pub fn do_while<T, E, S, C, CF, A, AF>(
    initial: S,
    condition: C,
    action: A,
) -> Loop<T, S::IntoFuture, C, CF, A, AF>
where
    S: IntoFuture<Output = Result<T, E>>,
    C: FnMut(&T, usize) -> CF,
    CF: Future<Output = Result<bool, E>>,
    A: FnMut(T, usize) -> AF,
    AF: Future<Output = Result<T, E>>,
{
    Loop::new(Mode::Do, initial.into_future(), condition, action)
}

/// Condition used by [`repeat`] and [`repeat_from`].
pub type TruthyCheck<T, E> = fn(&T, usize) -> Ready<Result<bool, E>>;

/// Loop returned by [`repeat`] and [`repeat_from`].
pub type Repeat<T, E, S, A, AF> = Loop<T, S, TruthyCheck<T, E>, Ready<Result<bool, E>>, A, AF>;

fn first_or_truthy<T: Truthy, E>(value: &T, index: usize) -> Ready<Result<bool, E>> {
    future::ok(index == 0 || value.is_truthy())
}

fn truthy<T: Truthy, E>(value: &T, _index: usize) -> Ready<Result<bool, E>> {
    future::ok(value.is_truthy())
}

/// Runs `action` starting from `T::default()` until it produces a falsy value.
///
/// The first action always runs, even though the default value is usually
/// falsy. The same loop written with `do` semantics behaves identically.
pub fn repeat<T, E, A, AF>(action: A) -> Repeat<T, E, Ready<Result<T, E>>, A, AF>
where
    T: Default + Truthy,
    A: FnMut(T, usize) -> AF,
    AF: Future<Output = Result<T, E>>,
{
    Loop::new(
        Mode::While,
        future::ok(T::default()),
        first_or_truthy::<T, E> as TruthyCheck<T, E>,
        action,
    )
}

/// Runs `action` while the running value is truthy, starting from `initial`.
///
/// A falsy seed resolves immediately without running the action.
pub fn repeat_from<T, E, S, A, AF>(initial: S, action: A) -> Repeat<T, E, S::IntoFuture, A, AF>
where
    T: Truthy,
    S: IntoFuture<Output = Result<T, E>>,
    A: FnMut(T, usize) -> AF,
    AF: Future<Output = Result<T, E>>,
{
    Loop::new(
        Mode::While,
        initial.into_future(),
        truthy::<T, E> as TruthyCheck<T, E>,
        action,
    )
}

/// Truthiness of a loop value, as used by [`repeat`] and [`repeat_from`].
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

macro_rules! truthy_int {
    ($($ty:ty),*) => {
        $(
            impl Truthy for $ty {
                fn is_truthy(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

truthy_int!(i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize);

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for () {
    fn is_truthy(&self) -> bool {
        false
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

/// JavaScript rules: arrays and objects are always truthy.
impl Truthy for serde_json::Value {
    fn is_truthy(&self) -> bool {
        use serde_json::Value;

        match self {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number.as_f64().is_some_and(|n| n.is_truthy()),
            Value::String(text) => !text.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}
