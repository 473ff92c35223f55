//! Sequential, promise-style asynchronous control flow.
//!
//! `please` provides small helpers for driving asynchronous work one step at
//! a time: conditional loops, walks over collections, and a handful of value
//! utilities. Every helper is an ordinary future and works with any executor;
//! the only runtime concern the crate touches is the `futures-timer` clock
//! backing the default [`delay`].
//!
//! Features include:
//! - A [`Cursor`] that walks sequences by position and mappings by field
//!   name, one [`Step`] at a time
//! - A [`Loop`] future with `while` and `do` semantics that yields to the
//!   executor between iterations
//! - [`for_each`], [`call_each`] and [`find`], which walk a collection through
//!   the loop engine and stop at the first failure
//! - [`Deferred`], [`all_props`], [`delay`] and [`catch_as`] for working with
//!   values that may not be available yet
//!
//! Failures from caller-supplied closures and elements are returned exactly
//! as produced. The crate's own [`Error`] only covers input it cannot walk.

pub mod catch;
pub mod cursor;
pub mod deferred;
pub mod error;
pub mod iterate;
pub mod looping;
pub mod task_ext;
pub mod timing;

pub use catch::{CatchAs, catch_as, catch_as_default};
pub use cursor::{Collection, Cursor, JsonKey, Step, make_cursor};
pub use deferred::{Deferred, all_props, is_promise};
pub use error::Error;
pub use iterate::{call_each, find, for_each};
pub use looping::{Loop, Truthy, do_while, repeat, repeat_from, while_loop};
pub use timing::{
    DEFAULT_DELAY, Delay, DelayOptions, Sleep, Timer, delay, delay_default, delay_default_with,
    delay_with, yield_now,
};
