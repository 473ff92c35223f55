//! Sequential walks over collections, built on the loop engine.
//!
//! Each helper pairs a [`Cursor`](crate::Cursor) with a [`Loop`](crate::Loop):
//! the action pulls the next step and the condition stops the loop as soon as
//! the cursor reports exhaustion. Elements are visited one at a time, in
//! enumeration order, and the first failure ends the walk.

use futures::{
    TryFutureExt,
    future::{self, Either},
};
use tracing::debug;

use crate::{Collection, Deferred, Error, do_while, make_cursor, while_loop};

/// Loop value threaded through a walk.
///
/// `Stop` marks the end of input. It is a variant of its own so that no
/// element, however falsy or empty, can be mistaken for it.
enum Pull<A> {
    Next(A),
    Stop(A),
}

impl<A> Pull<A> {
    fn is_stop(&self) -> bool {
        matches!(self, Pull::Stop(_))
    }

    fn into_inner(self) -> A {
        match self {
            Pull::Next(inner) | Pull::Stop(inner) => inner,
        }
    }
}

/// Runs `action` on every element of `collection`, one after another.
///
/// The action receives each value together with its key and is awaited
/// before the next element is pulled. Its results are discarded. The first
/// failing action fails the whole walk, and later elements are never
/// visited.
pub async fn for_each<C, F, Fut, R, E>(collection: C, mut action: F) -> Result<(), E>
where
    C: Collection,
    F: FnMut(C::Value, C::Key) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: From<Error>,
{
    let mut cursor = make_cursor(collection)?;
    debug!(total = cursor.total(), "for_each started");
    while_loop(
        future::ok(Pull::Next(())),
        |pull: &Pull<()>, _| future::ok(!pull.is_stop()),
        |_, _| {
            let pending = cursor
                .take_next()
                .map(|step| action(step.value, step.key));
            async move {
                match pending {
                    None => Ok::<_, E>(Pull::Stop(())),
                    Some(pending) => {
                        pending.await?;
                        Ok(Pull::Next(()))
                    }
                }
            }
        },
    )
    .await?;
    Ok(())
}

/// Resolves every element of `collection` in order and collects the results.
///
/// Callable elements are invoked with no arguments and their futures
/// awaited; pending elements are awaited; ready elements are taken as they
/// are. The first failure fails the whole call.
pub async fn call_each<C, T, E>(collection: C) -> Result<Vec<T>, E>
where
    C: Collection,
    C::Value: Into<Deferred<T, E>>,
    E: From<Error>,
{
    let mut cursor = make_cursor(collection)?;
    let total = cursor.total();
    debug!(total, "call_each started");
    let done = while_loop(
        future::ok(Pull::Next(Vec::with_capacity(total))),
        |pull: &Pull<Vec<T>>, _| future::ok(!pull.is_stop()),
        |pull: Pull<Vec<T>>, _| {
            let mut results = pull.into_inner();
            let element: Option<Deferred<T, E>> =
                cursor.take_next().map(|step| step.value.into());
            async move {
                match element {
                    None => Ok::<_, E>(Pull::Stop(results)),
                    Some(element) => {
                        results.push(element.await?);
                        Ok(Pull::Next(results))
                    }
                }
            }
        },
    )
    .await?;
    Ok(done.into_inner())
}

/// Returns the first element of `collection` that satisfies `condition`.
///
/// Pending elements are resolved before the condition sees them. The walk
/// stops at the first match, so later elements are never resolved. Resolves
/// to `None` when nothing matches or the collection is empty.
pub async fn find<C, F, CF, T, E>(collection: C, mut condition: F) -> Result<Option<T>, E>
where
    C: Collection,
    C::Value: Into<Deferred<T, E>>,
    F: FnMut(&T, &C::Key) -> CF,
    CF: Future<Output = Result<bool, E>>,
    E: From<Error>,
{
    let mut cursor = make_cursor(collection)?;
    debug!(total = cursor.total(), "find started");
    let done = do_while(
        future::ok(Pull::Next(None)),
        |pull: &Pull<Option<(C::Key, T)>>, _| match pull {
            Pull::Next(Some((key, value))) => {
                Either::Left(condition(value, key).map_ok(|matched| !matched))
            }
            _ => Either::Right(future::ok(false)),
        },
        |_, _| {
            let element: Option<(C::Key, Deferred<T, E>)> = cursor
                .take_next()
                .map(|step| (step.key, step.value.into()));
            async move {
                match element {
                    None => Ok::<_, E>(Pull::Stop(None)),
                    Some((key, element)) => {
                        let value = element.await?;
                        Ok(Pull::Next(Some((key, value))))
                    }
                }
            }
        },
    )
    .await?;
    Ok(done.into_inner().map(|(_, value)| value))
}
