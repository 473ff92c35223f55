use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::anyhow;
use futures::future;
use indexmap::IndexMap;
use please::{
    DEFAULT_DELAY, Deferred, DelayOptions, Error, all_props, catch_as, catch_as_default, delay,
    delay_default_with, delay_with, is_promise, task_ext::TaskExt, timing::Wake,
};
use serde_json::{Value, json};

#[test]
fn is_promise_tells_deferred_values_apart() {
    let pending: Deferred<i32, anyhow::Error> = Deferred::pending(future::ok(1));
    let rejected: Deferred<i32, anyhow::Error> = Deferred::rejected(anyhow!("Boom!"));
    let ready: Deferred<i32, anyhow::Error> = Deferred::ready(1);
    let callable: Deferred<i32, anyhow::Error> = Deferred::call(|| future::ok(1));

    assert!(is_promise(&pending), "In-flight future is a promise");
    assert!(is_promise(&rejected), "Rejected value is a promise");
    assert!(!is_promise(&ready), "Plain value is not a promise");
    assert!(!is_promise(&callable), "Callable is not a promise");
}

#[tokio::test(flavor = "multi_thread")]
async fn all_props_resolves_every_key() {
    let input: IndexMap<&str, Deferred<Value, anyhow::Error>> = [
        ("a", Deferred::pending(future::ok(json!(1)))),
        (
            "bb",
            Deferred::pending(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(json!(200))
            }),
        ),
        ("ccc", Deferred::ready(json!("3000"))),
    ]
    .into_iter()
    .collect();

    let results: IndexMap<&str, Value> = all_props(input).await.unwrap();
    assert_eq!(
        results.into_iter().collect::<Vec<_>>(),
        [
            ("a", json!(1)),
            ("bb", json!(200)),
            ("ccc", json!("3000")),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn all_props_fails_with_first_rejection() {
    let input: IndexMap<&str, Deferred<i32, anyhow::Error>> = [
        ("a", Deferred::ready(1)),
        ("bb", Deferred::pending(future::err(anyhow!("\"bb\" rejected")))),
        ("ccc", Deferred::pending(future::err(anyhow!("\"ccc\" rejected")))),
    ]
    .into_iter()
    .collect();

    let results: anyhow::Result<IndexMap<&str, i32>> = all_props(input).await;
    assert_eq!(results.unwrap_err().to_string(), "\"bb\" rejected");
}

#[tokio::test(flavor = "multi_thread")]
async fn all_props_requires_a_collection() {
    let results: anyhow::Result<IndexMap<&str, i32>> =
        all_props(None::<IndexMap<&str, i32>>).await;

    let err = results.unwrap_err();
    assert_eq!(err.to_string(), "\"promises\" must be an object");
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::InvalidArgument { name: "promises" })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn catch_as_passes_through_resolved_values() {
    let value = catch_as(future::ok::<_, anyhow::Error>(1337), 100).await;
    assert_eq!(value, 1337);

    let value = catch_as(Deferred::<_, anyhow::Error>::ready(8585), 100).await;
    assert_eq!(value, 8585);
}

#[tokio::test(flavor = "multi_thread")]
async fn catch_as_replaces_rejections() {
    let value = catch_as(future::err::<i32, _>(anyhow!("Boom!")), 300).await;
    assert_eq!(value, 300);
}

#[tokio::test(flavor = "multi_thread")]
async fn catch_as_default_falls_back_to_default() {
    let value: Option<i32> = catch_as_default(future::err(anyhow!("Boom!"))).await;
    assert_eq!(value, None);

    let value: i32 = catch_as_default(future::err(Error::InvalidArgument { name: "x" })).await;
    assert_eq!(value, 0, "Any error kind is absorbed");
}

#[tokio::test(flavor = "multi_thread")]
async fn catch_as_operator_wraps_futures() {
    let value = async { Err::<u8, _>(anyhow!("Boom!")) }.catch_as(42).await;
    assert_eq!(value, 42);

    let value = async { Ok::<u8, anyhow::Error>(7) }.catch_as(42).await;
    assert_eq!(value, 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn delay_uses_configured_timer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_cl = Arc::clone(&calls);
    let timer = move |duration: Duration, wake: Wake| {
        assert_eq!(
            duration,
            Duration::from_secs(60),
            "Timer should get the requested duration"
        );
        calls_cl.fetch_add(1, Ordering::Relaxed);
        wake();
    };

    let options = DelayOptions::new().timer(timer);
    delay_with(Duration::from_secs(60), &options).await;

    assert_eq!(calls.load(Ordering::Relaxed), 1, "Timer should be called once");
}

#[tokio::test(flavor = "multi_thread")]
async fn delay_default_schedules_the_default_duration() {
    let scheduled = Arc::new(Mutex::new(Vec::new()));
    let scheduled_cl = Arc::clone(&scheduled);
    let timer = move |duration: Duration, wake: Wake| {
        scheduled_cl.lock().unwrap().push(duration);
        wake();
    };

    let options = DelayOptions::new().timer(timer);
    delay_default_with(&options).await;

    assert_eq!(*scheduled.lock().unwrap(), [DEFAULT_DELAY]);
    assert_eq!(DEFAULT_DELAY, Duration::from_secs(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn short_delay_is_not_held_up_by_long_ones() {
    let long: Vec<_> = (0..8).map(|_| delay(Duration::from_secs(3))).collect();
    let before = Instant::now();

    delay(Duration::from_millis(20)).await;

    let elapsed = before.elapsed();
    assert!(elapsed >= Duration::from_millis(20), "Delay should not settle early");
    assert!(
        elapsed < Duration::from_millis(500),
        "Short delay took {elapsed:?} with long delays pending"
    );
    drop(long);
}

#[tokio::test(flavor = "multi_thread")]
async fn delay_waits_for_the_duration() {
    let before = Instant::now();
    delay(Duration::from_millis(20)).await;
    assert!(
        before.elapsed() >= Duration::from_millis(20),
        "Delay should not settle early"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn delay_operator_defers_start() {
    let started = Arc::new(AtomicUsize::new(0));
    let started_cl = Arc::clone(&started);
    let before = Instant::now();

    let value = async move {
        started_cl.fetch_add(1, Ordering::Relaxed);
        "done"
    }
    .delay(Duration::from_millis(15))
    .await;

    assert_eq!(value, "done");
    assert_eq!(started.load(Ordering::Relaxed), 1);
    assert!(before.elapsed() >= Duration::from_millis(15));
}
