//! Falsification Tests: Category D - Guard Interception (F036-F050)

use std::sync::Arc;

use gardefou_core::{CallArgs, Guard, Profile, ProfileConfig, ViolationHandler};
use gardefou_test::{CallRecorder, LogCapture};

fn add((a, b): (i32, i32)) -> i32 {
    a + b
}

async fn fetch(id: u32) -> String {
    format!("record-{id}")
}

/// F036: A default guard returns every result unchanged
#[test]
fn f036_transparent_by_default() {
    let guard = Guard::default();
    assert_eq!(guard.invoke(add, (20, 22)).unwrap(), 42);
    assert_eq!(guard.invoke(|s: String| s.len(), "four".to_string()).unwrap(), 4);
}

/// F037: The callable runs exactly once per accepted call
///
/// # Falsification Attempt
/// No retries, no caching: N accepted calls mean N executions.
#[test]
fn f037_no_retry_no_cache() {
    let guard = Guard::builder()
        .on_violation_duplicate_call(ViolationHandler::Warn)
        .build()
        .unwrap();
    let recorder = CallRecorder::new();
    let tracked = recorder.track(add);

    for _ in 0..5 {
        let _ = guard.invoke_named("add", &tracked, (1, 1)).unwrap();
    }
    assert_eq!(recorder.runs(), 5, "F037 FALSIFIED: execution count drifted");
}

/// F038: Async callables come back as pending futures
///
/// # Falsification Attempt
/// The guard must not await; the caller awaits the returned future.
#[tokio::test]
async fn f038_async_pass_through() {
    let guard = Guard::builder()
        .max_calls(2)
        .on_violation_max_calls(ViolationHandler::Raise)
        .build()
        .unwrap();

    let pending = guard.invoke(fetch, 1).unwrap();
    assert_eq!(guard.profile().call_count(), 1);
    assert_eq!(pending.await, "record-1");

    assert_eq!(guard.invoke(fetch, 2).unwrap().await, "record-2");
    assert!(
        guard.invoke(fetch, 3).is_err(),
        "F038 FALSIFIED: async call escaped the quota"
    );
}

/// F039: Async duplicates are detected at invocation time
#[tokio::test]
async fn f039_async_duplicate() {
    let guard = Guard::builder()
        .on_violation_duplicate_call(ViolationHandler::Raise)
        .build()
        .unwrap();

    assert_eq!(guard.invoke(fetch, 7).unwrap().await, "record-7");
    assert!(guard.invoke(fetch, 7).is_err());
}

/// F040: Warnings from async calls are logged before the future is polled
#[tokio::test]
async fn f040_async_warn_logged_eagerly() {
    let guard = Guard::builder()
        .max_calls(0)
        .on_violation_max_calls(ViolationHandler::Warn)
        .build()
        .unwrap();
    let capture = LogCapture::new();

    let pending = {
        let _scope = capture.enter();
        guard.invoke(fetch, 1).unwrap()
    };
    assert!(capture.has_warning("call quota exceeded"));
    assert_eq!(pending.await, "record-1");
}

/// F041: Explicit profile wins over settings in the builder
#[test]
fn f041_explicit_profile_wins() {
    let shared = Arc::new(Profile::new());
    let guard = Guard::builder()
        .max_calls(0)
        .profile(Arc::clone(&shared))
        .build()
        .unwrap();
    assert!(Arc::ptr_eq(guard.profile(), &shared));
    assert!(guard.invoke(add, (1, 1)).is_ok());
}

/// F042: Guards built from settings own their profile
#[test]
fn f042_owned_profile() {
    let guard = Guard::builder().max_calls(1).build().unwrap();
    assert_eq!(Arc::strong_count(guard.profile()), 1);
}

/// F043: Wrapped callables share the guard's state
#[test]
fn f043_wrap_shares_state() {
    let guard = Guard::from_config(ProfileConfig::new().with_max_calls(2));
    let guarded = guard.wrap("add", add);

    assert!(guarded.call((1, 1)).is_ok());
    assert!(guard.invoke(add, (2, 2)).is_ok());
    assert!(
        guarded.call((3, 3)).is_err(),
        "F043 FALSIFIED: wrapped callable has its own quota"
    );
}

/// F044: Prebuilt arguments take part in duplicate detection
#[test]
fn f044_invoke_with_args() {
    let guard = Guard::builder()
        .on_violation_duplicate_call(ViolationHandler::Raise)
        .build()
        .unwrap();
    let args = CallArgs::new().arg("prompt").unwrap().kwarg("n", 1).unwrap();

    assert!(guard.invoke_with("generate", &args, || ()).is_ok());
    assert!(guard.invoke_with("generate", &args, || ()).is_err());
    assert!(guard.invoke_with("summarize", &args, || ()).is_ok());
}

/// F045: Callback handlers may let the call proceed
#[test]
fn f045_callback_allows_call() {
    let recorder = CallRecorder::new();
    let notified = recorder.clone();
    let guard = Guard::builder()
        .max_calls(0)
        .on_violation_max_calls(ViolationHandler::callback(move |_| {
            notified.hit();
            Ok(())
        }))
        .build()
        .unwrap();

    assert_eq!(guard.invoke(add, (2, 2)).unwrap(), 4);
    assert_eq!(recorder.runs(), 1);
}

/// F046: Two call sites sharing one profile pool their quota
///
/// # Falsification Attempt
/// Site A consumes the only allowed call; site B must be rejected.
#[test]
fn f046_shared_profile_pools_quota() {
    let profile = Arc::new(
        Profile::builder()
            .max_calls(1)
            .on_violation(ViolationHandler::Raise)
            .build()
            .unwrap(),
    );
    let site_a = Guard::with_profile(Arc::clone(&profile));
    let site_b = Guard::with_profile(Arc::clone(&profile));

    assert!(site_a.invoke(add, (1, 1)).is_ok());
    assert!(
        site_b.invoke(add, (2, 2)).is_err(),
        "F046 FALSIFIED: shared profile did not pool the quota"
    );
}

/// F047: Guards built from equal settings do not share state
#[test]
fn f047_independent_guards() {
    let config = ProfileConfig::new()
        .with_max_calls(1)
        .with_on_violation_duplicate_call(ViolationHandler::Raise);
    let first = Guard::from_config(config.clone());
    let second = Guard::from_config(config);

    assert!(first.invoke(add, (1, 1)).is_ok());
    assert!(second.invoke(add, (1, 1)).is_ok());
    assert_eq!(first.profile().call_count(), 1);
    assert_eq!(second.profile().call_count(), 1);
}

/// F048: Clones enforce one shared window
#[test]
fn f048_clone_shares_window() {
    let guard = Guard::builder()
        .on_violation_duplicate_call(ViolationHandler::Raise)
        .build()
        .unwrap();
    let clone = guard.clone();

    assert!(guard.invoke(add, (3, 3)).is_ok());
    assert!(
        clone.invoke(add, (3, 3)).is_err(),
        "F048 FALSIFIED: clone kept its own duplicate window"
    );
}

/// F049: Explicit identities separate callables sharing a type
///
/// # Falsification Attempt
/// Two closures from one function can share a type name; naming them apart
/// must keep their duplicate windows apart.
#[test]
fn f049_named_identities() {
    let guard = Guard::builder()
        .on_violation_duplicate_call(ViolationHandler::Raise)
        .build()
        .unwrap();
    let double = |x: i32| x * 2;

    assert!(guard.invoke_named("double", double, 4).is_ok());
    assert!(guard.invoke_named("twice", double, 4).is_ok());
    assert!(guard.invoke_named("double", double, 4).is_err());
}

/// F050: A raised violation surfaces as the guard's own error type
#[test]
fn f050_violation_error_surface() {
    let guard = Guard::builder()
        .max_calls(0)
        .on_violation(ViolationHandler::Raise)
        .build()
        .unwrap();
    let err = guard.invoke(add, (1, 1)).unwrap_err();

    assert!(err.is_violation());
    assert!(err.violation().is_some());
    assert!(err.to_string().starts_with("gardefou: "));
}
