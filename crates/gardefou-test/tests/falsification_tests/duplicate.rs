//! Falsification Tests: Category B - Duplicate Rule (F011-F020)

use gardefou_core::{BoxError, CallArgs, Guard, GuardError, Profile, Rule, ViolationHandler};
use gardefou_test::{CallRecorder, LogCapture};
use serde::Serialize;

fn add((a, b): (i32, i32)) -> i32 {
    a + b
}

fn mul((a, b): (i32, i32)) -> i32 {
    a * b
}

#[derive(Serialize)]
struct Search {
    query: String,
    limit: u32,
}

fn search(req: Search) -> usize {
    req.query.len() + req.limit as usize
}

fn duplicate_profile(handler: ViolationHandler) -> Profile {
    Profile::builder()
        .on_violation_duplicate_call(handler)
        .build()
        .unwrap()
}

fn bar_call() -> CallArgs {
    CallArgs::new().arg(1).unwrap().kwarg("x", 2).unwrap()
}

/// F011: A repeated identical call logs "duplicate call detected" under `warn`
///
/// # Falsification Attempt
/// `check("bar", (1,), {"x": 2})` twice must warn once and never fail.
#[test]
fn f011_duplicate_warn_logs() {
    let profile = duplicate_profile(ViolationHandler::Warn);
    let capture = LogCapture::new();

    capture.run(|| {
        assert!(profile.check("bar", &bar_call()).is_ok());
        assert!(profile.check("bar", &bar_call()).is_ok());
    });

    assert_eq!(
        capture.count_warnings("duplicate call detected"),
        1,
        "F011 FALSIFIED: expected one duplicate warning"
    );
    assert!(capture.has_warning("for bar"));
}

/// F012: Keyword order does not make a call distinct
///
/// # Falsification Attempt
/// Permute keyword arguments between two otherwise identical calls.
#[test]
fn f012_keyword_order_ignored() {
    let profile = duplicate_profile(ViolationHandler::Raise);
    let first = CallArgs::new()
        .kwarg("model", "small")
        .unwrap()
        .kwarg("prompt", "hi")
        .unwrap();
    let permuted = CallArgs::new()
        .kwarg("prompt", "hi")
        .unwrap()
        .kwarg("model", "small")
        .unwrap();

    assert!(profile.check("complete", &first).is_ok());
    assert!(
        profile.check("complete", &permuted).is_err(),
        "F012 FALSIFIED: permuted keywords escaped duplicate detection"
    );
}

/// F013: Any differing positional or keyword value makes a call distinct
///
/// # Falsification Attempt
/// Vary one value at a time, expect no duplicate.
#[test]
fn f013_differing_values_are_distinct() {
    let profile = duplicate_profile(ViolationHandler::Raise);
    let calls = [
        CallArgs::new().arg(1).unwrap().kwarg("x", 2).unwrap(),
        CallArgs::new().arg(2).unwrap().kwarg("x", 2).unwrap(),
        CallArgs::new().arg(1).unwrap().kwarg("x", 3).unwrap(),
        CallArgs::new().arg(1).unwrap().kwarg("y", 2).unwrap(),
        CallArgs::new().arg(1).unwrap().arg(2).unwrap(),
        CallArgs::new().arg(2).unwrap().arg(1).unwrap(),
        CallArgs::new(),
    ];

    for call in &calls {
        assert!(
            profile.check("bar", call).is_ok(),
            "F013 FALSIFIED: distinct call {call:?} flagged as duplicate"
        );
    }
    assert_eq!(profile.seen_count(), calls.len());
}

/// F014: Same arguments to a different callable is not a duplicate
#[test]
fn f014_identity_matters() {
    let guard = Guard::new(duplicate_profile(ViolationHandler::Raise));
    assert!(guard.invoke(add, (2, 3)).is_ok());
    assert!(guard.invoke(mul, (2, 3)).is_ok());
    assert!(guard.invoke(add, (2, 3)).is_err());
}

/// F015: A `raise` duplicate blocks the second execution
///
/// # Falsification Attempt
/// Count real executions of a duplicated call.
#[test]
fn f015_duplicate_raise_blocks_execution() {
    let guard = Guard::new(duplicate_profile(ViolationHandler::Raise));
    let recorder = CallRecorder::new();
    let tracked = recorder.track(search);
    let request = || Search {
        query: "rust".to_string(),
        limit: 10,
    };

    assert_eq!(guard.invoke_named("search", &tracked, request()).unwrap(), 14);
    let err = guard
        .invoke_named("search", &tracked, request())
        .unwrap_err();
    assert_eq!(err.rule(), Some(Rule::DuplicateCall));
    assert_eq!(recorder.runs(), 1, "F015 FALSIFIED: duplicate ran twice");
}

/// F016: A `warn` duplicate still runs the callable every time
#[test]
fn f016_duplicate_warn_never_suppresses() {
    let guard = Guard::new(duplicate_profile(ViolationHandler::Warn));
    let recorder = CallRecorder::new();
    let tracked = recorder.track(add);

    for _ in 0..4 {
        assert_eq!(guard.invoke_named("add", &tracked, (1, 1)).unwrap(), 2);
    }
    assert_eq!(recorder.runs(), 4);
    assert_eq!(guard.profile().seen_count(), 1);
}

/// F017: Quota is evaluated before duplicates
///
/// # Falsification Attempt
/// With both rules raising, the blocked call must report the quota rule.
#[test]
fn f017_quota_checked_first() {
    let guard = Guard::builder()
        .max_calls(1)
        .on_violation(ViolationHandler::Raise)
        .on_violation_duplicate_call(ViolationHandler::Raise)
        .build()
        .unwrap();

    assert!(guard.invoke(add, (1, 1)).is_ok());
    let err = guard.invoke(add, (1, 1)).unwrap_err();
    assert_eq!(
        err.rule(),
        Some(Rule::MaxCalls),
        "F017 FALSIFIED: duplicate rule ran before quota rule"
    );
}

/// F018: A `warn` quota violation does not skip duplicate detection
#[test]
fn f018_warn_quota_then_duplicate_raise() {
    let guard = Guard::builder()
        .max_calls(1)
        .on_violation_max_calls(ViolationHandler::Warn)
        .on_violation_duplicate_call(ViolationHandler::Raise)
        .build()
        .unwrap();

    assert!(guard.invoke(add, (1, 1)).is_ok());
    let err = guard.invoke(add, (1, 1)).unwrap_err();
    assert_eq!(err.rule(), Some(Rule::DuplicateCall));
}

/// F019: Duplicate detection is off unless its handler is configured
#[test]
fn f019_duplicate_rule_opt_in() {
    let guard = Guard::builder()
        .on_violation(ViolationHandler::Raise)
        .build()
        .unwrap();
    for _ in 0..3 {
        assert!(guard.invoke(add, (1, 1)).is_ok());
    }
}

/// F020: A duplicate callback's error reaches the caller unchanged
#[test]
fn f020_callback_error_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("refusing repeated call")]
    struct Refused;

    let guard = Guard::new(duplicate_profile(ViolationHandler::callback(|_| {
        Err(Box::new(Refused) as BoxError)
    })));

    assert!(guard.invoke(add, (1, 1)).is_ok());
    let err = guard.invoke(add, (1, 1)).unwrap_err();
    assert!(matches!(err, GuardError::Handler(_)));
    assert_eq!(err.to_string(), "refusing repeated call");
    assert!(err.handler_error().unwrap().downcast_ref::<Refused>().is_some());
}
