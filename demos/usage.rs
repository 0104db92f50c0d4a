//! gardefou Usage Example
//!
//! Walks through the guard policies: warn, raise, callbacks, a profile shared
//! between call sites, and async callables.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example usage
//!
//! # Show profile construction and callback dispatch as well
//! RUST_LOG=debug cargo run --example usage
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gardefou::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Stand-in for a paid API request.
#[derive(Debug, Serialize)]
struct Completion {
    prompt: String,
    max_tokens: u32,
}

fn complete(req: Completion) -> String {
    format!("[{} tokens] {}", req.max_tokens, req.prompt.to_uppercase())
}

async fn embed(text: &'static str) -> Vec<f32> {
    text.bytes().take(4).map(|b| f32::from(b) / 255.0).collect()
}

fn request(prompt: &str) -> Completion {
    Completion {
        prompt: prompt.to_string(),
        max_tokens: 32,
    }
}

fn warn_policy() -> Result<(), GuardError> {
    println!("[WARN] Quota of 2 with warn policy");
    let guard = Guard::builder()
        .max_calls(2)
        .on_violation(ViolationHandler::Warn)
        .build()?;

    for prompt in ["hello", "world", "again"] {
        let out = guard.invoke(complete, request(prompt))?;
        println!("[WARN]   {out}");
    }
    Ok(())
}

fn raise_policy() -> Result<(), GuardError> {
    println!("[RAISE] Duplicate detection with raise policy");
    let guard = Guard::builder()
        .on_violation_duplicate_call(ViolationHandler::Raise)
        .build()?;

    println!("[RAISE]   {}", guard.invoke(complete, request("hello"))?);
    match guard.invoke(complete, request("hello")) {
        Ok(out) => println!("[RAISE]   unexpected: {out}"),
        Err(err) => println!("[RAISE]   blocked: {err}"),
    }
    Ok(())
}

fn callback_policy() -> Result<(), GuardError> {
    println!("[CALLBACK] Counting quota violations");
    let violations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&violations);
    let guard = Guard::builder()
        .max_calls(1)
        .on_violation_max_calls(ViolationHandler::callback(move |profile| {
            counter.fetch_add(1, Ordering::SeqCst);
            println!("[CALLBACK]   over quota at call {}", profile.call_count());
            Ok(())
        }))
        .build()?;

    for prompt in ["one", "two", "three"] {
        guard.invoke(complete, request(prompt))?;
    }
    println!(
        "[CALLBACK]   {} violations reported",
        violations.load(Ordering::SeqCst)
    );
    Ok(())
}

fn shared_profile() -> Result<(), GuardError> {
    println!("[SHARED] Two call sites, one budget");
    let profile = Arc::new(Profile::from_config(
        ProfileConfig::new()
            .with_max_calls(1)
            .with_on_violation(ViolationHandler::Raise),
    ));
    let chat = Guard::with_profile(Arc::clone(&profile));
    let summarize = Guard::with_profile(Arc::clone(&profile));

    println!("[SHARED]   chat: {:?}", chat.invoke(complete, request("hi")).is_ok());
    println!(
        "[SHARED]   summarize: {:?}",
        summarize.invoke(complete, request("tl;dr")).is_ok()
    );
    println!("[SHARED]   calls counted: {}", profile.call_count());
    Ok(())
}

async fn async_callable() -> Result<(), GuardError> {
    println!("[ASYNC] Guarding an async function");
    let guard = Guard::builder()
        .max_calls(1)
        .on_violation(ViolationHandler::Raise)
        .build()?;

    let pending = guard.invoke(embed, "gardefou")?;
    println!("[ASYNC]   embedding: {:?}", pending.await);
    println!(
        "[ASYNC]   second call allowed: {}",
        guard.invoke(embed, "again").is_ok()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    warn_policy()?;
    raise_policy()?;
    callback_policy()?;
    shared_profile()?;
    async_callable().await?;

    Ok(())
}
