//! Scenario tests for the retry module
//!
//! These tests drive the loops with a scripted backoff and a recording
//! sleeper, and check the exact order in which attempts, backoff queries,
//! notifications and sleeps happen. The async loop is checked against the
//! same scripts on a paused tokio clock.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;

use crate::backoff::{Backoff, StopBackoff, ZeroBackoff};
use crate::retry::executor::{retry, retry_n, retry_n_notify, retry_notify, RetryExecutorBuilder};
use crate::retry::future::{retry_async, retry_n_notify_async, retry_notify_async};
use crate::retry::notify::Notify;
use crate::retry::sleep::Sleeper;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Reset,
    NotifyReset,
    Attempt(u32),
    Next,
    Notify(&'static str, Duration),
    Sleep(Duration),
}

type Log = Rc<RefCell<Vec<Event>>>;

/// Hands out a fixed list of waits, then stops
struct ScriptedBackoff {
    script: Vec<Option<Duration>>,
    cursor: usize,
    log: Log,
}

impl ScriptedBackoff {
    fn new(script: Vec<Option<Duration>>, log: &Log) -> Self {
        Self {
            script,
            cursor: 0,
            log: log.clone(),
        }
    }

    fn endless(wait: Duration, log: &Log) -> Self {
        Self::new(vec![Some(wait); 64], log)
    }
}

impl Backoff for ScriptedBackoff {
    fn reset(&mut self) {
        self.cursor = 0;
        self.log.borrow_mut().push(Event::Reset);
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.log.borrow_mut().push(Event::Next);
        let wait = self.script.get(self.cursor).copied().flatten();
        self.cursor += 1;
        wait
    }
}

struct LogSleeper(Log);

impl Sleeper for LogSleeper {
    fn sleep(&mut self, wait: Duration) {
        self.0.borrow_mut().push(Event::Sleep(wait));
    }
}

struct LogNotify(Log);

impl Notify<&'static str> for LogNotify {
    fn notify(&mut self, err: &&'static str, wait: Duration) {
        self.0.borrow_mut().push(Event::Notify(*err, wait));
    }
}

/// Records only the per-call observer reset
struct ResetLogNotify(Log);

impl Notify<&'static str> for ResetLogNotify {
    fn notify(&mut self, _err: &&'static str, _wait: Duration) {}

    fn reset(&mut self) {
        self.0.borrow_mut().push(Event::NotifyReset);
    }
}

/// Fails with each scripted error in turn, then succeeds
fn scripted_operation(
    errors: Vec<&'static str>,
    log: &Log,
) -> impl FnMut() -> Result<u32, &'static str> {
    let log = log.clone();
    let mut attempt = 0u32;
    move || {
        attempt += 1;
        log.borrow_mut().push(Event::Attempt(attempt));
        match errors.get(attempt as usize - 1) {
            Some(err) => Err(*err),
            None => Ok(attempt),
        }
    }
}

/// Async wrapper over `scripted_operation`; the attempt is logged when the
/// loop calls the operation
fn scripted_async_operation(
    errors: Vec<&'static str>,
    log: &Log,
) -> impl FnMut() -> std::future::Ready<Result<u32, &'static str>> {
    let mut operation = scripted_operation(errors, log);
    move || std::future::ready(operation())
}

fn count(log: &Log, pred: impl Fn(&Event) -> bool) -> usize {
    log.borrow().iter().filter(|e| pred(e)).count()
}

fn cap(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_notifications_in_order_then_success() {
    let log = Log::default();
    let backoff = ScriptedBackoff::new(vec![Some(ms(10)), Some(ms(20))], &log);

    let result = RetryExecutorBuilder::new(backoff)
        .with_notify(LogNotify(log.clone()))
        .with_sleeper(LogSleeper(log.clone()))
        .build()
        .execute(scripted_operation(vec!["e1", "e2"], &log));

    assert_eq!(result, Ok(3));
    assert_eq!(
        *log.borrow(),
        vec![
            Event::Reset,
            Event::Attempt(1),
            Event::Next,
            Event::Notify("e1", ms(10)),
            Event::Sleep(ms(10)),
            Event::Attempt(2),
            Event::Next,
            Event::Notify("e2", ms(20)),
            Event::Sleep(ms(20)),
            Event::Attempt(3),
        ]
    );

    let slept: Duration = log
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Sleep(wait) => Some(*wait),
            _ => None,
        })
        .sum();
    assert_eq!(slept, ms(30));
}

#[test]
fn test_first_attempt_success_touches_nothing() {
    let log = Log::default();
    let backoff = ScriptedBackoff::endless(ms(5), &log);

    let result = RetryExecutorBuilder::new(backoff)
        .with_notify(LogNotify(log.clone()))
        .with_sleeper(LogSleeper(log.clone()))
        .build()
        .execute(scripted_operation(vec![], &log));

    assert_eq!(result, Ok(1));
    assert_eq!(*log.borrow(), vec![Event::Reset, Event::Attempt(1)]);
}

#[test]
fn test_immediate_stop_returns_first_error() {
    let log = Log::default();
    let backoff = ScriptedBackoff::new(vec![None], &log);

    let result = RetryExecutorBuilder::new(backoff)
        .with_notify(LogNotify(log.clone()))
        .with_sleeper(LogSleeper(log.clone()))
        .build()
        .execute(scripted_operation(vec!["e1", "e2"], &log));

    assert_eq!(result, Err("e1"));
    assert_eq!(
        *log.borrow(),
        vec![Event::Reset, Event::Attempt(1), Event::Next]
    );
}

#[test]
fn test_cap_of_three_returns_third_error() {
    let log = Log::default();
    let backoff = ScriptedBackoff::endless(ms(1), &log);

    let result = RetryExecutorBuilder::new(backoff)
        .with_notify(LogNotify(log.clone()))
        .with_sleeper(LogSleeper(log.clone()))
        .with_max_attempts(cap(3))
        .build()
        .execute(scripted_operation(vec!["e1", "e2", "e3", "e4"], &log));

    assert_eq!(result, Err("e3"));
    assert_eq!(count(&log, |e| matches!(e, Event::Attempt(_))), 3);
    assert_eq!(count(&log, |e| matches!(e, Event::Notify(..))), 2);
    assert_eq!(count(&log, |e| matches!(e, Event::Sleep(_))), 2);
    assert_eq!(log.borrow().last(), Some(&Event::Attempt(3)));
}

#[test]
fn test_stop_before_cap() {
    let log = Log::default();
    let backoff = ScriptedBackoff::new(vec![Some(ms(1)), None], &log);

    let result = RetryExecutorBuilder::new(backoff)
        .with_sleeper(LogSleeper(log.clone()))
        .with_max_attempts(cap(10))
        .build()
        .execute(scripted_operation(vec!["e1", "e2", "e3"], &log));

    assert_eq!(result, Err("e2"));
    assert_eq!(count(&log, |e| matches!(e, Event::Attempt(_))), 2);
}

// ============================================================================
// Reset discipline
// ============================================================================

#[test]
fn test_reset_once_per_call_before_first_attempt() {
    let log = Log::default();
    let mut backoff = ScriptedBackoff::endless(ms(1), &log);

    for _ in 0..3 {
        let result = RetryExecutorBuilder::new(&mut backoff)
            .with_sleeper(LogSleeper(log.clone()))
            .build()
            .execute(scripted_operation(vec!["e1"], &log));
        assert_eq!(result, Ok(2));
    }

    assert_eq!(count(&log, |e| *e == Event::Reset), 3);
    let events = log.borrow();
    for (i, event) in events.iter().enumerate() {
        if *event == Event::Attempt(1) {
            assert_eq!(events[i - 1], Event::Reset);
        }
    }
}

#[test]
fn test_reused_backoff_restarts_its_script() {
    let log = Log::default();
    let mut backoff = ScriptedBackoff::new(vec![Some(ms(1)), None], &log);

    let first = retry_n(cap(5), &mut backoff, scripted_operation(vec!["a"; 5], &log));
    let second = retry_n(cap(5), &mut backoff, scripted_operation(vec!["b"; 5], &log));

    // Each call gets one retry before the script stops it
    assert_eq!(first, Err("a"));
    assert_eq!(second, Err("b"));
    assert_eq!(count(&log, |e| matches!(e, Event::Attempt(_))), 4);
}

#[test]
fn test_observer_reset_once_per_call_before_first_attempt() {
    let log = Log::default();
    let mut executor = RetryExecutorBuilder::new(ScriptedBackoff::endless(ms(1), &log))
        .with_notify(ResetLogNotify(log.clone()))
        .with_sleeper(LogSleeper(log.clone()))
        .build();

    for _ in 0..2 {
        let result = executor.execute(scripted_operation(vec!["e1"], &log));
        assert_eq!(result, Ok(2));
    }

    let events = log.borrow();
    assert_eq!(count(&log, |e| *e == Event::NotifyReset), 2);
    for (i, event) in events.iter().enumerate() {
        if *event == Event::Attempt(1) {
            assert_eq!(events[i - 1], Event::NotifyReset);
        }
    }
}

// ============================================================================
// At-least-once
// ============================================================================

#[test]
fn test_operation_runs_even_with_stop_backoff() {
    let mut calls = 0;
    let result: Result<(), &str> = retry(
        || {
            calls += 1;
            Err("nope")
        },
        StopBackoff,
    );
    assert_eq!(result, Err("nope"));
    assert_eq!(calls, 1);

    let mut calls = 0;
    let result: Result<(), &str> = retry_n(cap(5), StopBackoff, || {
        calls += 1;
        Err("nope")
    });
    assert_eq!(result, Err("nope"));
    assert_eq!(calls, 1);
}

// ============================================================================
// Free functions
// ============================================================================

#[test]
fn test_retry_notify_closure_observer() {
    let mut seen = Vec::new();
    let mut attempts = 0;

    let result = retry_notify(
        || {
            attempts += 1;
            if attempts < 3 {
                Err(format!("failure {}", attempts))
            } else {
                Ok(())
            }
        },
        ZeroBackoff,
        |err: &String, wait: Duration| seen.push((err.clone(), wait)),
    );

    assert!(result.is_ok());
    assert_eq!(
        seen,
        vec![
            ("failure 1".to_string(), Duration::ZERO),
            ("failure 2".to_string(), Duration::ZERO),
        ]
    );
}

#[test]
#[should_panic(expected = "observer exploded")]
fn test_observer_panic_propagates() {
    let _: Result<(), &str> = retry_notify(
        || Err("fail"),
        ZeroBackoff,
        |_err: &&str, _wait: Duration| panic!("observer exploded"),
    );
}

#[test]
fn test_observer_panic_stops_further_attempts() {
    let mut calls = 0;
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: Result<(), &str> = retry_notify(
            || {
                calls += 1;
                Err("fail")
            },
            ZeroBackoff,
            |_err: &&str, _wait: Duration| panic!("observer exploded"),
        );
    }));

    assert!(outcome.is_err());
    assert_eq!(calls, 1);
}

// ============================================================================
// Async loop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_async_notifications_in_order_before_each_wait() {
    let log = Log::default();
    let start = tokio::time::Instant::now();
    let mut notified_at = Vec::new();

    let notify_log = log.clone();
    let result = retry_notify_async(
        scripted_async_operation(vec!["e1", "e2"], &log),
        ScriptedBackoff::new(vec![Some(ms(10)), Some(ms(20))], &log),
        |err: &&'static str, wait: Duration| {
            notify_log.borrow_mut().push(Event::Notify(*err, wait));
            notified_at.push(start.elapsed());
        },
    )
    .await;

    assert_eq!(result, Ok(3));
    assert_eq!(
        *log.borrow(),
        vec![
            Event::Reset,
            Event::Attempt(1),
            Event::Next,
            Event::Notify("e1", ms(10)),
            Event::Attempt(2),
            Event::Next,
            Event::Notify("e2", ms(20)),
            Event::Attempt(3),
        ]
    );

    // Each notification lands before the wait it announces
    assert!(notified_at[0] < ms(10));
    assert!(notified_at[1] >= ms(10) && notified_at[1] < ms(30));
    assert!(start.elapsed() >= ms(30));
}

#[tokio::test(start_paused = true)]
async fn test_async_first_attempt_success_touches_nothing() {
    let log = Log::default();
    let start = tokio::time::Instant::now();

    let result = retry_notify_async(
        scripted_async_operation(vec![], &log),
        ScriptedBackoff::endless(ms(5), &log),
        LogNotify(log.clone()),
    )
    .await;

    assert_eq!(result, Ok(1));
    assert_eq!(*log.borrow(), vec![Event::Reset, Event::Attempt(1)]);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_async_immediate_stop_never_notifies() {
    let log = Log::default();
    let start = tokio::time::Instant::now();

    let result = retry_notify_async(
        scripted_async_operation(vec!["e1", "e2"], &log),
        ScriptedBackoff::new(vec![None], &log),
        LogNotify(log.clone()),
    )
    .await;

    assert_eq!(result, Err("e1"));
    assert_eq!(
        *log.borrow(),
        vec![Event::Reset, Event::Attempt(1), Event::Next]
    );
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_async_cap_of_three_returns_third_error() {
    let log = Log::default();

    let result = retry_n_notify_async(
        cap(3),
        ScriptedBackoff::endless(ms(1), &log),
        LogNotify(log.clone()),
        scripted_async_operation(vec!["e1", "e2", "e3", "e4"], &log),
    )
    .await;

    assert_eq!(result, Err("e3"));
    assert_eq!(count(&log, |e| matches!(e, Event::Attempt(_))), 3);
    assert_eq!(count(&log, |e| matches!(e, Event::Notify(..))), 2);
    assert_eq!(log.borrow().last(), Some(&Event::Attempt(3)));
}

#[tokio::test(start_paused = true)]
async fn test_async_reset_once_per_call_before_first_attempt() {
    let log = Log::default();
    let mut backoff = ScriptedBackoff::endless(ms(1), &log);

    for _ in 0..3 {
        let result = retry_async(scripted_async_operation(vec!["e1"], &log), &mut backoff).await;
        assert_eq!(result, Ok(2));
    }

    assert_eq!(count(&log, |e| *e == Event::Reset), 3);
    let events = log.borrow();
    for (i, event) in events.iter().enumerate() {
        if *event == Event::Attempt(1) {
            assert_eq!(events[i - 1], Event::Reset);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_async_observer_reset_before_first_attempt() {
    let log = Log::default();

    let result = retry_notify_async(
        scripted_async_operation(vec!["e1"], &log),
        ScriptedBackoff::endless(ms(1), &log),
        ResetLogNotify(log.clone()),
    )
    .await;

    assert_eq!(result, Ok(2));
    assert_eq!(
        log.borrow()[..3],
        [Event::Reset, Event::NotifyReset, Event::Attempt(1)]
    );
}

// ============================================================================
// Attempt-cap property
// ============================================================================

proptest! {
    #[test]
    fn prop_cap_bounds_attempts(n in 1u32..40) {
        let mut calls = 0u32;
        let mut notified = 0u32;

        let result: Result<(), u32> = retry_n_notify(
            cap(n),
            ZeroBackoff,
            |_err: &u32, _wait: Duration| notified += 1,
            || {
                calls += 1;
                Err(calls)
            },
        );

        prop_assert_eq!(result, Err(n));
        prop_assert_eq!(calls, n);
        prop_assert_eq!(notified, n - 1);
    }
}
