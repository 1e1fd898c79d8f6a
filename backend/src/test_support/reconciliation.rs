//! Deterministic doubles for clocks, sleeping, jitter and the accrual service.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use tokio_util::sync::CancellationToken;

use crate::domain::ports::{AccrualLookup, AccrualSource, AccrualSourceError};
use crate::domain::{BackoffJitter, OrderNumber, ReconciliationSleeper};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{what} mutex poisoned"),
    }
}

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("duration {delta:?} does not fit a TimeDelta: {error}"),
        };
        *lock(&self.0, "clock") += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Sleeper that returns immediately and remembers every requested delay.
#[derive(Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }
}

#[async_trait]
impl ReconciliationSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

/// Sleeper that fires a cancellation token instead of waking up.
///
/// Models a shutdown signal arriving while the worker waits.
pub struct CancellingSleeper {
    token: CancellationToken,
    calls: AtomicUsize,
}

impl CancellingSleeper {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReconciliationSleeper for CancellingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token.cancel();
        std::future::pending::<()>().await;
    }
}

/// Jitter that returns the base delay untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

/// Jitter that adds one millisecond per attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptOffsetJitter;

impl BackoffJitter for AttemptOffsetJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, _now: DateTime<Utc>) -> Duration {
        base + Duration::from_millis(u64::from(attempt))
    }
}

type ScriptedAnswer = Result<AccrualLookup, AccrualSourceError>;

/// Accrual source answering from per-order scripts.
///
/// Each lookup pops the next scripted answer for the order. Once a script is
/// exhausted its last answer repeats; orders without a script are unknown.
#[derive(Default)]
pub struct ScriptedAccrualSource {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedAnswer>>>,
    last: Mutex<HashMap<String, ScriptedAnswer>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAccrualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `answers` for `number`.
    #[must_use]
    pub fn with_script(self, number: &str, answers: Vec<ScriptedAnswer>) -> Self {
        self.script(number, answers);
        self
    }

    /// Queue more `answers` for `number` on a shared source.
    pub fn script(&self, number: &str, answers: Vec<ScriptedAnswer>) {
        lock(&self.scripts, "script")
            .entry(number.to_owned())
            .or_default()
            .extend(answers);
    }

    /// Order numbers looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls, "calls").clone()
    }

    pub fn calls_for(&self, number: &str) -> usize {
        lock(&self.calls, "calls")
            .iter()
            .filter(|called| called.as_str() == number)
            .count()
    }
}

#[async_trait]
impl AccrualSource for ScriptedAccrualSource {
    async fn lookup(&self, number: &OrderNumber) -> Result<AccrualLookup, AccrualSourceError> {
        let key = number.as_ref().to_owned();
        lock(&self.calls, "calls").push(key.clone());

        let next = lock(&self.scripts, "script")
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let mut last = lock(&self.last, "last answer");
        match next {
            Some(answer) => {
                last.insert(key, answer.clone());
                answer
            }
            None => last.get(&key).cloned().unwrap_or(Ok(AccrualLookup::Unknown)),
        }
    }
}
