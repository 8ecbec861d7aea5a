//! Termination conditions polled by the growth loop
//!
//! The loop asks `should_terminate` once per iteration, so an iteration that
//! is already running always finishes before a stop request is honoured.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Externally supplied stop signal
pub trait TerminationCondition {
    fn should_terminate(&mut self) -> bool;
}

impl<F> TerminationCondition for F
where
    F: FnMut() -> bool,
{
    fn should_terminate(&mut self) -> bool {
        self()
    }
}

/// Fires after a fixed number of polls
#[derive(Debug, Clone)]
pub struct IterationTermination {
    max_iterations: usize,
    polled: usize,
}

impl IterationTermination {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations, polled: 0 }
    }

    /// Number of polls that returned `false`
    pub fn iterations(&self) -> usize {
        self.polled.min(self.max_iterations)
    }
}

impl TerminationCondition for IterationTermination {
    fn should_terminate(&mut self) -> bool {
        if self.polled >= self.max_iterations {
            return true;
        }
        self.polled += 1;
        false
    }
}

/// Fires once a wall-clock deadline has passed. A timeout too large to
/// represent means the condition never fires.
#[derive(Debug, Clone)]
pub struct TimedTermination {
    deadline: Option<Instant>,
}

impl TimedTermination {
    pub fn new(timeout: Duration) -> Self {
        Self { deadline: Instant::now().checked_add(timeout) }
    }

    /// Negative or NaN seconds fire immediately; infinite ones never fire
    pub fn from_secs_f64(seconds: f64) -> Self {
        match Duration::try_from_secs_f64(seconds.max(0.0)) {
            Ok(timeout) => Self::new(timeout),
            Err(_) => Self { deadline: None },
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl TerminationCondition for TimedTermination {
    fn should_terminate(&mut self) -> bool {
        self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }
}

/// Fires when another thread raises the shared flag
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    flag: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to hand to whoever may cancel the run
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

impl TerminationCondition for CancellationFlag {
    fn should_terminate(&mut self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Fires as soon as any of the wrapped conditions fires
pub struct AnyOf {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl AnyOf {
    pub fn new(conditions: Vec<Box<dyn TerminationCondition>>) -> Self {
        Self { conditions }
    }
}

impl TerminationCondition for AnyOf {
    fn should_terminate(&mut self) -> bool {
        // every condition is polled so iteration counters stay in step
        self.conditions
            .iter_mut()
            .fold(false, |fired, c| c.should_terminate() || fired)
    }
}

/// Combine several conditions into one
pub fn any_of(conditions: Vec<Box<dyn TerminationCondition>>) -> AnyOf {
    AnyOf::new(conditions)
}
