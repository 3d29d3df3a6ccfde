//! Bounded retry for knowledge-graph calls.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SymcheckError;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Fixed-delay retry policy. No overall deadline: callers wanting one must
/// impose it around the whole call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Policy without sleeping between attempts (tests, in-memory graphs).
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    pub fn run<T, E, F>(&self, operation: &str, mut op: F) -> Result<T, SymcheckError>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!("{}: attempt {}/{} failed: {}", operation, attempt, attempts, e);
                    last_error = e.to_string();
                    if attempt < attempts && !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
            }
        }

        Err(SymcheckError::ResolutionFailed {
            operation: operation.to_string(),
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_success_short_circuits() {
        let calls = Cell::new(0);
        let result: Result<u32, SymcheckError> = RetryPolicy::immediate(3).run("op", || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(7)
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_recovers_after_transient_failures() {
        let calls = Cell::new(0);
        let result = RetryPolicy::immediate(3).run("op", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err("timeout".to_string())
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhaustion_reports_last_error() {
        let calls = Cell::new(0);
        let result: Result<(), SymcheckError> = RetryPolicy::immediate(3).run("lookup", || {
            calls.set(calls.get() + 1);
            Err(format!("failure {}", calls.get()))
        });
        match result {
            Err(SymcheckError::ResolutionFailed {
                operation,
                attempts,
                last_error,
            }) => {
                assert_eq!(operation, "lookup");
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "failure 3");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.attempts, 1);
    }
}
