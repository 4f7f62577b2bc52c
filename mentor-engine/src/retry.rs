//! Bounded retry without backoff.
//!
//! Agent calls that may answer with unusable output run inside a
//! [`RetryPolicy`]. Each attempt decides for itself whether its result is
//! accepted, worth another try, or fatal.

use std::future::Future;
use tracing::debug;

/// Which attempt is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptNo {
    /// 1-based attempt number
    pub number: u32,
    /// Whether no attempt follows this one
    pub is_last: bool,
}

/// The verdict of a single attempt.
#[derive(Debug)]
pub enum Attempt<T, E> {
    /// Use this result
    Accept(T),
    /// Try again if attempts remain
    Retry(E),
    /// Stop immediately
    Abort(E),
}

/// Why a retried operation produced no result.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt asked for a retry
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: E },

    /// An attempt aborted
    #[error("attempt {attempt} aborted: {error}")]
    Aborted { attempt: u32, error: E },
}

impl<E> RetryError<E> {
    /// The error of the final attempt.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Aborted { error, .. } => error,
        }
    }
}

/// A fixed attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `attempt` until it accepts, aborts, or the budget is spent.
    pub async fn run<T, E, F, Fut>(&self, mut attempt: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(AttemptNo) -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
        E: std::fmt::Display,
    {
        let mut number = 1;
        loop {
            let current = AttemptNo {
                number,
                is_last: number >= self.max_attempts,
            };
            match attempt(current).await {
                Attempt::Accept(value) => return Ok(value),
                Attempt::Abort(error) => {
                    return Err(RetryError::Aborted {
                        attempt: number,
                        error,
                    })
                }
                Attempt::Retry(error) if current.is_last => {
                    return Err(RetryError::Exhausted {
                        attempts: number,
                        last: error,
                    })
                }
                Attempt::Retry(error) => {
                    debug!(attempt = number, max = self.max_attempts, error = %error, "Retrying");
                    number += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_accepts_on_second_attempt() {
        let calls = Cell::new(0);
        let result: Result<u32, RetryError<String>> = RetryPolicy::new(2)
            .run(|n| {
                calls.set(calls.get() + 1);
                async move {
                    if n.number == 1 {
                        Attempt::Retry("not yet".to_string())
                    } else {
                        Attempt::Accept(n.number)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let result: Result<(), RetryError<&str>> = RetryPolicy::new(3)
            .run(|_| async { Attempt::Retry("bad") })
            .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "bad");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abort_stops_early() {
        let calls = Cell::new(0);
        let result: Result<(), RetryError<&str>> = RetryPolicy::new(5)
            .run(|_| {
                calls.set(calls.get() + 1);
                async { Attempt::Abort("fatal") }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Aborted { attempt: 1, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_still_runs_once() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.max_attempts(), 1);

        let result: Result<bool, RetryError<&str>> = policy
            .run(|n| async move { Attempt::Accept(n.is_last) })
            .await;
        assert!(result.unwrap());
    }
}
