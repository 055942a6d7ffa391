//! Dependency Readiness Gate
//!
//! Startup-only bounded-retry probe. Each dependency moves through
//! `Probing(1..=N) -> Ready | Failed`; a failure is fatal to startup. Once a
//! dependency is ready nothing re-probes it.
//!
//! # Example
//! ```ignore
//! let gate = ReadinessGate::new(config.gate_config());
//! gate.wait_for("postgres", || store.ping()).await?;
//! gate.wait_for("redis", || cache.ping()).await?;
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{error, info, warn};

use crate::error::ReadinessError;

/// Probe parameters, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Maximum pings per dependency
    pub attempts: u32,
    /// Delay after failed attempt `i` is `i * base_delay`
    pub base_delay: Duration,
    /// Bound on a single ping
    pub attempt_timeout: Duration,
    /// Deadline shared by every dependency probed through one gate
    pub overall_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(1),
            overall_timeout: Duration::from_secs(5),
        }
    }
}

/// Probe state of one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Probing { attempt: u32 },
    Ready { attempts: u32 },
    Failed(ReadinessError),
}

/// Runs readiness probes against a shared overall deadline.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    config: GateConfig,
    deadline: Instant,
}

impl ReadinessGate {
    /// Starts the overall deadline clock.
    pub fn new(config: GateConfig) -> Self {
        let deadline = after(config.overall_timeout);
        Self { config, deadline }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Pings `dependency` until it answers or the budget is spent.
    ///
    /// Returns the number of pings issued on success.
    pub async fn wait_for<F, Fut, E>(
        &self,
        dependency: &str,
        mut ping: F,
    ) -> Result<u32, ReadinessError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut state = GateState::Probing { attempt: 1 };
        loop {
            state = match state {
                GateState::Probing { attempt } => self.probe(dependency, attempt, &mut ping).await,
                GateState::Ready { attempts } => {
                    info!(dependency, attempts, "dependency ready");
                    return Ok(attempts);
                }
                GateState::Failed(err) => {
                    error!(dependency, error = %err, "dependency readiness failed");
                    return Err(err);
                }
            };
        }
    }

    async fn probe<F, Fut, E>(&self, dependency: &str, attempt: u32, ping: &mut F) -> GateState
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let attempt_deadline = after(self.config.attempt_timeout).min(self.deadline);
        let last_error = match timeout_at(attempt_deadline, ping()).await {
            Ok(Ok(())) => return GateState::Ready { attempts: attempt },
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!(
                "ping timed out after {:?}",
                self.config.attempt_timeout
            ),
        };

        if attempt >= self.config.attempts {
            return GateState::Failed(ReadinessError::Exhausted {
                dependency: dependency.to_string(),
                attempts: attempt,
                last_error,
            });
        }

        if Instant::now() >= self.deadline {
            return GateState::Failed(ReadinessError::DeadlineExceeded {
                dependency: dependency.to_string(),
                attempts: attempt,
                last_error,
            });
        }

        let delay = self
            .config
            .base_delay
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX);
        warn!(
            dependency,
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %last_error,
            "dependency not ready, retrying"
        );
        // Never sleep past the overall deadline.
        sleep_until(after(delay).min(self.deadline)).await;

        GateState::Probing {
            attempt: attempt + 1,
        }
    }
}

/// `now + duration`, saturating at roughly thirty years out.
fn after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config(attempts: u32) -> GateConfig {
        GateConfig {
            attempts,
            base_delay: Duration::from_millis(100),
            attempt_timeout: Duration::from_millis(50),
            overall_timeout: Duration::from_secs(60),
        }
    }

    /// Ping that fails the first `failures` calls.
    fn flaky(failures: u32) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<(), String>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let ping = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n <= failures {
                Err(format!("connection refused (call {})", n))
            } else {
                Ok(())
            })
        };
        (calls, ping)
    }

    fn assert_elapsed(started: Instant, expected: Duration) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= expected && elapsed <= expected + Duration::from_millis(5),
            "elapsed {elapsed:?}, expected about {expected:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_attempt() {
        let gate = ReadinessGate::new(config(5));
        let (calls, ping) = flaky(0);

        let started = Instant::now();
        assert_eq!(gate.wait_for("redis", ping).await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_elapsed(started, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_failures_with_linear_backoff() {
        let gate = ReadinessGate::new(config(5));
        let (calls, ping) = flaky(2);

        let started = Instant::now();
        assert_eq!(gate.wait_for("postgres", ping).await, Ok(3));

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1 * 100ms after the first failure, 2 * 100ms after the second
        assert_elapsed(started, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_after_exhausting_attempts() {
        let gate = ReadinessGate::new(config(5));
        let (calls, ping) = flaky(u32::MAX);

        let err = gate.wait_for("postgres", ping).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match err {
            ReadinessError::Exhausted {
                dependency,
                attempts,
                last_error,
            } => {
                assert_eq!(dependency, "postgres");
                assert_eq!(attempts, 5);
                assert!(last_error.contains("call 5"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_ping_is_bounded_by_attempt_timeout() {
        let gate = ReadinessGate::new(config(2));

        let started = Instant::now();
        let err = gate
            .wait_for("redis", || std::future::pending::<Result<(), String>>())
            .await
            .unwrap_err();

        assert!(matches!(err, ReadinessError::Exhausted { attempts: 2, .. }));
        // two 50ms timeouts plus one 100ms backoff
        assert_elapsed(started, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_config_spends_every_attempt() {
        let gate = ReadinessGate::new(GateConfig::default());
        let (calls, ping) = flaky(u32::MAX);

        let started = Instant::now();
        let err = gate.wait_for("postgres", ping).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(matches!(err, ReadinessError::Exhausted { attempts: 5, .. }));
        // 500 + 1000 + 1500 + 2000ms of backoff lands exactly on the 5s deadline
        assert_elapsed(started, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_deadline_stops_retries() {
        let gate = ReadinessGate::new(GateConfig {
            attempts: 10,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_millis(100),
            overall_timeout: Duration::from_secs(2),
        });
        let (calls, ping) = flaky(u32::MAX);

        let started = Instant::now();
        let err = gate.wait_for("postgres", ping).await.unwrap_err();

        // pings at 0, 500ms, 1500ms, then the 1500ms backoff is cut to the 2s deadline
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(
            err,
            ReadinessError::DeadlineExceeded { attempts: 4, .. }
        ));
        assert_elapsed(started, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_answering_at_deadline_is_ready() {
        let gate = ReadinessGate::new(GateConfig {
            attempts: 10,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_millis(100),
            overall_timeout: Duration::from_secs(2),
        });
        let (_, ping) = flaky(3);

        assert_eq!(gate.wait_for("redis", ping).await, Ok(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_shared_across_dependencies() {
        let gate = ReadinessGate::new(GateConfig {
            attempts: 5,
            base_delay: Duration::from_millis(400),
            attempt_timeout: Duration::from_millis(100),
            overall_timeout: Duration::from_secs(1),
        });

        let (_, first) = flaky(1);
        assert_eq!(gate.wait_for("postgres", first).await, Ok(2));

        // pings at 400ms and 800ms, then the 800ms backoff is cut to the 1s deadline
        let (calls, second) = flaky(u32::MAX);
        let err = gate.wait_for("redis", second).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            ReadinessError::DeadlineExceeded { attempts: 3, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_durations_do_not_overflow() {
        let unbounded = ReadinessGate::new(GateConfig {
            attempts: 3,
            base_delay: Duration::MAX,
            attempt_timeout: Duration::MAX,
            overall_timeout: Duration::MAX,
        });
        let (_, ping) = flaky(0);
        assert_eq!(unbounded.wait_for("redis", ping).await, Ok(1));

        let gate = ReadinessGate::new(GateConfig {
            attempts: 3,
            base_delay: Duration::MAX,
            attempt_timeout: Duration::from_millis(100),
            overall_timeout: Duration::from_secs(1),
        });
        let (calls, ping) = flaky(u32::MAX);

        let started = Instant::now();
        let err = gate.wait_for("redis", ping).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err,
            ReadinessError::DeadlineExceeded { attempts: 2, .. }
        ));
        assert_elapsed(started, Duration::from_secs(1));
    }
}
