//! Generic fixed-interval retry engine for eventually-consistent reads.
//!
//! The interval is fixed rather than exponential: the side effects under
//! test settle within a roughly constant server processing window, so
//! backoff growth would only delay failure detection. Sleeping suspends
//! only the calling task; polls on different sessions interleave freely.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, VouchError};
use crate::observe::Observation;

/// Attempt and interval budget for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
	max_attempts: u32,
	interval: Duration,
}

impl PollBudget {
	/// A poll budget of `max_attempts` tries spaced `interval` apart.
	///
	/// `max_attempts` must be at least 1. A zero interval is allowed for
	/// test doubles.
	pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
		if max_attempts == 0 {
			return Err(VouchError::Config(
				"poll budget requires at least one attempt".to_string(),
			));
		}
		Ok(Self {
			max_attempts,
			interval,
		})
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}
}

impl Default for PollBudget {
	/// The notification-settling budget the original suite converged on:
	/// five attempts, three seconds apart.
	fn default() -> Self {
		Self {
			max_attempts: 5,
			interval: Duration::from_secs(3),
		}
	}
}

/// Outcome of a poll. `TimedOut` always carries the last observation
/// taken so failures are diagnosable.
#[derive(Debug, Clone)]
pub enum PollOutcome {
	Matched {
		observation: Observation,
		attempts_used: u32,
	},
	TimedOut {
		last_observation: Observation,
		attempts_used: u32,
	},
}

impl PollOutcome {
	pub fn matched(&self) -> bool {
		matches!(self, PollOutcome::Matched { .. })
	}

	pub fn attempts_used(&self) -> u32 {
		match self {
			PollOutcome::Matched { attempts_used, .. }
			| PollOutcome::TimedOut { attempts_used, .. } => *attempts_used,
		}
	}

	/// The observation from the final attempt, matched or not.
	pub fn observation(&self) -> &Observation {
		match self {
			PollOutcome::Matched { observation, .. } => observation,
			PollOutcome::TimedOut {
				last_observation, ..
			} => last_observation,
		}
	}
}

/// Repeatedly evaluates `observe` until `predicate` accepts a snapshot,
/// or the budget is exhausted.
///
/// A failed read is a non-match for that attempt, not a poller error: the
/// attempt records an [`Observation::Unavailable`] and the loop continues.
pub async fn poll<F, Fut, P>(budget: PollBudget, mut observe: F, predicate: P) -> PollOutcome
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Observation>>,
	P: Fn(&Observation) -> bool,
{
	let mut last_observation = None;

	for attempt in 1..=budget.max_attempts {
		let observation = match observe().await {
			Ok(observation) => observation,
			Err(e) => {
				debug!(
					target = "vouch",
					attempt,
					error = %e,
					"observation read failed; treating as non-match"
				);
				Observation::Unavailable {
					reason: e.to_string(),
				}
			}
		};

		if predicate(&observation) {
			return PollOutcome::Matched {
				observation,
				attempts_used: attempt,
			};
		}

		debug!(
			target = "vouch",
			attempt,
			max_attempts = budget.max_attempts,
			seen = %observation.summary(),
			"no match yet"
		);
		last_observation = Some(observation);

		if attempt < budget.max_attempts {
			tokio::time::sleep(budget.interval).await;
		}
	}

	PollOutcome::TimedOut {
		// max_attempts >= 1, so at least one attempt recorded an observation
		last_observation: last_observation.expect("at least one attempt"),
		attempts_used: budget.max_attempts,
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;
	use crate::observe::NotificationEntry;

	fn notification(text: &str) -> Observation {
		Observation::Notifications(vec![NotificationEntry {
			text: text.to_string(),
			unread: true,
		}])
	}

	#[test]
	fn zero_attempts_is_rejected() {
		let err = PollBudget::new(0, Duration::ZERO).unwrap_err();
		assert!(matches!(err, VouchError::Config(_)));
	}

	#[tokio::test]
	async fn immediate_match_uses_one_attempt() {
		let budget = PollBudget::new(5, Duration::from_secs(3)).unwrap();
		let outcome = poll(budget, || async { Ok(notification("ready")) }, |_| true).await;
		assert!(outcome.matched());
		assert_eq!(outcome.attempts_used(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn match_on_attempt_k_stops_there() {
		let budget = PollBudget::new(5, Duration::from_secs(3)).unwrap();
		let calls = Arc::new(AtomicU32::new(0));
		let observer_calls = Arc::clone(&calls);

		let outcome = poll(
			budget,
			move || {
				let calls = Arc::clone(&observer_calls);
				async move {
					let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
					Ok(Observation::Count(n as u64))
				}
			},
			|observation| observation.count() == Some(3),
		)
		.await;

		assert!(outcome.matched());
		assert_eq!(outcome.attempts_used(), 3);
		assert_eq!(calls.load(Ordering::SeqCst), 3, "no attempts after the match");
	}

	#[tokio::test(start_paused = true)]
	async fn always_false_exhausts_budget_and_keeps_last_observation() {
		let budget = PollBudget::new(4, Duration::from_secs(3)).unwrap();
		let start = tokio::time::Instant::now();

		let outcome = poll(
			budget,
			|| async { Ok(notification("still pending")) },
			|_| false,
		)
		.await;

		match &outcome {
			PollOutcome::TimedOut {
				last_observation,
				attempts_used,
			} => {
				assert_eq!(*attempts_used, 4);
				assert!(last_observation.contains_keywords(&["pending"]));
			}
			other => panic!("expected TimedOut, got {other:?}"),
		}

		// (max_attempts - 1) sleeps; no sleep after the final attempt.
		assert_eq!(start.elapsed(), Duration::from_secs(9));
	}

	#[tokio::test]
	async fn failed_reads_are_retried_not_fatal() {
		let budget = PollBudget::new(3, Duration::ZERO).unwrap();
		let calls = Arc::new(AtomicU32::new(0));
		let observer_calls = Arc::clone(&calls);

		let outcome = poll(
			budget,
			move || {
				let calls = Arc::clone(&observer_calls);
				async move {
					let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
					if n < 3 {
						Err(VouchError::JsEval("mid-navigation".to_string()))
					} else {
						Ok(notification("settled"))
					}
				}
			},
			|observation| observation.contains_keywords(&["settled"]),
		)
		.await;

		assert!(outcome.matched());
		assert_eq!(outcome.attempts_used(), 3);
	}

	#[tokio::test]
	async fn all_reads_failing_still_reports_last_observation() {
		let budget = PollBudget::new(2, Duration::ZERO).unwrap();
		let outcome = poll(
			budget,
			|| async { Err(VouchError::JsEval("gone".to_string())) },
			|_| false,
		)
		.await;

		match outcome {
			PollOutcome::TimedOut {
				last_observation: Observation::Unavailable { reason },
				attempts_used,
			} => {
				assert_eq!(attempts_used, 2);
				assert!(reason.contains("gone"));
			}
			other => panic!("expected Unavailable timeout, got {other:?}"),
		}
	}
}
