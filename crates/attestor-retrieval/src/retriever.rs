//! Bounded retry loop for round-proof retrieval.
//!
//! A proof for (request, round) does not exist until the round finalizes,
//! and rounds finalize on an external cadence of seconds to tens of
//! seconds. Each attempt is therefore classified into an explicit outcome
//! and the loop retries only the two retryable classes; a permanent
//! rejection short-circuits immediately instead of burning the budget.

use crate::cancel::CancelToken;
use async_trait::async_trait;
use attestor_types::{AttestationError, EncodedRequest, Proof, Result, RoundId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Classification of one data-availability query.
#[derive(Debug, Clone)]
pub enum PollOutcome {
	/// The round has not completed voting. Expected and retryable.
	NotYetFinalized,
	/// Proof returned; retrieval is done.
	Found(Proof),
	/// Network-layer failure. Retryable.
	Transient(String),
	/// The layer reports the round or request as invalid. Terminal.
	Permanent(String),
}

/// Transport seam for the data-availability layer.
#[async_trait]
pub trait ProofSource: Send + Sync {
	async fn query(&self, request: &EncodedRequest, round: RoundId) -> PollOutcome;
}

/// Ceiling on a single backoff delay; exponential growth saturates here
/// instead of overflowing `Duration`.
const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(60 * 60);

/// Retry settings for one retrieval.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
	/// Upper bound on queries issued; never exceeded.
	pub max_attempts: u32,
	pub delay: Duration,
	/// Optional exponential factor; absent means a fixed delay.
	pub backoff_multiplier: Option<f64>,
}

impl RetryPolicy {
	pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
		Self {
			max_attempts,
			delay,
			backoff_multiplier: None,
		}
	}

	pub fn with_backoff(mut self, multiplier: f64) -> Self {
		self.backoff_multiplier = Some(multiplier);
		self
	}

	/// Delay to wait after `completed_attempts` attempts have run,
	/// saturating at [`MAX_BACKOFF_DELAY`].
	fn delay_after(&self, completed_attempts: u32) -> Duration {
		match self.backoff_multiplier {
			Some(multiplier) => {
				let factor = multiplier.powi(completed_attempts.saturating_sub(1) as i32);
				match Duration::try_from_secs_f64(self.delay.as_secs_f64() * factor) {
					Ok(delay) => delay.min(MAX_BACKOFF_DELAY),
					Err(_) => MAX_BACKOFF_DELAY,
				}
			}
			None => self.delay,
		}
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::fixed(10, Duration::from_secs(20))
	}
}

/// Polls the data-availability layer for a proof until the round
/// finalizes, the budget runs out, or the layer rejects the request.
///
/// Holds no shared mutable state; every call is an independent loop, so
/// concurrent retrievals never observe each other.
pub struct RoundProofRetriever {
	source: Arc<dyn ProofSource>,
}

impl RoundProofRetriever {
	pub fn new(source: Arc<dyn ProofSource>) -> Self {
		Self { source }
	}

	pub async fn retrieve(
		&self,
		request: &EncodedRequest,
		round: RoundId,
		policy: &RetryPolicy,
		cancel: &CancelToken,
	) -> Result<Proof> {
		for attempt in 1..=policy.max_attempts {
			if cancel.is_cancelled() {
				return Err(AttestationError::Cancelled);
			}

			match self.source.query(request, round).await {
				PollOutcome::Found(proof) => {
					info!(%round, attempt, "proof retrieved");
					return Ok(proof);
				}
				PollOutcome::NotYetFinalized => {
					debug!(%round, attempt, "round not yet finalized");
				}
				PollOutcome::Transient(reason) => {
					warn!(%round, attempt, %reason, "transient failure querying data-availability layer");
				}
				PollOutcome::Permanent(reason) => {
					warn!(%round, attempt, %reason, "data-availability layer rejected the request");
					return Err(AttestationError::ProofRetrievalRejected {
						round: round.0,
						reason,
					});
				}
			}

			if attempt < policy.max_attempts {
				if cancel.is_cancelled() {
					return Err(AttestationError::Cancelled);
				}
				let delay = policy.delay_after(attempt);
				tokio::select! {
					_ = cancel.cancelled() => return Err(AttestationError::Cancelled),
					_ = tokio::time::sleep(delay) => {}
				}
			}
		}

		Err(AttestationError::ProofRetrievalTimedOut {
			round: round.0,
			attempts: policy.max_attempts,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cancel::CancelHandle;
	use alloy_primitives::Bytes;
	use std::collections::VecDeque;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Mutex;

	fn sample_proof() -> Proof {
		Proof {
			merkle_path: Vec::new(),
			response_payload: Bytes::from(vec![0u8; 32]),
		}
	}

	fn encoded() -> EncodedRequest {
		EncodedRequest::from_hex("0xdeadbeef").unwrap()
	}

	fn fast_policy(max_attempts: u32) -> RetryPolicy {
		RetryPolicy::fixed(max_attempts, Duration::from_millis(2))
	}

	/// Replays a scripted outcome sequence and counts queries. Optionally
	/// fires a cancel handle as a side effect of the first query, which
	/// pins the cancellation between attempt 1 and attempt 2.
	struct ScriptedSource {
		outcomes: Mutex<VecDeque<PollOutcome>>,
		queries: AtomicU32,
		cancel_on_first_query: Option<CancelHandle>,
	}

	impl ScriptedSource {
		fn new(outcomes: Vec<PollOutcome>) -> Self {
			Self {
				outcomes: Mutex::new(outcomes.into()),
				queries: AtomicU32::new(0),
				cancel_on_first_query: None,
			}
		}

		fn queries(&self) -> u32 {
			self.queries.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl ProofSource for ScriptedSource {
		async fn query(&self, _request: &EncodedRequest, _round: RoundId) -> PollOutcome {
			let count = self.queries.fetch_add(1, Ordering::SeqCst);
			if count == 0 {
				if let Some(handle) = &self.cancel_on_first_query {
					handle.cancel();
				}
			}
			self.outcomes
				.lock()
				.unwrap()
				.pop_front()
				.unwrap_or(PollOutcome::NotYetFinalized)
		}
	}

	#[tokio::test]
	async fn test_found_on_third_attempt() {
		let source = Arc::new(ScriptedSource::new(vec![
			PollOutcome::NotYetFinalized,
			PollOutcome::NotYetFinalized,
			PollOutcome::Found(sample_proof()),
		]));
		let retriever = RoundProofRetriever::new(source.clone());

		let proof = retriever
			.retrieve(&encoded(), RoundId(7), &fast_policy(3), &CancelToken::never())
			.await
			.unwrap();

		assert_eq!(proof, sample_proof());
		assert_eq!(source.queries(), 3);
	}

	#[tokio::test]
	async fn test_times_out_after_exact_budget() {
		let source = Arc::new(ScriptedSource::new(vec![]));
		let retriever = RoundProofRetriever::new(source.clone());

		let err = retriever
			.retrieve(&encoded(), RoundId(7), &fast_policy(4), &CancelToken::never())
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			AttestationError::ProofRetrievalTimedOut {
				round: 7,
				attempts: 4
			}
		));
		// Exactly the budget, never budget + 1.
		assert_eq!(source.queries(), 4);
	}

	#[tokio::test]
	async fn test_transient_failures_are_retried() {
		let source = Arc::new(ScriptedSource::new(vec![
			PollOutcome::Transient("gateway timeout".to_string()),
			PollOutcome::NotYetFinalized,
			PollOutcome::Found(sample_proof()),
		]));
		let retriever = RoundProofRetriever::new(source.clone());

		let proof = retriever
			.retrieve(&encoded(), RoundId(9), &fast_policy(5), &CancelToken::never())
			.await
			.unwrap();
		assert_eq!(proof, sample_proof());
		assert_eq!(source.queries(), 3);
	}

	#[tokio::test]
	async fn test_permanent_failure_short_circuits() {
		let source = Arc::new(ScriptedSource::new(vec![PollOutcome::Permanent(
			"unknown round".to_string(),
		)]));
		let retriever = RoundProofRetriever::new(source.clone());

		let err = retriever
			.retrieve(
				&encoded(),
				RoundId(11),
				&fast_policy(10),
				&CancelToken::never(),
			)
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			AttestationError::ProofRetrievalRejected { round: 11, .. }
		));
		assert_eq!(source.queries(), 1);
	}

	#[tokio::test]
	async fn test_cancel_between_attempts() {
		let handle = CancelHandle::new();
		let token = handle.token();
		let mut source = ScriptedSource::new(vec![
			PollOutcome::NotYetFinalized,
			PollOutcome::Found(sample_proof()),
		]);
		source.cancel_on_first_query = Some(handle);
		let source = Arc::new(source);
		let retriever = RoundProofRetriever::new(source.clone());

		let err = retriever
			.retrieve(&encoded(), RoundId(3), &fast_policy(5), &token)
			.await
			.unwrap_err();

		assert!(matches!(err, AttestationError::Cancelled));
		// Attempt 2 never ran.
		assert_eq!(source.queries(), 1);
	}

	#[tokio::test]
	async fn test_cancelled_before_start() {
		let handle = CancelHandle::new();
		let token = handle.token();
		handle.cancel();

		let source = Arc::new(ScriptedSource::new(vec![PollOutcome::Found(
			sample_proof(),
		)]));
		let retriever = RoundProofRetriever::new(source.clone());

		let err = retriever
			.retrieve(&encoded(), RoundId(3), &fast_policy(5), &token)
			.await
			.unwrap_err();
		assert!(matches!(err, AttestationError::Cancelled));
		assert_eq!(source.queries(), 0);
	}

	#[test]
	fn test_fixed_delay_schedule() {
		let policy = RetryPolicy::fixed(5, Duration::from_millis(100));
		assert_eq!(policy.delay_after(1), Duration::from_millis(100));
		assert_eq!(policy.delay_after(4), Duration::from_millis(100));
	}

	#[test]
	fn test_backoff_delay_schedule() {
		let policy = RetryPolicy::fixed(5, Duration::from_millis(100)).with_backoff(2.0);
		assert_eq!(policy.delay_after(1), Duration::from_millis(100));
		assert_eq!(policy.delay_after(2), Duration::from_millis(200));
		assert_eq!(policy.delay_after(3), Duration::from_millis(400));
	}

	#[test]
	fn test_backoff_delay_saturates() {
		// Growth past the ceiling clamps instead of overflowing.
		let policy = RetryPolicy::fixed(5, Duration::from_millis(1)).with_backoff(1e300);
		assert_eq!(policy.delay_after(2), MAX_BACKOFF_DELAY);

		let policy = RetryPolicy::fixed(40, Duration::from_secs(20)).with_backoff(2.0);
		assert_eq!(policy.delay_after(30), MAX_BACKOFF_DELAY);
	}

	#[tokio::test(start_paused = true)]
	async fn test_oversized_backoff_exhausts_budget_without_panicking() {
		let source = Arc::new(ScriptedSource::new(vec![]));
		let retriever = RoundProofRetriever::new(source.clone());
		let policy = RetryPolicy::fixed(3, Duration::from_millis(1)).with_backoff(1e300);

		let err = retriever
			.retrieve(&encoded(), RoundId(5), &policy, &CancelToken::never())
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			AttestationError::ProofRetrievalTimedOut {
				round: 5,
				attempts: 3
			}
		));
		assert_eq!(source.queries(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_waits_fixed_delay_between_attempts() {
		let source = Arc::new(ScriptedSource::new(vec![
			PollOutcome::NotYetFinalized,
			PollOutcome::NotYetFinalized,
			PollOutcome::Found(sample_proof()),
		]));
		let retriever = RoundProofRetriever::new(source.clone());
		let policy = RetryPolicy::fixed(3, Duration::from_secs(5));

		let started = tokio::time::Instant::now();
		retriever
			.retrieve(&encoded(), RoundId(7), &policy, &CancelToken::never())
			.await
			.unwrap();

		// Two delays of 5s each; no delay after the final attempt.
		assert_eq!(started.elapsed(), Duration::from_secs(10));
	}

	#[tokio::test(start_paused = true)]
	async fn test_waits_backoff_schedule_between_attempts() {
		let source = Arc::new(ScriptedSource::new(vec![
			PollOutcome::NotYetFinalized,
			PollOutcome::NotYetFinalized,
			PollOutcome::Found(sample_proof()),
		]));
		let retriever = RoundProofRetriever::new(source.clone());
		let policy = RetryPolicy::fixed(3, Duration::from_secs(5)).with_backoff(2.0);

		let started = tokio::time::Instant::now();
		retriever
			.retrieve(&encoded(), RoundId(7), &policy, &CancelToken::never())
			.await
			.unwrap();

		// 5s after attempt 1, 10s after attempt 2.
		assert_eq!(started.elapsed(), Duration::from_secs(15));
	}
}
