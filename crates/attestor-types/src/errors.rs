//! Error types for the attestation lifecycle.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AttestationError>;

/// Terminal outcome of a failed lifecycle stage.
///
/// Every stage fails fast with exactly one of these; nothing downstream
/// translates or swallows an upstream error. Only the proof retriever
/// retries internally, and only for conditions it classifies as retryable.
#[derive(Error, Debug)]
pub enum AttestationError {
	#[error("Invalid request spec: {0}")]
	InvalidRequestSpec(String),

	#[error("Verifier rejected the request: {0}")]
	VerifierRejected(String),

	#[error("Verifier unavailable: {0}")]
	VerifierUnavailable(String),

	#[error("Submission rejected: {0}")]
	SubmissionRejected(String),

	#[error("Submission unavailable: {0}")]
	SubmissionUnavailable(String),

	#[error("Proof retrieval timed out for round {round} after {attempts} attempts")]
	ProofRetrievalTimedOut { round: u64, attempts: u32 },

	#[error("Proof retrieval rejected for round {round}: {reason}")]
	ProofRetrievalRejected { round: u64, reason: String },

	#[error("Decode error: {0}")]
	DecodeError(String),

	#[error("Attestation cancelled")]
	Cancelled,
}

impl AttestationError {
	/// Whether the caller can reasonably run the whole lifecycle again later.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			AttestationError::VerifierUnavailable(_)
				| AttestationError::SubmissionUnavailable(_)
				| AttestationError::ProofRetrievalTimedOut { .. }
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_retryable_classification() {
		assert!(AttestationError::VerifierUnavailable("down".into()).is_retryable());
		assert!(AttestationError::ProofRetrievalTimedOut {
			round: 1,
			attempts: 3
		}
		.is_retryable());

		assert!(!AttestationError::InvalidRequestSpec("empty url".into()).is_retryable());
		assert!(!AttestationError::VerifierRejected("bad jq".into()).is_retryable());
		assert!(!AttestationError::Cancelled.is_retryable());
	}

	#[test]
	fn test_timeout_message_carries_attempt_count() {
		let err = AttestationError::ProofRetrievalTimedOut {
			round: 42,
			attempts: 10,
		};
		let rendered = err.to_string();
		assert!(rendered.contains("42"));
		assert!(rendered.contains("10 attempts"));
	}
}
