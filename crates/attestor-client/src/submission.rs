//! Delivery of encoded requests to the consensus network.

use async_trait::async_trait;
use attestor_types::{AttestationError, EncodedRequest, Result, RoundId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport seam for the consensus network's submission endpoint.
///
/// Submission is the point where a request enters the voting process. It
/// is not idempotent: resubmitting the same encoded request may land in a
/// different round or be rejected as a duplicate, so callers submit
/// exactly once per logical attestation.
#[async_trait]
pub trait SubmissionInterface: Send + Sync {
	/// Delivers the encoded request and returns the voting round the
	/// network assigned to it.
	async fn submit(&self, request: &EncodedRequest) -> Result<RoundId>;
}

/// Submission over a plain HTTP endpoint.
pub struct HttpSubmission {
	http: reqwest::Client,
	url: String,
	timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
	abi_encoded_request: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
	round_id: u64,
}

impl HttpSubmission {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			http: reqwest::Client::new(),
			url: url.into(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

#[async_trait]
impl SubmissionInterface for HttpSubmission {
	async fn submit(&self, request: &EncodedRequest) -> Result<RoundId> {
		let body = SubmitRequest {
			abi_encoded_request: request.as_hex(),
		};

		debug!(url = %self.url, "submitting encoded attestation request");

		let response = self
			.http
			.post(&self.url)
			.timeout(self.timeout)
			.json(&body)
			.send()
			.await
			.map_err(|e| {
				AttestationError::SubmissionUnavailable(format!("request failed: {}", e))
			})?;

		let status = response.status();
		if status.is_client_error() {
			let text = response.text().await.unwrap_or_default();
			return Err(AttestationError::SubmissionRejected(format!(
				"{}: {}",
				status, text
			)));
		}
		if !status.is_success() {
			return Err(AttestationError::SubmissionUnavailable(format!(
				"submission endpoint returned {}",
				status
			)));
		}

		let parsed: SubmitResponse = response.json().await.map_err(|e| {
			AttestationError::SubmissionUnavailable(format!(
				"malformed submission response: {}",
				e
			))
		})?;

		Ok(RoundId(parsed.round_id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_submit_wire_shapes() {
		let request = SubmitRequest {
			abi_encoded_request: "0xdeadbeef".to_string(),
		};
		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json, serde_json::json!({"abiEncodedRequest": "0xdeadbeef"}));

		let parsed: SubmitResponse = serde_json::from_str(r#"{"roundId": 42}"#).unwrap();
		assert_eq!(parsed.round_id, 42);
	}
}
