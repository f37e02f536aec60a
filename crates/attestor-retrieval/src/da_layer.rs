//! HTTP client for the data-availability layer.

use crate::retriever::{PollOutcome, ProofSource};
use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use attestor_types::{EncodedRequest, Proof, RoundId};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the layer's proof-by-request-round endpoint.
pub struct DaLayerClient {
	http: reqwest::Client,
	base_url: String,
	timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofQuery {
	abi_encoded_request: String,
	round_id: u64,
}

// Both fields absent is the layer's explicit "not available" indicator
// for a round that has not finalized yet.
#[derive(Debug, Deserialize)]
struct ProofResponse {
	#[serde(default)]
	proof: Option<Vec<String>>,
	#[serde(default)]
	response_hex: Option<String>,
}

impl DaLayerClient {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			http: reqwest::Client::new(),
			base_url: base_url.into().trim_end_matches('/').to_string(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	// Any 2xx body that is neither a proof nor the explicit
	// "not available" shape is treated as transient and retried.
	fn classify_body(body: &str) -> PollOutcome {
		let parsed: ProofResponse = match serde_json::from_str(body) {
			Ok(parsed) => parsed,
			Err(_) => {
				return PollOutcome::Transient(
					"unrecognized data-availability response".to_string(),
				)
			}
		};

		// Only the fully-empty shape means "round not finalized"; a body
		// with one of the two fields is ambiguous and gets retried.
		let (hashes, response_hex) = match (parsed.proof, parsed.response_hex) {
			(Some(hashes), Some(response_hex)) => (hashes, response_hex),
			(None, None) => return PollOutcome::NotYetFinalized,
			_ => {
				return PollOutcome::Transient(
					"partial data-availability response".to_string(),
				)
			}
		};

		let mut merkle_path = Vec::with_capacity(hashes.len());
		for hash in &hashes {
			match hash.parse::<B256>() {
				Ok(parsed) => merkle_path.push(parsed),
				Err(e) => {
					return PollOutcome::Transient(format!("malformed proof hash: {}", e));
				}
			}
		}

		let stripped = response_hex.strip_prefix("0x").unwrap_or(&response_hex);
		let response_payload = match hex::decode(stripped) {
			Ok(bytes) => Bytes::from(bytes),
			Err(e) => {
				return PollOutcome::Transient(format!("malformed response payload: {}", e));
			}
		};

		PollOutcome::Found(Proof {
			merkle_path,
			response_payload,
		})
	}
}

#[async_trait]
impl ProofSource for DaLayerClient {
	async fn query(&self, request: &EncodedRequest, round: RoundId) -> PollOutcome {
		let url = format!("{}/api/v1/fdc/proof-by-request-round-raw", self.base_url);
		let query = ProofQuery {
			abi_encoded_request: request.as_hex(),
			round_id: round.0,
		};

		debug!(%url, %round, "querying data-availability layer");

		let response = match self
			.http
			.post(&url)
			.timeout(self.timeout)
			.json(&query)
			.send()
			.await
		{
			Ok(response) => response,
			Err(e) => return PollOutcome::Transient(format!("request failed: {}", e)),
		};

		let status = response.status();
		if status == StatusCode::NOT_FOUND {
			return PollOutcome::NotYetFinalized;
		}
		if status.is_server_error() {
			return PollOutcome::Transient(format!("data-availability layer returned {}", status));
		}
		if !status.is_success() {
			let text = response.text().await.unwrap_or_default();
			return PollOutcome::Permanent(format!("{}: {}", status, text));
		}

		match response.text().await {
			Ok(body) => Self::classify_body(&body),
			Err(e) => PollOutcome::Transient(format!("failed to read response: {}", e)),
		}
	}
}
