//! End-to-end attestation lifecycle.
//!
//! One call per use case: build the request, have the verifier encode it,
//! submit it into a voting round, poll the data-availability layer until
//! the round finalizes, and decode the proof payload. Stages run strictly
//! in that order and the first failure propagates unchanged.

use crate::submission::{HttpSubmission, SubmissionInterface};
use alloy_primitives::B256;
use attestor_codec::{ProofDecoder, RequestCodec, RequestEncoder, VerifierClient};
use attestor_config::AttestorConfig;
use attestor_retrieval::{
	CancelToken, DaLayerClient, ProofSource, RetryPolicy, RoundProofRetriever,
};
use attestor_types::{DecodedAttestation, Result, RoundId, TargetLayout};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Parameters for one attestation lifecycle.
#[derive(Debug, Clone)]
pub struct RequestSpec {
	pub url: String,
	pub http_method: String,
	pub headers: HashMap<String, String>,
	pub query_params: HashMap<String, String>,
	pub body: String,
	pub post_process_jq: String,
	pub layout: TargetLayout,
}

impl RequestSpec {
	/// Plain GET source with no headers, query parameters, or body.
	pub fn get(
		url: impl Into<String>,
		post_process_jq: impl Into<String>,
		layout: TargetLayout,
	) -> Self {
		Self {
			url: url.into(),
			http_method: "GET".to_string(),
			headers: HashMap::new(),
			query_params: HashMap::new(),
			body: String::new(),
			post_process_jq: post_process_jq.into(),
			layout,
		}
	}
}

/// What one successful lifecycle hands to the external consumer: the
/// merkle proof and the decoded data, ready for the on-chain verifier.
#[derive(Debug, Clone, Serialize)]
pub struct AttestationOutcome {
	pub round: RoundId,
	pub merkle_path: Vec<B256>,
	pub decoded: DecodedAttestation,
}

/// Orchestrates the attestation lifecycle against the three external
/// collaborators. Holds no per-lifecycle state; concurrent lifecycle
/// runs are fully independent.
pub struct AttestationClient {
	encoder: Arc<dyn RequestEncoder>,
	submission: Arc<dyn SubmissionInterface>,
	retriever: RoundProofRetriever,
	retry: RetryPolicy,
}

impl AttestationClient {
	pub fn new(
		encoder: Arc<dyn RequestEncoder>,
		submission: Arc<dyn SubmissionInterface>,
		source: Arc<dyn ProofSource>,
		retry: RetryPolicy,
	) -> Self {
		Self {
			encoder,
			submission,
			retriever: RoundProofRetriever::new(source),
			retry,
		}
	}

	/// Wires the shipped HTTP transports from configuration.
	pub fn from_config(config: &AttestorConfig) -> Self {
		let retry = RetryPolicy {
			max_attempts: config.retry.max_attempts,
			delay: config.retry.delay(),
			backoff_multiplier: config.retry.backoff_multiplier,
		};

		Self::new(
			Arc::new(VerifierClient::new(
				&config.verifier.url,
				&config.verifier.api_key,
			)),
			Arc::new(HttpSubmission::new(&config.submission.url)),
			Arc::new(DaLayerClient::new(&config.da_layer.url)),
			retry,
		)
	}

	/// Runs one full lifecycle. Submits exactly once; retrieval starts
	/// only after the round is assigned, decoding only after the proof
	/// arrives.
	pub async fn run_lifecycle(
		&self,
		spec: RequestSpec,
		cancel: &CancelToken,
	) -> Result<AttestationOutcome> {
		let request = RequestCodec::build(
			spec.url,
			spec.http_method,
			spec.headers,
			spec.query_params,
			spec.body,
			spec.post_process_jq,
			spec.layout,
		)?;

		let encoded = self.encoder.encode(&request).await?;
		info!(source = %request.url, "attestation request encoded");

		let round = self.submission.submit(&encoded).await?;
		info!(%round, "attestation request submitted");

		let proof = self
			.retriever
			.retrieve(&encoded, round, &self.retry, cancel)
			.await?;

		let decoded = ProofDecoder::decode(&proof, &request.layout)?;
		info!(%round, fields = decoded.values.len(), "attestation decoded");

		Ok(AttestationOutcome {
			round,
			merkle_path: proof.merkle_path,
			decoded,
		})
	}
}
