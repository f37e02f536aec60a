//! HTTP client for the attestation verifier service.
//!
//! The verifier validates a request server-side and returns its
//! ABI-encoded wire form, which the client treats as an opaque token
//! from then on.

use async_trait::async_trait;
use attestor_types::{AttestationError, AttestationRequest, EncodedRequest, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Seam for the verifier's encode step, so the lifecycle can run against
/// a scripted encoder in tests.
#[async_trait]
pub trait RequestEncoder: Send + Sync {
	/// Validates and serializes the request server-side, returning the
	/// opaque encoded form exchanged with the rest of the network.
	async fn encode(&self, request: &AttestationRequest) -> Result<EncodedRequest>;
}

/// Client for the verifier service's `prepareRequest` endpoint.
pub struct VerifierClient {
	http: reqwest::Client,
	base_url: String,
	api_key: String,
	timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrepareRequest {
	attestation_type: String,
	source_id: String,
	request_body: PrepareRequestBody,
}

// The service expects the map-valued and body fields as JSON-encoded
// strings, not nested objects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrepareRequestBody {
	url: String,
	http_method: String,
	headers: String,
	query_params: String,
	body: String,
	post_process_jq: String,
	abi_signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareResponse {
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	abi_encoded_request: Option<String>,
}

impl VerifierClient {
	pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
		Self {
			http: reqwest::Client::new(),
			base_url: base_url.into().trim_end_matches('/').to_string(),
			api_key: api_key.into(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	fn prepare_body(request: &AttestationRequest) -> Result<PrepareRequest> {
		let headers = serde_json::to_string(&request.headers)
			.map_err(|e| AttestationError::InvalidRequestSpec(format!("headers: {}", e)))?;
		let query_params = serde_json::to_string(&request.query_params)
			.map_err(|e| AttestationError::InvalidRequestSpec(format!("query params: {}", e)))?;
		let body = if request.body.is_empty() {
			"{}".to_string()
		} else {
			request.body.clone()
		};

		Ok(PrepareRequest {
			attestation_type: request.attestation_type.as_padded_hex(),
			source_id: request.source_id.as_padded_hex(),
			request_body: PrepareRequestBody {
				url: request.url.clone(),
				http_method: request.http_method.clone(),
				headers,
				query_params,
				body,
				post_process_jq: request.post_process_jq.clone(),
				abi_signature: request.layout.abi_signature(),
			},
		})
	}
}

#[async_trait]
impl RequestEncoder for VerifierClient {
	async fn encode(&self, request: &AttestationRequest) -> Result<EncodedRequest> {
		let url = format!(
			"{}/{}/prepareRequest",
			self.base_url,
			request.attestation_type.as_str()
		);
		let body = Self::prepare_body(request)?;

		debug!(%url, source = %request.url, "preparing attestation request");

		let response = self
			.http
			.post(&url)
			.timeout(self.timeout)
			.header("X-API-KEY", &self.api_key)
			.json(&body)
			.send()
			.await
			.map_err(|e| {
				AttestationError::VerifierUnavailable(format!("request failed: {}", e))
			})?;

		let status = response.status();
		if status.is_client_error() {
			let text = response.text().await.unwrap_or_default();
			return Err(AttestationError::VerifierRejected(format!(
				"{}: {}",
				status, text
			)));
		}
		if !status.is_success() {
			return Err(AttestationError::VerifierUnavailable(format!(
				"verifier returned {}",
				status
			)));
		}

		let parsed: PrepareResponse = response.json().await.map_err(|e| {
			AttestationError::VerifierUnavailable(format!("malformed verifier response: {}", e))
		})?;

		if let Some(status) = &parsed.status {
			if status != "VALID" {
				return Err(AttestationError::VerifierRejected(format!(
					"verifier reported status {}",
					status
				)));
			}
		}

		let encoded_hex = parsed.abi_encoded_request.ok_or_else(|| {
			AttestationError::VerifierUnavailable(
				"verifier response missing abiEncodedRequest".to_string(),
			)
		})?;

		EncodedRequest::from_hex(&encoded_hex).map_err(|e| {
			AttestationError::VerifierUnavailable(format!("invalid abiEncodedRequest: {}", e))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::RequestCodec;
	use attestor_types::{LayoutField, TargetLayout};
	use std::collections::HashMap;

	fn sample_request() -> AttestationRequest {
		RequestCodec::build(
			"https://api.example/inventory",
			"GET",
			HashMap::from([("Accept".to_string(), "application/json".to_string())]),
			HashMap::new(),
			"",
			"{quantity: .stock, origin: .location}",
			TargetLayout::new(vec![
				LayoutField::uint256("quantity"),
				LayoutField::string("origin"),
			]),
		)
		.unwrap()
	}

	#[test]
	fn test_prepare_body_wire_shape() {
		let body = VerifierClient::prepare_body(&sample_request()).unwrap();
		let json = serde_json::to_value(&body).unwrap();

		// Tags go out as zero-padded 32-byte utf8 hex.
		assert_eq!(
			json["attestationType"].as_str().unwrap().len(),
			2 + 64,
		);
		assert!(json["sourceId"]
			.as_str()
			.unwrap()
			.starts_with("0x5075626c696357656232"));

		let request_body = &json["requestBody"];
		assert_eq!(request_body["httpMethod"], "GET");
		// Maps and body travel as JSON-encoded strings.
		assert_eq!(
			request_body["headers"],
			r#"{"Accept":"application/json"}"#
		);
		assert_eq!(request_body["queryParams"], "{}");
		assert_eq!(request_body["body"], "{}");
		assert_eq!(
			request_body["postProcessJq"],
			"{quantity: .stock, origin: .location}"
		);

		let signature: serde_json::Value =
			serde_json::from_str(request_body["abiSignature"].as_str().unwrap()).unwrap();
		assert_eq!(signature["components"][1]["name"], "origin");
	}

	#[test]
	fn test_response_parsing() {
		let parsed: PrepareResponse = serde_json::from_str(
			r#"{"status": "VALID", "abiEncodedRequest": "0xabcdef"}"#,
		)
		.unwrap();
		assert_eq!(parsed.status.as_deref(), Some("VALID"));
		assert_eq!(parsed.abi_encoded_request.as_deref(), Some("0xabcdef"));

		// Missing fields deserialize as None rather than failing outright,
		// so the client can report which field was absent.
		let parsed: PrepareResponse = serde_json::from_str("{}").unwrap();
		assert!(parsed.abi_encoded_request.is_none());
	}

	#[test]
	fn test_base_url_normalized() {
		let client = VerifierClient::new("https://verifier.example/", "key");
		assert_eq!(client.base_url, "https://verifier.example");
	}
}
