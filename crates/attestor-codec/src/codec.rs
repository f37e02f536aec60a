//! Construction of canonical attestation requests.

use attestor_types::{
	AttestationError, AttestationRequest, AttestationType, Result, SourceId, TargetLayout,
};
use std::collections::HashMap;

/// Builds canonical attestation request records from source parameters.
pub struct RequestCodec;

impl RequestCodec {
	/// Pure construction. Checks the request invariants: a non-empty
	/// source URL and a well-formed target layout.
	#[allow(clippy::too_many_arguments)]
	pub fn build(
		url: impl Into<String>,
		http_method: impl Into<String>,
		headers: HashMap<String, String>,
		query_params: HashMap<String, String>,
		body: impl Into<String>,
		post_process_jq: impl Into<String>,
		layout: TargetLayout,
	) -> Result<AttestationRequest> {
		let url = url.into();
		if url.trim().is_empty() {
			return Err(AttestationError::InvalidRequestSpec(
				"source URL must not be empty".to_string(),
			));
		}

		layout.validate()?;

		Ok(AttestationRequest {
			url,
			http_method: http_method.into(),
			headers,
			query_params,
			body: body.into(),
			post_process_jq: post_process_jq.into(),
			layout,
			attestation_type: AttestationType::Web2Json,
			source_id: SourceId::PublicWeb2,
		})
	}

	/// Convenience form for plain GET sources with no headers, query
	/// parameters, or body.
	pub fn get(
		url: impl Into<String>,
		post_process_jq: impl Into<String>,
		layout: TargetLayout,
	) -> Result<AttestationRequest> {
		Self::build(
			url,
			"GET",
			HashMap::new(),
			HashMap::new(),
			"",
			post_process_jq,
			layout,
		)
	}
}
