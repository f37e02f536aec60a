//! Attestation request records.

use crate::layout::TargetLayout;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Oracle sub-protocol tag. This attestor only speaks Web2Json.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AttestationType {
	#[default]
	Web2Json,
}

impl AttestationType {
	pub fn as_str(&self) -> &'static str {
		match self {
			AttestationType::Web2Json => "Web2Json",
		}
	}

	/// Wire form: UTF-8 bytes zero-padded to 32 bytes, hex encoded.
	pub fn as_padded_hex(&self) -> String {
		utf8_hex_32(self.as_str())
	}
}

impl fmt::Display for AttestationType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Class of off-chain source the attestation draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SourceId {
	#[default]
	PublicWeb2,
}

impl SourceId {
	pub fn as_str(&self) -> &'static str {
		match self {
			SourceId::PublicWeb2 => "PublicWeb2",
		}
	}

	pub fn as_padded_hex(&self) -> String {
		utf8_hex_32(self.as_str())
	}
}

impl fmt::Display for SourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

fn utf8_hex_32(value: &str) -> String {
	let mut padded = [0u8; 32];
	let bytes = value.as_bytes();
	padded[..bytes.len()].copy_from_slice(bytes);
	format!("0x{}", hex::encode(padded))
}

/// Immutable description of one attestation: the HTTP source, the
/// post-processing rule applied to its response, and the binary layout
/// the processed result is packed into.
///
/// Owned by the call site that constructs it; one lifecycle consumes one
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationRequest {
	pub url: String,
	pub http_method: String,
	#[serde(default)]
	pub headers: HashMap<String, String>,
	#[serde(default)]
	pub query_params: HashMap<String, String>,
	#[serde(default)]
	pub body: String,
	/// jq expression applied to the raw HTTP response before encoding.
	pub post_process_jq: String,
	pub layout: TargetLayout,
	#[serde(default)]
	pub attestation_type: AttestationType,
	#[serde(default)]
	pub source_id: SourceId,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_padded_hex_tags() {
		// "Web2Json" is 8 bytes, so 16 hex chars followed by 48 zeros.
		let hex = AttestationType::Web2Json.as_padded_hex();
		assert_eq!(hex.len(), 2 + 64);
		assert!(hex.starts_with("0x576562324a736f6e"));
		assert!(hex.ends_with("000000000000"));

		let hex = SourceId::PublicWeb2.as_padded_hex();
		assert_eq!(hex.len(), 2 + 64);
		assert!(hex.starts_with("0x5075626c696357656232"));
	}
}
