//! Opaque values exchanged with the verifier service, the submission
//! network, and the data-availability layer.
//!
//! The encoded request and the proof payload are both raw byte strings on
//! the wire. They are deliberately distinct newtypes so they can never be
//! handed to the wrong stage.

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ABI-encoded attestation request produced by the verifier service.
///
/// Never parsed locally; only forwarded verbatim to the submission
/// network and the data-availability layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRequest(Bytes);

impl EncodedRequest {
	pub fn new(bytes: Bytes) -> Self {
		Self(bytes)
	}

	/// Parses the `0x`-prefixed hex form the verifier service returns.
	pub fn from_hex(value: &str) -> std::result::Result<Self, hex::FromHexError> {
		let stripped = value.strip_prefix("0x").unwrap_or(value);
		Ok(Self(Bytes::from(hex::decode(stripped)?)))
	}

	pub fn as_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.0))
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Display for EncodedRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.as_hex())
	}
}

/// Consensus voting round a submitted request was assigned to.
///
/// Assigned once at submission and immutable afterwards; two lifecycles
/// never share one.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Finalized attestation proof retrieved from the data-availability layer.
///
/// Does not exist before its round finalizes; immutable once retrieved.
/// The merkle path may be empty for single-leaf rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
	pub merkle_path: Vec<B256>,
	/// Attested, post-processed data in the request's target layout.
	pub response_payload: Bytes,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_encoded_request_hex_round_trip() {
		let encoded = EncodedRequest::from_hex("0xdeadbeef").unwrap();
		assert_eq!(encoded.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
		assert_eq!(encoded.as_hex(), "0xdeadbeef");

		// Unprefixed hex is accepted too.
		let bare = EncodedRequest::from_hex("deadbeef").unwrap();
		assert_eq!(bare, encoded);
	}

	#[test]
	fn test_encoded_request_rejects_bad_hex() {
		assert!(EncodedRequest::from_hex("0xzz").is_err());
	}

	#[test]
	fn test_round_id_display() {
		assert_eq!(RoundId(42).to_string(), "42");
	}
}
