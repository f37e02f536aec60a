//! Decoded attestation values.

use alloy_primitives::U256;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One typed value unpacked from a proof payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestedValue {
	Uint(U256),
	Text(String),
	Tuple(Vec<NamedValue>),
}

/// A layout field name paired with its decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedValue {
	pub name: String,
	pub value: AttestedValue,
}

/// A proof payload unpacked according to its target layout.
///
/// Derived on demand by the decoder, never stored; field order follows
/// the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttestation {
	pub values: Vec<NamedValue>,
}

impl DecodedAttestation {
	pub fn get(&self, name: &str) -> Option<&AttestedValue> {
		self.values
			.iter()
			.find(|named| named.name == name)
			.map(|named| &named.value)
	}

	pub fn uint(&self, name: &str) -> Option<U256> {
		match self.get(name) {
			Some(AttestedValue::Uint(value)) => Some(*value),
			_ => None,
		}
	}

	pub fn text(&self, name: &str) -> Option<&str> {
		match self.get(name) {
			Some(AttestedValue::Text(value)) => Some(value.as_str()),
			_ => None,
		}
	}
}

// Serialized as a plain JSON object so the output is directly usable by
// the on-chain forwarder: uints as decimal strings, tuples as nested
// objects, field order preserved.
impl Serialize for DecodedAttestation {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serialize_values(&self.values, serializer)
	}
}

impl Serialize for AttestedValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			AttestedValue::Uint(value) => serializer.serialize_str(&value.to_string()),
			AttestedValue::Text(value) => serializer.serialize_str(value),
			AttestedValue::Tuple(values) => serialize_values(values, serializer),
		}
	}
}

fn serialize_values<S: Serializer>(
	values: &[NamedValue],
	serializer: S,
) -> Result<S::Ok, S::Error> {
	let mut map = serializer.serialize_map(Some(values.len()))?;
	for named in values {
		map.serialize_entry(&named.name, &named.value)?;
	}
	map.end()
}
