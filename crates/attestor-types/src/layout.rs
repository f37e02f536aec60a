//! Target layout schema for attested data.
//!
//! A layout describes how the post-processed source data is packed into a
//! fixed binary tuple: field order, names, and solidity types. The same
//! schema renders the verifier's `abiSignature` JSON and drives decoding
//! of the proof payload.

use crate::errors::{AttestationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const TYPE_UINT256: &str = "uint256";
pub const TYPE_STRING: &str = "string";
pub const TYPE_TUPLE: &str = "tuple";

/// One field of a target layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutField {
	pub name: String,
	#[serde(rename = "type")]
	pub type_name: String,
	/// Nested fields, only meaningful for `tuple` fields.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub components: Vec<LayoutField>,
}

impl LayoutField {
	pub fn uint256(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			type_name: TYPE_UINT256.to_string(),
			components: Vec::new(),
		}
	}

	pub fn string(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			type_name: TYPE_STRING.to_string(),
			components: Vec::new(),
		}
	}

	pub fn tuple(name: impl Into<String>, components: Vec<LayoutField>) -> Self {
		Self {
			name: name.into(),
			type_name: TYPE_TUPLE.to_string(),
			components,
		}
	}

	fn validate(&self) -> Result<()> {
		match self.type_name.as_str() {
			TYPE_UINT256 | TYPE_STRING => Ok(()),
			TYPE_TUPLE => {
				if self.components.is_empty() {
					return Err(AttestationError::InvalidRequestSpec(format!(
						"tuple field '{}' has no components",
						self.name
					)));
				}
				for component in &self.components {
					component.validate()?;
				}
				Ok(())
			}
			other => Err(AttestationError::InvalidRequestSpec(format!(
				"unrecognized type '{}' for field '{}'",
				other, self.name
			))),
		}
	}

	fn signature_component(&self) -> serde_json::Value {
		if self.type_name == TYPE_TUPLE {
			json!({
				"components": self.components.iter().map(|c| c.signature_component()).collect::<Vec<_>>(),
				"internalType": self.type_name,
				"name": self.name,
				"type": self.type_name,
			})
		} else {
			json!({
				"internalType": self.type_name,
				"name": self.name,
				"type": self.type_name,
			})
		}
	}
}

/// Schema describing the binary tuple the attested result is packed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLayout {
	pub fields: Vec<LayoutField>,
}

impl TargetLayout {
	pub fn new(fields: Vec<LayoutField>) -> Self {
		Self { fields }
	}

	/// Checks the layout invariant: at least one field, every type recognized.
	pub fn validate(&self) -> Result<()> {
		if self.fields.is_empty() {
			return Err(AttestationError::InvalidRequestSpec(
				"target layout must describe at least one field".to_string(),
			));
		}
		for field in &self.fields {
			field.validate()?;
		}
		Ok(())
	}

	/// Renders the `abiSignature` JSON string the verifier service expects:
	/// a single tuple named `task` whose components are the layout fields.
	pub fn abi_signature(&self) -> String {
		let signature = json!({
			"components": self.fields.iter().map(|f| f.signature_component()).collect::<Vec<_>>(),
			"name": "task",
			"type": "tuple",
		});
		signature.to_string()
	}
}
