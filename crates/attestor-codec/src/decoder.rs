//! Decoding of attested proof payloads.
//!
//! The payload is the ABI encoding of the layout's fields as a parameter
//! sequence. Decoding is pure: no network access, recomputed on demand.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use attestor_types::{
	AttestationError, AttestedValue, DecodedAttestation, LayoutField, NamedValue, Proof, Result,
	TargetLayout, TYPE_STRING, TYPE_TUPLE, TYPE_UINT256,
};

/// Unpacks proof payloads into typed fields per a target layout.
pub struct ProofDecoder;

impl ProofDecoder {
	pub fn decode(proof: &Proof, layout: &TargetLayout) -> Result<DecodedAttestation> {
		layout.validate()?;

		let ty = DynSolType::Tuple(sol_types(&layout.fields)?);
		let decoded = ty
			.abi_decode_params(&proof.response_payload)
			.map_err(|e| {
				AttestationError::DecodeError(format!("payload does not match layout: {}", e))
			})?;

		let DynSolValue::Tuple(values) = decoded else {
			return Err(AttestationError::DecodeError(
				"payload did not decode to a tuple".to_string(),
			));
		};

		Ok(DecodedAttestation {
			values: attested_values(&layout.fields, values)?,
		})
	}
}

fn sol_types(fields: &[LayoutField]) -> Result<Vec<DynSolType>> {
	fields.iter().map(sol_type).collect()
}

fn sol_type(field: &LayoutField) -> Result<DynSolType> {
	match field.type_name.as_str() {
		TYPE_UINT256 => Ok(DynSolType::Uint(256)),
		TYPE_STRING => Ok(DynSolType::String),
		TYPE_TUPLE => Ok(DynSolType::Tuple(sol_types(&field.components)?)),
		other => Err(AttestationError::InvalidRequestSpec(format!(
			"unrecognized type '{}' for field '{}'",
			other, field.name
		))),
	}
}

fn attested_values(fields: &[LayoutField], values: Vec<DynSolValue>) -> Result<Vec<NamedValue>> {
	if fields.len() != values.len() {
		return Err(AttestationError::DecodeError(format!(
			"field count mismatch: layout has {}, payload has {}",
			fields.len(),
			values.len()
		)));
	}

	fields
		.iter()
		.zip(values)
		.map(|(field, value)| attested_value(field, value))
		.collect()
}

fn attested_value(field: &LayoutField, value: DynSolValue) -> Result<NamedValue> {
	let value = match (field.type_name.as_str(), value) {
		(TYPE_UINT256, DynSolValue::Uint(v, 256)) => AttestedValue::Uint(v),
		(TYPE_STRING, DynSolValue::String(s)) => AttestedValue::Text(s),
		(TYPE_TUPLE, DynSolValue::Tuple(inner)) => {
			AttestedValue::Tuple(attested_values(&field.components, inner)?)
		}
		(expected, got) => {
			return Err(AttestationError::DecodeError(format!(
				"field '{}' expected {}, payload carried {:?}",
				field.name, expected, got
			)))
		}
	};

	Ok(NamedValue {
		name: field.name.clone(),
		value,
	})
}
