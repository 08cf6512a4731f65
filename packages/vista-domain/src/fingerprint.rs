use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::query::CompiledQuery;

const SCHEMA_TAG: &[u8] = b"vista-search-v1\0";
const PREFIX_LEN: usize = 12;

/// Hex-encoded BLAKE3 digest of a compiled query. Equal fingerprints are treated as the same search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);
impl Fingerprint {
	/// Wraps a stored fingerprint, e.g. one read back from a job link.
	pub fn from_hex(hex: impl Into<String>) -> Self {
		Self(hex.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Short form for log fields.
	pub fn prefix(&self) -> &str {
		self.0.get(..PREFIX_LEN).unwrap_or(&self.0)
	}
}
impl Display for Fingerprint {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Serialization hashed by [`fingerprint`]. Struct fields serialize in declaration order.
pub fn canonical_bytes(query: &CompiledQuery) -> serde_json::Result<Vec<u8>> {
	serde_json::to_vec(query)
}

pub fn fingerprint(query: &CompiledQuery) -> serde_json::Result<Fingerprint> {
	let payload = canonical_bytes(query)?;
	let mut hasher = blake3::Hasher::new();

	hasher.update(SCHEMA_TAG);
	hasher.update(&payload);

	Ok(Fingerprint(hasher.finalize().to_hex().to_string()))
}
