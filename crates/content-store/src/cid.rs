use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid content identifier: '{0}'")]
pub struct InvalidCidError(pub String);

/// A content identifier, the hash-derived address of some immutable content.
///
/// We don't decode multihashes here, the store is the authority on that. We only make sure
/// the identifier is a single non-empty alphanumeric token, as both CIDv0 (base58btc) and the
/// usual CIDv1 encodings (base32, base36) are. This also guarantees that a CID can never be
/// mistaken for a flag when handed to an external process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cid(String);

impl Cid {
	pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidCidError> {
		let raw = raw.into();
		let trimmed = raw.trim();

		if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
			return Err(InvalidCidError(raw));
		}

		if trimmed.len() == raw.len() {
			Ok(Self(raw))
		} else {
			Ok(Self(trimmed.to_string()))
		}
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Cid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for Cid {
	type Err = InvalidCidError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for Cid {
	type Error = InvalidCidError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}

impl From<Cid> for String {
	fn from(cid: Cid) -> Self {
		cid.0
	}
}

impl AsRef<str> for Cid {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
