use std::{fmt, io, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cid::{Cid, InvalidCidError};

#[derive(Error, Debug)]
pub enum FetchError {
	#[error(transparent)]
	InvalidCid(#[from] InvalidCidError),
	#[error("failed to run content store client <binary='{}'>", .binary.display())]
	SpawnClient {
		binary: Box<Path>,
		#[source]
		source: io::Error,
	},
	#[error("content store is unreachable <endpoint='{endpoint}'>")]
	Unreachable {
		endpoint: String,
		#[source]
		source: reqwest::Error,
	},
	#[error("fetching <cid='{cid}'> timed out after {timeout:?}")]
	Timeout { cid: Cid, timeout: Duration },
	#[error("content not found or not pinned <cid='{cid}'>")]
	NotFound { cid: Cid },
	#[error("content store client failed for <cid='{cid}'>: {reason}")]
	ClientFailed { cid: Cid, reason: String },
	#[error("request for <cid='{cid}'> failed")]
	Request {
		cid: Cid,
		#[source]
		source: reqwest::Error,
	},
	#[error("content integrity check failed for <cid='{cid}'>: expected digest {expected}, got {actual}")]
	IntegrityMismatch {
		cid: Cid,
		expected: String,
		actual: String,
	},
}

/// Coarse classification of a [`FetchError`], cheap to copy around and serialize into
/// per item failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
	InvalidCid,
	Unreachable,
	Timeout,
	NotFound,
	Client,
	Integrity,
}

impl FetchErrorKind {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidCid => "invalid_cid",
			Self::Unreachable => "unreachable",
			Self::Timeout => "timeout",
			Self::NotFound => "not_found",
			Self::Client => "client",
			Self::Integrity => "integrity",
		}
	}
}

impl fmt::Display for FetchErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FetchError {
	#[must_use]
	pub const fn kind(&self) -> FetchErrorKind {
		match self {
			Self::InvalidCid(_) => FetchErrorKind::InvalidCid,
			Self::SpawnClient { .. } | Self::Unreachable { .. } => FetchErrorKind::Unreachable,
			Self::Timeout { .. } => FetchErrorKind::Timeout,
			Self::NotFound { .. } => FetchErrorKind::NotFound,
			Self::ClientFailed { .. } | Self::Request { .. } => FetchErrorKind::Client,
			Self::IntegrityMismatch { .. } => FetchErrorKind::Integrity,
		}
	}

	/// Whether trying again later could succeed
	#[must_use]
	pub const fn is_transient(&self) -> bool {
		matches!(
			self.kind(),
			FetchErrorKind::Unreachable | FetchErrorKind::Timeout | FetchErrorKind::Client
		)
	}
}
