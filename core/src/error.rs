use nc_utils::{
	db::{MissingFieldError, SizeConversionError},
	error::FileIOError,
};

use std::path::Path;

use thiserror::Error;

use super::{
	identity::UnauthenticatedError,
	record::{OwnerId, RecordId},
};

/// Invalid parameters, always reported before touching the record store or the content store.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("byte threshold must be a positive number of bytes")]
	ZeroByteThreshold,
	#[error("max page size must be a positive number of records")]
	ZeroMaxPageSize,
	#[error("page numbers start at 1")]
	ZeroPageNumber,
	#[error("export concurrency must be at least 1")]
	ZeroConcurrency,
	#[error("max concurrent fetches must be at least 1")]
	ZeroMaxConcurrentFetches,
	#[error("fetch timeout must be greater than zero")]
	ZeroFetchTimeout,

	#[error("failed to parse config file <path='{}'>", .path.display())]
	Parse {
		path: Box<Path>,
		#[source]
		source: serde_json::Error,
	},
	#[error("failed to serialize config")]
	Serialize(#[source] serde_json::Error),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sea_orm::DbErr),
	#[error("corrupted record <id='{record_id}'>: {reason}")]
	Corrupted { record_id: RecordId, reason: String },
	#[error("invalid file size: {0}")]
	InvalidSize(#[from] SizeConversionError),
	#[error("sum of file sizes does not fit in 64 bits")]
	SizeOverflow,
	/// For [`RecordStore`](crate::RecordStore) backends that aren't SeaORM databases, like a
	/// remote service that couldn't be reached
	#[error("record store unavailable: {0}")]
	Unavailable(String),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

impl StoreError {
	pub(crate) fn missing_field(record_id: RecordId, e: &MissingFieldError) -> Self {
		Self::Corrupted {
			record_id,
			reason: e.to_string(),
		}
	}

	pub(crate) fn bad_size(record_id: RecordId, e: SizeConversionError) -> Self {
		Self::Corrupted {
			record_id,
			reason: e.to_string(),
		}
	}

	/// Whether asking the store again later may succeed. Bad data stays bad until someone
	/// fixes the rows.
	#[must_use]
	pub const fn is_transient(&self) -> bool {
		matches!(
			self,
			Self::Database(_) | Self::Unavailable(_) | Self::FileIO(_)
		)
	}
}

#[derive(Error, Debug)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("failed to aggregate usage for owner <id='{owner_id}'>")]
	Aggregation {
		owner_id: OwnerId,
		#[source]
		source: StoreError,
	},
	#[error("failed to list records for owner <id='{owner_id}'>")]
	Store {
		owner_id: OwnerId,
		#[source]
		source: StoreError,
	},
	#[error("identity <id='{requesting}'> is not allowed to export files of owner <id='{owner}'>")]
	Unauthorized {
		requesting: OwnerId,
		owner: OwnerId,
	},
	#[error(transparent)]
	Unauthenticated(#[from] UnauthenticatedError),
}

impl Error {
	/// Transient store failures are worth retrying later, everything else will fail the same
	/// way again
	#[must_use]
	pub const fn is_retryable(&self) -> bool {
		match self {
			Self::Aggregation { source, .. } | Self::Store { source, .. } => source.is_transient(),
			_ => false,
		}
	}
}
