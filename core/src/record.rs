use nc_content_store::FetchErrorKind;

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StoreError;

/// Store assigned identifier of a [`DataStorageRecord`]
pub type RecordId = i64;

/// Identity owning a set of records, also what requests get authorized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	#[must_use]
	pub const fn from_uuid(uuid: Uuid) -> Self {
		Self(uuid)
	}

	#[must_use]
	pub const fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}

impl Default for OwnerId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for OwnerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl FromStr for OwnerId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Self)
	}
}

impl From<Uuid> for OwnerId {
	fn from(uuid: Uuid) -> Self {
		Self(uuid)
	}
}

/// One file an owner committed to the content-addressable store.
///
/// Records are created and deleted outside of this crate, we only ever read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStorageRecord {
	pub id: RecordId,
	pub owner_id: OwnerId,
	pub file_name: String,
	pub file_type: String,
	/// Content identifier, validated only when the content is fetched
	pub file_cid: String,
	pub file_size: u64,
	/// Digest of the file contents, independent from the CID
	pub file_hash: String,
	pub upload_timestamp: DateTime<Utc>,
}

/// Data needed to create a record, the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
	pub owner_id: OwnerId,
	pub file_name: String,
	pub file_type: String,
	pub file_cid: String,
	pub file_size: u64,
	pub file_hash: String,
	pub upload_timestamp: DateTime<Utc>,
}

impl NewRecord {
	pub fn new(
		owner_id: OwnerId,
		file_name: impl Into<String>,
		file_type: impl Into<String>,
		file_cid: impl Into<String>,
		file_size: u64,
		file_hash: impl Into<String>,
	) -> Self {
		Self {
			owner_id,
			file_name: file_name.into(),
			file_type: file_type.into(),
			file_cid: file_cid.into(),
			file_size,
			file_hash: file_hash.into(),
			upload_timestamp: Utc::now(),
		}
	}

	#[must_use]
	pub fn with_upload_timestamp(mut self, upload_timestamp: DateTime<Utc>) -> Self {
		self.upload_timestamp = upload_timestamp;
		self
	}

	pub(crate) fn into_record(self, id: RecordId) -> DataStorageRecord {
		let Self {
			owner_id,
			file_name,
			file_type,
			file_cid,
			file_size,
			file_hash,
			upload_timestamp,
		} = self;

		DataStorageRecord {
			id,
			owner_id,
			file_name,
			file_type,
			file_cid,
			file_size,
			file_hash,
			upload_timestamp,
		}
	}
}

/// A non empty, ordered group of records whose sizes add up to at most the byte threshold,
/// unless it holds a single record that alone is larger than the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
	/// 1-based position of this page in the page sequence
	pub number: usize,
	pub total_bytes: u64,
	pub records: Vec<DataStorageRecord>,
}

impl Page {
	#[must_use]
	pub fn len(&self) -> usize {
		self.records.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &DataStorageRecord> {
		self.records.iter()
	}
}

impl IntoIterator for Page {
	type Item = DataStorageRecord;
	type IntoIter = std::vec::IntoIter<DataStorageRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.records.into_iter()
	}
}

/// How much an owner is storing right now, recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
	pub owner_id: OwnerId,
	pub total_bytes: u64,
	pub record_count: u64,
}

impl UsageSnapshot {
	#[must_use]
	pub const fn empty(owner_id: OwnerId) -> Self {
		Self {
			owner_id,
			total_bytes: 0,
			record_count: 0,
		}
	}

	pub(crate) fn from_records(
		owner_id: OwnerId,
		records: &[DataStorageRecord],
	) -> Result<Self, StoreError> {
		records.iter().try_fold(Self::empty(owner_id), |usage, record| {
			Ok(Self {
				total_bytes: usage
					.total_bytes
					.checked_add(record.file_size)
					.ok_or(StoreError::SizeOverflow)?,
				record_count: usage.record_count + 1,
				..usage
			})
		})
	}

	#[must_use]
	pub const fn exceeds(&self, limit_bytes: u64) -> bool {
		self.total_bytes > limit_bytes
	}

	/// Bytes still available under `limit_bytes`, zero when the limit is already exceeded
	#[must_use]
	pub const fn remaining(&self, limit_bytes: u64) -> u64 {
		limit_bytes.saturating_sub(self.total_bytes)
	}
}

/// A file's contents along with the metadata needed to hand it to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEnvelope {
	pub owner_id: OwnerId,
	pub record_id: RecordId,
	pub file_cid: String,
	pub file_name: String,
	pub file_type: String,
	pub bytes: Vec<u8>,
}

impl FileEnvelope {
	pub(crate) fn new(owner_id: OwnerId, record: DataStorageRecord, bytes: Vec<u8>) -> Self {
		Self {
			owner_id,
			record_id: record.id,
			file_cid: record.file_cid,
			file_name: record.file_name,
			file_type: record.file_type,
			bytes,
		}
	}
}

/// Serializable summary of a failed item, for output layers that can't carry the error itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailureReport {
	pub record_id: RecordId,
	pub file_name: String,
	pub cid: String,
	pub error_kind: FetchErrorKind,
	pub message: String,
}
