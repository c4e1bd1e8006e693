use std::sync::{
	atomic::{AtomicI64, Ordering},
	PoisonError, RwLock,
};

use async_trait::async_trait;

use crate::{
	error::StoreError,
	record::{DataStorageRecord, NewRecord, OwnerId, RecordId},
};

use super::RecordStore;

/// Records kept in process, handy for tests and for callers that already hold their records.
#[derive(Debug)]
pub struct MemoryRecordStore {
	records: RwLock<Vec<DataStorageRecord>>,
	next_id: AtomicI64,
}

impl Default for MemoryRecordStore {
	fn default() -> Self {
		Self {
			records: RwLock::default(),
			next_id: AtomicI64::new(1),
		}
	}
}

impl MemoryRecordStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a store holding exactly `records`, keeping their ids
	#[must_use]
	pub fn from_records(records: Vec<DataStorageRecord>) -> Self {
		let next_id = records.iter().map(|record| record.id).max().unwrap_or(0) + 1;

		Self {
			records: RwLock::new(records),
			next_id: AtomicI64::new(next_id),
		}
	}

	pub fn insert(&self, new_record: NewRecord) -> DataStorageRecord {
		let record = new_record.into_record(self.next_id.fetch_add(1, Ordering::Relaxed));

		self.records
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.push(record.clone());

		record
	}

	pub fn remove(&self, record_id: RecordId) -> bool {
		let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
		let before = records.len();
		records.retain(|record| record.id != record_id);

		records.len() != before
	}
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
	async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<DataStorageRecord>, StoreError> {
		Ok(self
			.records
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.iter()
			.filter(|record| record.owner_id == owner_id)
			.cloned()
			.collect())
	}
}
