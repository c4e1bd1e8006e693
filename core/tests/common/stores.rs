use nc_core::{DataStorageRecord, OwnerId, RecordStore, StoreError};

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

/// A record store whose backend is always down
#[derive(Debug, Default)]
pub struct UnavailableStore {
	calls: AtomicUsize,
}

impl UnavailableStore {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl RecordStore for UnavailableStore {
	async fn list_by_owner(&self, _: OwnerId) -> Result<Vec<DataStorageRecord>, StoreError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Err(StoreError::Unavailable("connection refused".to_string()))
	}
}
