//! Where [`DataStorageRecord`]s live. The core only ever reads from a store.

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use super::{
	error::StoreError,
	record::{DataStorageRecord, OwnerId},
};

pub mod memory;
pub mod sqlite;

#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
	/// Every live record of `owner_id`.
	///
	/// No particular order is expected from implementations, callers that need one must sort.
	async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<DataStorageRecord>, StoreError>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
	async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<DataStorageRecord>, StoreError> {
		(**self).list_by_owner(owner_id).await
	}
}
