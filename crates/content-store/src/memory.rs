use std::{
	collections::HashMap,
	sync::{Arc, PoisonError, RwLock},
	time::Duration,
};

use async_trait::async_trait;

use super::{Cid, ContentStoreClient, FetchError};

/// Contents kept in a map, addressed by whatever CID the caller assigns them.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
	contents: RwLock<HashMap<Cid, Arc<[u8]>>>,
}

impl MemoryContentStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, cid: Cid, bytes: impl Into<Vec<u8>>) {
		self.contents
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(cid, bytes.into().into());
	}

	/// Drops the content, like unpinning it upstream
	pub fn remove(&self, cid: &Cid) -> bool {
		self.contents
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(cid)
			.is_some()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.contents
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl ContentStoreClient for MemoryContentStore {
	fn name(&self) -> &'static str {
		"memory"
	}

	async fn fetch_by_cid(&self, cid: &Cid, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
		self.contents
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(cid)
			.map(|bytes| bytes.to_vec())
			.ok_or_else(|| FetchError::NotFound { cid: cid.clone() })
	}
}
