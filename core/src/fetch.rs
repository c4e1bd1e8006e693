use nc_content_store::{Cid, ContentStoreClient, FetchError};

use std::{sync::Arc, time::Duration};

use sha2::{Digest, Sha256};
use tokio::{sync::Semaphore, time::timeout};
use tracing::{debug, instrument, trace};

use super::{error::ConfigError, record::DataStorageRecord};

/// Retrieves raw bytes for content identifiers through a [`ContentStoreClient`].
///
/// Clones share the same admission semaphore, so the number of client invocations running at
/// once stays bounded no matter how many exports are using the fetcher.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
	client: Arc<dyn ContentStoreClient>,
	admission: Arc<Semaphore>,
	verify_integrity: bool,
}

impl ContentFetcher {
	pub fn new(
		client: Arc<dyn ContentStoreClient>,
		max_concurrent_fetches: usize,
	) -> Result<Self, ConfigError> {
		if max_concurrent_fetches == 0 {
			return Err(ConfigError::ZeroMaxConcurrentFetches);
		}

		Ok(Self {
			client,
			admission: Arc::new(Semaphore::new(max_concurrent_fetches)),
			verify_integrity: false,
		})
	}

	/// Check fetched bytes against the record's SHA-256 `file_hash` in [`Self::fetch_record`]
	#[must_use]
	pub fn with_integrity_verification(mut self, verify_integrity: bool) -> Self {
		self.verify_integrity = verify_integrity;
		self
	}

	#[must_use]
	pub fn client_name(&self) -> &'static str {
		self.client.name()
	}

	/// Fetch slots not taken right now
	#[must_use]
	pub fn available_permits(&self) -> usize {
		self.admission.available_permits()
	}

	/// Exactly one attempt at fetching `cid`, failing if it takes longer than `max_wait`.
	///
	/// Time spent waiting for an admission slot doesn't count against `max_wait`.
	#[instrument(skip(self), fields(client = self.client.name()), err)]
	pub async fn fetch(&self, cid: &str, max_wait: Duration) -> Result<Vec<u8>, FetchError> {
		let cid = Cid::parse(cid)?;

		let _permit = self
			.admission
			.acquire()
			.await
			.expect("admission semaphore is never closed");

		let bytes = timeout(max_wait, self.client.fetch_by_cid(&cid, max_wait))
			.await
			.map_err(|_| FetchError::Timeout {
				cid: cid.clone(),
				timeout: max_wait,
			})??;

		trace!(bytes = bytes.len(), "Fetched content;");

		Ok(bytes)
	}

	/// Fetches the content of `record`, verifying it when integrity verification is enabled.
	///
	/// Records registered without a digest have nothing to be checked against and are passed
	/// through as is.
	pub async fn fetch_record(
		&self,
		record: &DataStorageRecord,
		max_wait: Duration,
	) -> Result<Vec<u8>, FetchError> {
		let bytes = self.fetch(&record.file_cid, max_wait).await?;

		if self.verify_integrity {
			if record.file_hash.trim().is_empty() {
				debug!(record_id = record.id, "No digest recorded, skipping integrity check;");
			} else {
				verify_digest(record, &bytes)?;
			}
		}

		Ok(bytes)
	}
}

fn verify_digest(record: &DataStorageRecord, bytes: &[u8]) -> Result<(), FetchError> {
	let actual = sha256_hex(bytes);

	if actual.eq_ignore_ascii_case(record.file_hash.trim()) {
		Ok(())
	} else {
		Err(FetchError::IntegrityMismatch {
			cid: Cid::parse(record.file_cid.as_str())?,
			expected: record.file_hash.clone(),
			actual,
		})
	}
}

/// Lowercase hex SHA-256 digest, the format expected in `file_hash`
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
	hex::encode(Sha256::digest(bytes))
}
