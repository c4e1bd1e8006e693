use nc_core::content_store::{Cid, ContentStoreClient, FetchError, MemoryContentStore};

use std::{
	collections::HashSet,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	time::Duration,
};

use async_trait::async_trait;
use tokio::time::sleep;

use super::{cid_for, contents_for};

/// Content store double that counts calls, tracks how many run at once and can be told to
/// fail or stall for specific CIDs.
#[derive(Debug, Default)]
pub struct ScriptedClient {
	contents: MemoryContentStore,
	failing: HashSet<Cid>,
	stalling: HashSet<Cid>,
	delay: Duration,
	calls: AtomicUsize,
	in_flight: Arc<AtomicUsize>,
	max_in_flight: AtomicUsize,
}

impl ScriptedClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Serves the canned contents for every name in `names`
	pub fn serving<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
		let client = Self::new();
		for name in names {
			client
				.contents
				.insert(Cid::parse(cid_for(name)).unwrap(), contents_for(name).into_bytes());
		}

		client
	}

	pub fn failing_on(mut self, name: &str) -> Self {
		self.failing.insert(Cid::parse(cid_for(name)).unwrap());
		self
	}

	/// Never answers for `name`, callers will hit their timeout
	pub fn stalling_on(mut self, name: &str) -> Self {
		self.stalling.insert(Cid::parse(cid_for(name)).unwrap());
		self
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn with_contents(self, cid: &str, bytes: &[u8]) -> Self {
		self.contents.insert(Cid::parse(cid).unwrap(), bytes.to_vec());
		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl ContentStoreClient for ScriptedClient {
	fn name(&self) -> &'static str {
		"scripted"
	}

	async fn fetch_by_cid(&self, cid: &Cid, timeout: Duration) -> Result<Vec<u8>, FetchError> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		let _guard = InFlightGuard(Arc::clone(&self.in_flight));
		self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

		if self.stalling.contains(cid) {
			sleep(timeout * 10).await;
		}

		if !self.delay.is_zero() {
			sleep(self.delay).await;
		}

		if self.failing.contains(cid) {
			return Err(FetchError::ClientFailed {
				cid: cid.clone(),
				reason: "scripted failure".to_string(),
			});
		}

		self.contents.fetch_by_cid(cid, timeout).await
	}
}
