//! Byte bounded pagination of an owner's records.
//!
//! Records are ordered by size, largest first, with ties broken by ascending id so the order
//! never depends on how the store happened to return them. Pages are then filled greedily:
//! a record joins the current page while the page stays within both the byte threshold and
//! the record count cap, otherwise it opens the next page. Content can't be split, so a record
//! larger than the threshold gets a page of its own.

use std::cmp::Ordering;

use tracing::{debug, instrument};

use super::{
	error::{ConfigError, Error},
	record::{DataStorageRecord, OwnerId, Page},
	store::RecordStore,
};

/// 1 GiB
pub const DEFAULT_BYTE_THRESHOLD: u64 = 1024 * 1024 * 1024;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 10;

/// Bounds for a single pagination call, both always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
	byte_threshold: u64,
	max_page_size: usize,
}

impl Default for PaginationConfig {
	fn default() -> Self {
		Self {
			byte_threshold: DEFAULT_BYTE_THRESHOLD,
			max_page_size: DEFAULT_MAX_PAGE_SIZE,
		}
	}
}

impl PaginationConfig {
	pub const fn new(byte_threshold: u64, max_page_size: usize) -> Result<Self, ConfigError> {
		if byte_threshold == 0 {
			return Err(ConfigError::ZeroByteThreshold);
		}

		if max_page_size == 0 {
			return Err(ConfigError::ZeroMaxPageSize);
		}

		Ok(Self {
			byte_threshold,
			max_page_size,
		})
	}

	#[must_use]
	pub const fn byte_threshold(&self) -> u64 {
		self.byte_threshold
	}

	#[must_use]
	pub const fn max_page_size(&self) -> usize {
		self.max_page_size
	}
}

/// Size descending, then id ascending
fn pagination_order(a: &DataStorageRecord, b: &DataStorageRecord) -> Ordering {
	b.file_size
		.cmp(&a.file_size)
		.then_with(|| a.id.cmp(&b.id))
}

pub fn sort_records(records: &mut [DataStorageRecord]) {
	records.sort_unstable_by(pagination_order);
}

/// Splits an already fetched record set into pages, see the module docs for the rules.
///
/// An empty record set yields no pages at all.
#[must_use]
pub fn paginate_records(mut records: Vec<DataStorageRecord>, config: PaginationConfig) -> Vec<Page> {
	sort_records(&mut records);

	let mut pages = Vec::new();
	let mut current = Vec::with_capacity(config.max_page_size.min(records.len()));
	let mut current_bytes = 0_u64;

	for record in records {
		let fits = current.len() < config.max_page_size
			&& current_bytes.saturating_add(record.file_size) <= config.byte_threshold;

		if !current.is_empty() && !fits {
			pages.push(Page {
				number: pages.len() + 1,
				total_bytes: current_bytes,
				records: std::mem::take(&mut current),
			});
			current_bytes = 0;
		}

		current_bytes = current_bytes.saturating_add(record.file_size);
		current.push(record);
	}

	if !current.is_empty() {
		pages.push(Page {
			number: pages.len() + 1,
			total_bytes: current_bytes,
			records: current,
		});
	}

	pages
}

/// Fetches every record of `owner_id` and paginates them.
///
/// A failing store fails the whole call, we never hand out partial page sequences.
#[instrument(skip(store), err)]
pub async fn paginate<S: RecordStore + ?Sized>(
	store: &S,
	owner_id: OwnerId,
	config: PaginationConfig,
) -> Result<Vec<Page>, Error> {
	let records = store
		.list_by_owner(owner_id)
		.await
		.map_err(|source| Error::Store { owner_id, source })?;

	let records_count = records.len();
	let pages = paginate_records(records, config);

	debug!(records_count, pages_count = pages.len(), "Paginated records;");

	Ok(pages)
}

/// Just the page at the 1-based position `number`, or `None` when there aren't that many pages.
#[instrument(skip(store), err)]
pub async fn page<S: RecordStore + ?Sized>(
	store: &S,
	owner_id: OwnerId,
	config: PaginationConfig,
	number: usize,
) -> Result<Option<Page>, Error> {
	if number == 0 {
		return Err(ConfigError::ZeroPageNumber.into());
	}

	Ok(paginate(store, owner_id, config)
		.await?
		.into_iter()
		.nth(number - 1))
}

/// Every record of `owner_id`, flattened in page order.
pub async fn list_records<S: RecordStore + ?Sized>(
	store: &S,
	owner_id: OwnerId,
	config: PaginationConfig,
) -> Result<Vec<DataStorageRecord>, Error> {
	Ok(paginate(store, owner_id, config)
		.await?
		.into_iter()
		.flat_map(Page::into_iter)
		.collect())
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use chrono::Utc;
	use pretty_assertions::assert_eq;
	use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

	use super::*;

	const MB: u64 = 1_000_000;

	fn record(id: i64, file_size: u64) -> DataStorageRecord {
		DataStorageRecord {
			id,
			owner_id: OwnerId::default(),
			file_name: format!("file-{id}"),
			file_type: "application/octet-stream".to_string(),
			file_cid: format!("Qm{id}"),
			file_size,
			file_hash: String::new(),
			upload_timestamp: Utc::now(),
		}
	}

	fn sizes(pages: &[Page]) -> Vec<Vec<u64>> {
		pages
			.iter()
			.map(|page| page.iter().map(|record| record.file_size).collect())
			.collect()
	}

	fn config(byte_threshold: u64, max_page_size: usize) -> PaginationConfig {
		PaginationConfig::new(byte_threshold, max_page_size).unwrap()
	}

	#[test]
	fn rejects_non_positive_bounds() {
		assert!(matches!(
			PaginationConfig::new(0, 10),
			Err(ConfigError::ZeroByteThreshold)
		));
		assert!(matches!(
			PaginationConfig::new(DEFAULT_BYTE_THRESHOLD, 0),
			Err(ConfigError::ZeroMaxPageSize)
		));
	}

	#[test]
	fn defaults_are_one_gib_and_ten_records() {
		let config = PaginationConfig::default();
		assert_eq!(config.byte_threshold(), 1_073_741_824);
		assert_eq!(config.max_page_size(), 10);
	}

	#[test]
	fn largest_file_that_does_not_fit_with_the_next_goes_alone() {
		let records = vec![
			record(1, 200 * MB),
			record(2, 900 * MB),
			record(3, 100 * MB),
			record(4, 500 * MB),
		];

		let pages = paginate_records(records, PaginationConfig::default());

		assert_eq!(
			sizes(&pages),
			vec![vec![900 * MB], vec![500 * MB, 200 * MB, 100 * MB]]
		);
		assert_eq!(
			pages.iter().map(Page::len).collect::<Vec<_>>(),
			vec![1, 3]
		);
		assert_eq!(pages[1].total_bytes, 800 * MB);
		assert_eq!(
			pages.iter().map(|page| page.number).collect::<Vec<_>>(),
			vec![1, 2]
		);
	}

	#[test]
	fn oversize_record_is_kept_in_its_own_page() {
		let pages = paginate_records(
			vec![record(1, 2 * DEFAULT_BYTE_THRESHOLD)],
			PaginationConfig::default(),
		);

		assert_eq!(pages.len(), 1);
		assert_eq!(pages[0].records[0].id, 1);
		assert_eq!(pages[0].total_bytes, 2 * DEFAULT_BYTE_THRESHOLD);
	}

	#[test]
	fn oversize_records_never_share_a_page() {
		let pages = paginate_records(
			vec![record(1, 50), record(2, 300), record(3, 200), record(4, 10)],
			config(100, 10),
		);

		assert_eq!(sizes(&pages), vec![vec![300], vec![200], vec![50, 10]]);
	}

	#[test]
	fn empty_record_set_has_no_pages() {
		assert!(paginate_records(Vec::new(), PaginationConfig::default()).is_empty());
	}

	#[test]
	fn record_count_cap_closes_pages() {
		let records = (1..=7).map(|id| record(id, 1)).collect();

		let pages = paginate_records(records, config(1_000, 3));

		assert_eq!(
			pages.iter().map(Page::len).collect::<Vec<_>>(),
			vec![3, 3, 1]
		);
	}

	#[test]
	fn zero_sized_records_are_bounded_by_count_only() {
		let records = (1..=4).map(|id| record(id, 0)).collect();

		let pages = paginate_records(records, config(1, 2));

		assert_eq!(sizes(&pages), vec![vec![0, 0], vec![0, 0]]);
	}

	#[test]
	fn exact_threshold_fits() {
		let pages = paginate_records(vec![record(1, 60), record(2, 40)], config(100, 10));

		assert_eq!(sizes(&pages), vec![vec![60, 40]]);
	}

	#[test]
	fn ties_are_broken_by_ascending_id() {
		let pages = paginate_records(
			vec![record(9, 10), record(3, 10), record(5, 10), record(1, 20)],
			config(1_000, 10),
		);

		assert_eq!(
			pages[0].iter().map(|record| record.id).collect::<Vec<_>>(),
			vec![1, 3, 5, 9]
		);
	}

	#[test]
	fn randomized_record_sets_hold_every_invariant() {
		let mut rng = StdRng::seed_from_u64(0x5eed);

		for _ in 0..200 {
			let byte_threshold = rng.gen_range(1..=5_000);
			let max_page_size = rng.gen_range(1..=8);
			let count = rng.gen_range(0..60);

			let mut records = (0..count)
				.map(|id| record(id, rng.gen_range(0..=byte_threshold * 2)))
				.collect::<Vec<_>>();
			records.shuffle(&mut rng);

			let config = config(byte_threshold, max_page_size);
			let pages = paginate_records(records.clone(), config);

			// Coverage, every record exactly once
			let mut seen = HashSet::new();
			for page in &pages {
				for record in page.iter() {
					assert!(seen.insert(record.id), "record {} paginated twice", record.id);
				}
			}
			assert_eq!(seen.len(), records.len());

			// Bounds, only singleton pages may go over the threshold
			for page in &pages {
				assert!(!page.is_empty());
				assert!(page.len() <= max_page_size);
				assert_eq!(
					page.total_bytes,
					page.iter().map(|record| record.file_size).sum::<u64>()
				);
				if page.len() > 1 {
					assert!(page.total_bytes <= byte_threshold);
				}
			}

			// Pages follow the sorted order
			let flattened = pages
				.iter()
				.flat_map(|page| page.iter().cloned())
				.collect::<Vec<_>>();
			let mut sorted = records.clone();
			sort_records(&mut sorted);
			assert_eq!(flattened, sorted);

			// Greedy minimality, the first record of each page could not have joined the previous one
			for pair in pages.windows(2) {
				let (previous, next) = (&pair[0], &pair[1]);
				assert!(
					previous.len() == max_page_size
						|| previous.total_bytes + next.records[0].file_size > byte_threshold
				);
			}

			// Determinism, store order doesn't matter
			records.shuffle(&mut rng);
			assert_eq!(paginate_records(records, config), pages);
		}
	}
}
