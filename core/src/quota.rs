use tracing::{debug, instrument};

use super::{
	error::Error,
	record::{OwnerId, UsageSnapshot},
	store::RecordStore,
};

/// Sums the sizes of every record `owner_id` currently has.
///
/// An owner without records is not an error, they just use nothing.
#[instrument(skip(store), err)]
pub async fn compute_usage<S: RecordStore + ?Sized>(
	store: &S,
	owner_id: OwnerId,
) -> Result<UsageSnapshot, Error> {
	let records = store
		.list_by_owner(owner_id)
		.await
		.map_err(|source| Error::Aggregation { owner_id, source })?;

	let usage = UsageSnapshot::from_records(owner_id, &records)
		.map_err(|source| Error::Aggregation { owner_id, source })?;

	debug!(
		total_bytes = usage.total_bytes,
		record_count = usage.record_count,
		"Computed usage;"
	);

	Ok(usage)
}
