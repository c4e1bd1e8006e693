//! Bulk export of an owner's files.
//!
//! The requesting identity is checked before anything else happens. Records are then
//! enumerated in page order and their contents fetched lazily, one outcome per record, as the
//! returned [`ExportStream`] is polled.

use nc_content_store::{FetchError, FetchErrorKind};

use std::{
	pin::Pin,
	task::{Context, Poll},
	time::Duration,
};

use async_stream::stream;
use futures::{stream::FuturesUnordered, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use super::{
	error::{ConfigError, Error},
	fetch::ContentFetcher,
	identity::{Credential, IdentityResolver},
	paginator::{self, PaginationConfig},
	record::{DataStorageRecord, FileEnvelope, ItemFailureReport, OwnerId, RecordId},
	store::RecordStore,
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// What to do with the rest of the export once a record can't be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
	/// Report the failure and keep going
	#[default]
	Continue,
	/// Report the failure and stop, for callers that need all or nothing
	Abort,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
	pub pagination: PaginationConfig,
	pub fetch_timeout: Duration,
	/// How many records may be fetching at the same time for this export
	pub concurrency: usize,
	pub failure_policy: FailurePolicy,
	/// Cancelling this token stops the export between records
	pub cancel_token: CancellationToken,
}

impl Default for ExportOptions {
	fn default() -> Self {
		Self {
			pagination: PaginationConfig::default(),
			fetch_timeout: DEFAULT_FETCH_TIMEOUT,
			concurrency: 1,
			failure_policy: FailurePolicy::default(),
			cancel_token: CancellationToken::new(),
		}
	}
}

impl ExportOptions {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.concurrency == 0 {
			return Err(ConfigError::ZeroConcurrency);
		}

		if self.fetch_timeout.is_zero() {
			return Err(ConfigError::ZeroFetchTimeout);
		}

		Ok(())
	}
}

/// A record whose content couldn't be fetched. Reported in place of its envelope.
#[derive(Error, Debug)]
#[error("failed to export record <id='{record_id}', cid='{cid}'>")]
pub struct ItemFailure {
	pub record_id: RecordId,
	pub file_name: String,
	pub cid: String,
	#[source]
	pub error: FetchError,
}

impl ItemFailure {
	#[must_use]
	pub const fn error_kind(&self) -> FetchErrorKind {
		self.error.kind()
	}

	#[must_use]
	pub fn report(&self) -> ItemFailureReport {
		ItemFailureReport {
			record_id: self.record_id,
			file_name: self.file_name.clone(),
			cid: self.cid.clone(),
			error_kind: self.error.kind(),
			message: self.error.to_string(),
		}
	}
}

/// Outcome for a single record of an export.
#[derive(Debug)]
pub enum ExportItem {
	Envelope(FileEnvelope),
	Failure(ItemFailure),
}

impl ExportItem {
	#[must_use]
	pub const fn record_id(&self) -> RecordId {
		match self {
			Self::Envelope(envelope) => envelope.record_id,
			Self::Failure(failure) => failure.record_id,
		}
	}

	#[must_use]
	pub const fn is_failure(&self) -> bool {
		matches!(self, Self::Failure(_))
	}

	pub fn into_result(self) -> Result<FileEnvelope, ItemFailure> {
		match self {
			Self::Envelope(envelope) => Ok(envelope),
			Self::Failure(failure) => Err(failure),
		}
	}
}

/// Finite, lazy and single use sequence of [`ExportItem`]s.
///
/// Nothing is fetched until the stream is polled. It yields at most one item per enumerated
/// record and can't be restarted, exporting again means calling
/// [`BulkExportPipeline::export`] again, which fetches everything anew.
#[must_use = "streams do nothing unless polled"]
pub struct ExportStream {
	inner: Pin<Box<dyn Stream<Item = ExportItem> + Send>>,
	total: usize,
	yielded: usize,
	cancel_token: CancellationToken,
}

impl ExportStream {
	fn new(
		fetcher: ContentFetcher,
		owner_id: OwnerId,
		records: Vec<DataStorageRecord>,
		options: &ExportOptions,
	) -> Self {
		let total = records.len();
		let cancel_token = options.cancel_token.clone();

		Self {
			inner: Box::pin(outcomes(
				fetcher,
				owner_id,
				records,
				options.fetch_timeout,
				options.concurrency,
				options.failure_policy,
				cancel_token.clone(),
			)),
			total,
			yielded: 0,
			cancel_token,
		}
	}

	/// Number of records enumerated for this export
	#[must_use]
	pub const fn len(&self) -> usize {
		self.total
	}

	#[must_use]
	pub const fn is_empty(&self) -> bool {
		self.total == 0
	}

	/// Upper bound on how many items are still to come
	#[must_use]
	pub const fn remaining(&self) -> usize {
		self.total - self.yielded
	}

	/// Stops the export, records not dispatched yet will never be fetched and fetches in
	/// flight are dropped
	pub fn cancel(&self) {
		self.cancel_token.cancel();
	}

	#[must_use]
	pub fn cancel_token(&self) -> CancellationToken {
		self.cancel_token.clone()
	}
}

impl std::fmt::Debug for ExportStream {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExportStream")
			.field("total", &self.total)
			.field("yielded", &self.yielded)
			.field("cancelled", &self.cancel_token.is_cancelled())
			.finish_non_exhaustive()
	}
}

impl Stream for ExportStream {
	type Item = ExportItem;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let poll = self.inner.as_mut().poll_next(cx);
		if let Poll::Ready(Some(_)) = &poll {
			self.yielded += 1;
		}

		poll
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(0, Some(self.remaining()))
	}
}

fn outcomes(
	fetcher: ContentFetcher,
	owner_id: OwnerId,
	records: Vec<DataStorageRecord>,
	fetch_timeout: Duration,
	concurrency: usize,
	failure_policy: FailurePolicy,
	cancel_token: CancellationToken,
) -> impl Stream<Item = ExportItem> + Send {
	stream! {
		let mut pending = records.into_iter();
		let mut in_flight = FuturesUnordered::new();

		loop {
			while in_flight.len() < concurrency && !cancel_token.is_cancelled() {
				let Some(record) = pending.next() else {
					break;
				};

				in_flight.push(fetch_one(fetcher.clone(), owner_id, record, fetch_timeout));
			}

			let item = tokio::select! {
				biased;

				() = cancel_token.cancelled() => {
					debug!(
						dropped_in_flight = in_flight.len(),
						never_dispatched = pending.len(),
						"Export cancelled;",
					);
					break;
				}

				maybe_item = in_flight.next() => match maybe_item {
					Some(item) => item,
					None => break,
				},
			};

			let abort = item.is_failure() && failure_policy == FailurePolicy::Abort;

			yield item;

			if abort {
				debug!(
					dropped_in_flight = in_flight.len(),
					never_dispatched = pending.len(),
					"Export aborted on first failure;",
				);
				break;
			}
		}
	}
}

async fn fetch_one(
	fetcher: ContentFetcher,
	owner_id: OwnerId,
	record: DataStorageRecord,
	fetch_timeout: Duration,
) -> ExportItem {
	match fetcher.fetch_record(&record, fetch_timeout).await {
		Ok(bytes) => {
			trace!(record_id = record.id, bytes = bytes.len(), "Exported record;");
			ExportItem::Envelope(FileEnvelope::new(owner_id, record, bytes))
		}
		Err(error) => {
			warn!(
				record_id = record.id,
				cid = %record.file_cid,
				?error,
				"Failed to fetch record content;",
			);
			ExportItem::Failure(ItemFailure {
				record_id: record.id,
				file_name: record.file_name,
				cid: record.file_cid,
				error,
			})
		}
	}
}

#[derive(Debug, Clone)]
pub struct BulkExportPipeline {
	fetcher: ContentFetcher,
}

/// Only owners may export their own files. Callers holding other resources, like a database
/// that still has to be opened, can check this up front.
pub fn authorize(requesting_identity: OwnerId, owner_id: OwnerId) -> Result<(), Error> {
	if requesting_identity == owner_id {
		Ok(())
	} else {
		Err(Error::Unauthorized {
			requesting: requesting_identity,
			owner: owner_id,
		})
	}
}

impl BulkExportPipeline {
	#[must_use]
	pub const fn new(fetcher: ContentFetcher) -> Self {
		Self { fetcher }
	}

	#[must_use]
	pub const fn fetcher(&self) -> &ContentFetcher {
		&self.fetcher
	}

	/// Exports every file of `owner_id` on behalf of `requesting_identity`.
	///
	/// Fails right away, without touching the store or the content store, when the requesting
	/// identity isn't the owner or `options` are invalid. A failing store fails the whole
	/// call. Once the stream is returned, content failures are reported per record.
	#[instrument(skip(self, store, options), err)]
	pub async fn export<S: RecordStore + ?Sized>(
		&self,
		store: &S,
		requesting_identity: OwnerId,
		owner_id: OwnerId,
		options: ExportOptions,
	) -> Result<ExportStream, Error> {
		authorize(requesting_identity, owner_id)?;

		options.validate()?;

		let records = paginator::list_records(store, owner_id, options.pagination).await?;

		debug!(records_count = records.len(), "Starting export;");

		Ok(ExportStream::new(
			self.fetcher.clone(),
			owner_id,
			records,
			&options,
		))
	}

	/// Same as [`Self::export`], with the requesting identity resolved from `credential`
	pub async fn export_with_credential<S, R>(
		&self,
		store: &S,
		resolver: &R,
		credential: &Credential,
		owner_id: OwnerId,
		options: ExportOptions,
	) -> Result<ExportStream, Error>
	where
		S: RecordStore + ?Sized,
		R: IdentityResolver + ?Sized,
	{
		let requesting_identity = resolver.resolve_current_identity(credential).await?;

		self.export(store, requesting_identity, owner_id, options)
			.await
	}
}
