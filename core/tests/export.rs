use nc_core::{
	content_store::FetchErrorKind, export, BulkExportPipeline, ConfigError, ContentFetcher,
	Credential, Error, ExportItem, ExportOptions, FailurePolicy, MemoryRecordStore, NewRecord,
	OwnerId, StaticTokenResolver, StoreError,
};

use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::StreamExt;
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

mod common;

use common::{clients::ScriptedClient, contents_for, new_record, stores::UnavailableStore};

fn pipeline(client: &Arc<ScriptedClient>, max_concurrent_fetches: usize) -> BulkExportPipeline {
	BulkExportPipeline::new(ContentFetcher::new(client.clone(), max_concurrent_fetches).unwrap())
}

/// Owner with files named after `names`, sized so they're exported in the given order
fn store_with(names: &[&str]) -> (OwnerId, MemoryRecordStore) {
	let owner = OwnerId::new();
	let store = MemoryRecordStore::new();

	for (idx, name) in names.iter().enumerate() {
		store.insert(new_record(owner, name, ((names.len() - idx) * 100) as u64));
	}

	(owner, store)
}

#[tokio::test]
#[traced_test]
async fn exports_every_file_with_its_contents() {
	let names = ["a.txt", "b.txt", "c.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names));

	let stream = pipeline(&client, 4)
		.export(&store, owner, owner, ExportOptions::default())
		.await
		.unwrap();
	assert_eq!(stream.len(), 3);

	let envelopes = stream
		.map(|item| item.into_result().unwrap())
		.collect::<Vec<_>>()
		.await;

	assert_eq!(
		envelopes
			.iter()
			.map(|envelope| envelope.file_name.as_str())
			.collect::<Vec<_>>(),
		names
	);
	for envelope in &envelopes {
		assert_eq!(envelope.owner_id, owner);
		assert_eq!(envelope.bytes, contents_for(&envelope.file_name).into_bytes());
	}
	assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn other_identities_are_refused_before_any_work() {
	let client = Arc::new(ScriptedClient::serving(["a.txt"]));
	let store = UnavailableStore::default();
	let owner = OwnerId::new();
	let intruder = OwnerId::new();

	let err = pipeline(&client, 1)
		.export(&store, intruder, owner, ExportOptions::default())
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		Error::Unauthorized { requesting, owner: target } if requesting == intruder && target == owner
	));
	assert!(!err.is_retryable());
	assert_eq!(store.calls(), 0);
	assert_eq!(client.calls(), 0);
}

#[test]
fn owners_are_the_only_authorized_exporters() {
	let owner = OwnerId::new();
	let intruder = OwnerId::new();

	assert!(export::authorize(owner, owner).is_ok());
	assert!(matches!(
		export::authorize(intruder, owner),
		Err(Error::Unauthorized { requesting, .. }) if requesting == intruder
	));
}

#[tokio::test]
async fn invalid_options_are_refused_before_listing() {
	let client = Arc::new(ScriptedClient::new());
	let store = UnavailableStore::default();
	let owner = OwnerId::new();

	let err = pipeline(&client, 1)
		.export(
			&store,
			owner,
			owner,
			ExportOptions {
				concurrency: 0,
				..Default::default()
			},
		)
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Config(ConfigError::ZeroConcurrency)));
	assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn failing_store_fails_the_export() {
	let client = Arc::new(ScriptedClient::new());
	let owner = OwnerId::new();

	let err = pipeline(&client, 1)
		.export(
			&UnavailableStore::default(),
			owner,
			owner,
			ExportOptions::default(),
		)
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		Error::Store {
			source: StoreError::Unavailable(_),
			..
		}
	));
	assert_eq!(client.calls(), 0);
}

#[tokio::test]
#[traced_test]
async fn one_failure_does_not_stop_the_rest() {
	let names = ["a.txt", "b.txt", "c.txt", "d.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names).failing_on("b.txt"));

	let items = pipeline(&client, 2)
		.export(
			&store,
			owner,
			owner,
			ExportOptions {
				concurrency: 2,
				..Default::default()
			},
		)
		.await
		.unwrap()
		.collect::<Vec<_>>()
		.await;

	// Exactly one outcome per record
	assert_eq!(items.len(), 4);
	assert_eq!(
		items
			.iter()
			.map(ExportItem::record_id)
			.collect::<HashSet<_>>()
			.len(),
		4
	);

	let failures = items
		.into_iter()
		.filter_map(|item| item.into_result().err())
		.collect::<Vec<_>>();
	assert_eq!(failures.len(), 1);
	assert_eq!(failures[0].file_name, "b.txt");
	assert_eq!(failures[0].error_kind(), FetchErrorKind::Client);
	assert_eq!(failures[0].report().error_kind, FetchErrorKind::Client);
}

#[tokio::test]
async fn abort_policy_stops_after_the_first_failure() {
	let names = ["a.txt", "b.txt", "c.txt", "d.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names).failing_on("b.txt"));

	let items = pipeline(&client, 1)
		.export(
			&store,
			owner,
			owner,
			ExportOptions {
				failure_policy: FailurePolicy::Abort,
				..Default::default()
			},
		)
		.await
		.unwrap()
		.collect::<Vec<_>>()
		.await;

	assert_eq!(items.len(), 2);
	assert!(!items[0].is_failure());
	assert!(items[1].is_failure());
	assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn missing_and_malformed_contents_are_reported_per_item() {
	let owner = OwnerId::new();
	let store = MemoryRecordStore::new();
	store.insert(new_record(owner, "present.txt", 300));
	store.insert(new_record(owner, "unpinned.txt", 200));
	store.insert(NewRecord::new(
		owner,
		"mangled.txt",
		"text/plain",
		"not a cid",
		100,
		"",
	));
	let client = Arc::new(ScriptedClient::serving(["present.txt"]));

	let kinds = pipeline(&client, 1)
		.export(&store, owner, owner, ExportOptions::default())
		.await
		.unwrap()
		.map(|item| item.into_result().err().map(|failure| failure.error_kind()))
		.collect::<Vec<_>>()
		.await;

	assert_eq!(
		kinds,
		vec![
			None,
			Some(FetchErrorKind::NotFound),
			Some(FetchErrorKind::InvalidCid)
		]
	);
	// The malformed CID never reaches the client
	assert_eq!(client.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_fetches_time_out() {
	let names = ["slow.txt", "fast.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names).stalling_on("slow.txt"));

	let items = pipeline(&client, 1)
		.export(
			&store,
			owner,
			owner,
			ExportOptions {
				fetch_timeout: Duration::from_secs(5),
				..Default::default()
			},
		)
		.await
		.unwrap()
		.collect::<Vec<_>>()
		.await;

	assert_eq!(items.len(), 2);
	assert!(matches!(
		&items[0],
		ExportItem::Failure(failure) if failure.error_kind() == FetchErrorKind::Timeout
	));
	assert!(!items[1].is_failure());
}

#[tokio::test(start_paused = true)]
async fn per_export_concurrency_is_respected() {
	let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names).with_delay(Duration::from_millis(50)));

	let items = pipeline(&client, 16)
		.export(
			&store,
			owner,
			owner,
			ExportOptions {
				concurrency: 3,
				..Default::default()
			},
		)
		.await
		.unwrap()
		.collect::<Vec<_>>()
		.await;

	assert_eq!(items.len(), names.len());
	assert!(items.iter().all(|item| !item.is_failure()));
	assert!(client.max_in_flight() <= 3);
	assert!(client.max_in_flight() > 1);
}

#[tokio::test(start_paused = true)]
async fn fetcher_bound_applies_across_exports() {
	let names = ["a", "b", "c", "d", "e", "f"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names).with_delay(Duration::from_millis(50)));
	let pipeline = pipeline(&client, 2);

	let options = || ExportOptions {
		concurrency: 4,
		..Default::default()
	};

	let first = pipeline
		.export(&store, owner, owner, options())
		.await
		.unwrap();
	let second = pipeline
		.export(&store, owner, owner, options())
		.await
		.unwrap();

	let (first, second) = tokio::join!(
		first.collect::<Vec<_>>(),
		second.collect::<Vec<_>>()
	);

	assert_eq!(first.len() + second.len(), 2 * names.len());
	assert!(client.max_in_flight() <= 2);
}

#[tokio::test]
async fn cancelled_before_polling_fetches_nothing() {
	let names = ["a.txt", "b.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names));

	let stream = pipeline(&client, 1)
		.export(&store, owner, owner, ExportOptions::default())
		.await
		.unwrap();
	stream.cancel();

	assert!(stream.collect::<Vec<_>>().await.is_empty());
	assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn cancelling_midway_stops_dispatching() {
	let names = ["a.txt", "b.txt", "c.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names));

	let options = ExportOptions::default();
	let cancel_token = options.cancel_token.clone();

	let mut stream = pipeline(&client, 1)
		.export(&store, owner, owner, options)
		.await
		.unwrap();

	let first = stream.next().await.unwrap();
	assert!(!first.is_failure());
	assert_eq!(stream.remaining(), 2);

	cancel_token.cancel();

	assert!(stream.next().await.is_none());
	assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn owner_without_files_gets_an_empty_export() {
	let client = Arc::new(ScriptedClient::new());
	let owner = OwnerId::new();

	let stream = pipeline(&client, 1)
		.export(&MemoryRecordStore::new(), owner, owner, ExportOptions::default())
		.await
		.unwrap();

	assert!(stream.is_empty());
	assert!(stream.collect::<Vec<_>>().await.is_empty());
}

#[tokio::test]
async fn credentials_are_resolved_before_exporting() {
	let names = ["a.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names));
	let resolver = StaticTokenResolver::new().with_token("owner-token", owner);
	let pipeline = pipeline(&client, 1);

	let err = pipeline
		.export_with_credential(
			&store,
			&resolver,
			&Credential::new("stolen-token"),
			owner,
			ExportOptions::default(),
		)
		.await
		.unwrap_err();
	assert!(matches!(err, Error::Unauthenticated(_)));

	let items = pipeline
		.export_with_credential(
			&store,
			&resolver,
			&Credential::new("owner-token"),
			owner,
			ExportOptions::default(),
		)
		.await
		.unwrap()
		.collect::<Vec<_>>()
		.await;
	assert_eq!(items.len(), 1);
	assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn tampered_contents_fail_integrity_verification() {
	let owner = OwnerId::new();
	let store = MemoryRecordStore::new();
	let record = store.insert(new_record(owner, "a.txt", 10));
	let client = Arc::new(
		ScriptedClient::new().with_contents(&record.file_cid, b"definitely not the original"),
	);

	let pipeline = BulkExportPipeline::new(
		ContentFetcher::new(client.clone(), 1)
			.unwrap()
			.with_integrity_verification(true),
	);

	let items = pipeline
		.export(&store, owner, owner, ExportOptions::default())
		.await
		.unwrap()
		.collect::<Vec<_>>()
		.await;

	assert!(matches!(
		&items[..],
		[ExportItem::Failure(failure)] if failure.error_kind() == FetchErrorKind::Integrity
	));
}

#[tokio::test]
async fn exporting_again_fetches_again() {
	let names = ["a.txt", "b.txt"];
	let (owner, store) = store_with(&names);
	let client = Arc::new(ScriptedClient::serving(names));
	let pipeline = pipeline(&client, 1);

	for _ in 0..2 {
		pipeline
			.export(&store, owner, owner, ExportOptions::default())
			.await
			.unwrap()
			.collect::<Vec<_>>()
			.await;
	}

	assert_eq!(client.calls(), 4);
}
