#![allow(dead_code, clippy::unwrap_used)]

use nc_core::{DataStorageRecord, NewRecord, OwnerId};

use chrono::{TimeZone, Utc};

pub mod clients;
pub mod stores;

pub const MB: u64 = 1_000_000;

/// A record whose CID is derived from `name`, so clients can be scripted by file name
pub fn new_record(owner_id: OwnerId, name: &str, file_size: u64) -> NewRecord {
	NewRecord::new(
		owner_id,
		name,
		"application/octet-stream",
		cid_for(name),
		file_size,
		nc_core::fetch::sha256_hex(contents_for(name).as_bytes()),
	)
	.with_upload_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

pub fn cid_for(name: &str) -> String {
	format!(
		"Qm{}",
		name.chars()
			.filter(char::is_ascii_alphanumeric)
			.collect::<String>()
	)
}

pub fn contents_for(name: &str) -> String {
	format!("contents of {name}")
}

pub fn ids(records: &[DataStorageRecord]) -> Vec<i64> {
	records.iter().map(|record| record.id).collect()
}
