//!
//! # Nuclei Core
//!
//! Read side of the Nuclei storage service: for every owner we can tell how many bytes their
//! files take, group their files into deterministic byte bounded pages and stream the files'
//! contents back out of the content-addressable store.
//!
//! Everything here is request scoped. The record store, the requesting identity and the
//! configuration are handed to each operation explicitly, and nothing is cached between calls.
//!
//! ## Basic example
//!
//! ```
//! use nc_core::{paginator, quota, MemoryRecordStore, NewRecord, OwnerId, PaginationConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), nc_core::Error> {
//! let owner = OwnerId::new();
//! let store = MemoryRecordStore::new();
//! store.insert(NewRecord::new(owner, "notes.txt", "text/plain", "QmNotes", 1024, "ab12"));
//!
//! let usage = quota::compute_usage(&store, owner).await?;
//! assert_eq!(usage.total_bytes, 1024);
//!
//! let pages = paginator::paginate(&store, owner, PaginationConfig::default()).await?;
//! assert_eq!(pages.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod config;
pub mod export;
pub mod fetch;
pub mod identity;
pub mod paginator;
pub mod quota;
pub mod store;

mod error;
mod record;

pub use config::{ContentStoreConfig, NodeConfig};
pub use error::{ConfigError, Error, StoreError};
pub use export::{
	BulkExportPipeline, ExportItem, ExportOptions, ExportStream, FailurePolicy, ItemFailure,
};
pub use fetch::ContentFetcher;
pub use identity::{Credential, IdentityResolver, StaticTokenResolver, UnauthenticatedError};
pub use paginator::{PaginationConfig, DEFAULT_BYTE_THRESHOLD, DEFAULT_MAX_PAGE_SIZE};
pub use record::{
	DataStorageRecord, FileEnvelope, ItemFailureReport, NewRecord, OwnerId, Page, RecordId,
	UsageSnapshot,
};
pub use store::{memory::MemoryRecordStore, sqlite::SqliteRecordStore, RecordStore};

pub use nc_content_store as content_store;
