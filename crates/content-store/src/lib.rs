//!
//! # Content Store
//!
//! Narrow client contract for fetching immutable content out of a content-addressable store
//! (IPFS), plus the clients we ship:
//! - [`IpgetClient`] runs the standalone `ipget` binary once per content identifier;
//! - [`KuboClient`] talks to a running Kubo daemon through its RPC API;
//! - [`MemoryContentStore`] keeps contents in process, mostly useful for tests and tooling.
//!
//! Every client receives the timeout for the call and must not retry on its own, retry
//! policy belongs to whoever is driving the fetches.

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

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;

mod cid;
mod error;
mod ipget;
mod kubo;
mod memory;

pub use cid::{Cid, InvalidCidError};
pub use error::{FetchError, FetchErrorKind};
pub use ipget::IpgetClient;
pub use kubo::KuboClient;
pub use memory::MemoryContentStore;

/// A client able to retrieve the exact bytes addressed by a [`Cid`].
///
/// Implementations may live out of process (spawning a binary) or in process (network
/// client, memory map). They must honour the received `timeout` and must never mutate any
/// record state.
#[async_trait]
pub trait ContentStoreClient: Send + Sync + fmt::Debug + 'static {
	/// Short name used on logs
	fn name(&self) -> &'static str;

	async fn fetch_by_cid(&self, cid: &Cid, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: ContentStoreClient + ?Sized> ContentStoreClient for Arc<T> {
	fn name(&self) -> &'static str {
		(**self).name()
	}

	async fn fetch_by_cid(&self, cid: &Cid, timeout: Duration) -> Result<Vec<u8>, FetchError> {
		(**self).fetch_by_cid(cid, timeout).await
	}
}
