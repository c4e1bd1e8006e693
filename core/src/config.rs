//! Node configuration, the single place every tunable of the service comes from.
//!
//! It is stored as JSON in the data directory and created with defaults the first time a node
//! starts. Operations never read it directly, the bootstrap turns it into the explicit option
//! structs each operation takes.

use nc_content_store::{ContentStoreClient, IpgetClient, KuboClient};
use nc_utils::error::FileIOError;

use std::{
	io,
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use super::{
	error::ConfigError,
	export::{ExportOptions, FailurePolicy},
	fetch::ContentFetcher,
	paginator::{PaginationConfig, DEFAULT_BYTE_THRESHOLD, DEFAULT_MAX_PAGE_SIZE},
};

/// CONFIG_FILE_NAME is the name of the file which stores the [`NodeConfig`]
pub const CONFIG_FILE_NAME: &str = "nuclei.json";
pub const DEFAULT_DATABASE_FILE_NAME: &str = "nuclei.db";
pub const DEFAULT_KUBO_API_URL: &str = "http://127.0.0.1:5001";

const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Which content store client fetches run through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ContentStoreConfig {
	/// Spawn the `ipget` binary once per file
	Ipget {
		#[serde(default = "default_ipget_binary")]
		binary: PathBuf,
	},
	/// Talk to a Kubo daemon over its RPC API
	Kubo {
		#[serde(default = "default_kubo_api_url")]
		api_url: String,
	},
}

fn default_ipget_binary() -> PathBuf {
	PathBuf::from("ipget")
}

fn default_kubo_api_url() -> String {
	DEFAULT_KUBO_API_URL.to_string()
}

impl Default for ContentStoreConfig {
	fn default() -> Self {
		Self::Ipget {
			binary: default_ipget_binary(),
		}
	}
}

impl ContentStoreConfig {
	#[must_use]
	pub fn build_client(&self) -> Arc<dyn ContentStoreClient> {
		match self {
			Self::Ipget { binary } => Arc::new(IpgetClient::new(binary.clone())),
			Self::Kubo { api_url } => Arc::new(KuboClient::new(api_url.clone())),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
	pub byte_threshold: u64,
	pub max_page_size: usize,
}

impl Default for PaginationSettings {
	fn default() -> Self {
		Self {
			byte_threshold: DEFAULT_BYTE_THRESHOLD,
			max_page_size: DEFAULT_MAX_PAGE_SIZE,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
	pub concurrency: usize,
	pub fetch_timeout_secs: u64,
	pub failure_policy: FailurePolicy,
	/// Check fetched contents against the records' SHA-256 digests
	pub verify_integrity: bool,
}

impl Default for ExportSettings {
	fn default() -> Self {
		Self {
			concurrency: 1,
			fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
			failure_policy: FailurePolicy::Continue,
			verify_integrity: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
	/// Records database, relative paths are resolved against the data directory
	#[serde(default = "default_database_path")]
	pub database_path: PathBuf,
	#[serde(default)]
	pub pagination: PaginationSettings,
	#[serde(default)]
	pub export: ExportSettings,
	/// Cap on content store client invocations running at once, across all exports
	#[serde(default = "default_max_concurrent_fetches")]
	pub max_concurrent_fetches: usize,
	#[serde(default)]
	pub content_store: ContentStoreConfig,
}

fn default_database_path() -> PathBuf {
	PathBuf::from(DEFAULT_DATABASE_FILE_NAME)
}

const fn default_max_concurrent_fetches() -> usize {
	DEFAULT_MAX_CONCURRENT_FETCHES
}

impl Default for NodeConfig {
	fn default() -> Self {
		Self {
			database_path: default_database_path(),
			pagination: PaginationSettings::default(),
			export: ExportSettings::default(),
			max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
			content_store: ContentStoreConfig::default(),
		}
	}
}

impl NodeConfig {
	#[must_use]
	pub fn config_path(data_dir: impl AsRef<Path>) -> PathBuf {
		data_dir.as_ref().join(CONFIG_FILE_NAME)
	}

	/// Loads the config from `data_dir`, writing a default one if there is none yet
	pub async fn load(data_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let data_dir = data_dir.as_ref();
		let path = Self::config_path(data_dir);

		match fs::read(&path).await {
			Ok(data) => {
				let config = serde_json::from_slice::<Self>(&data).map_err(|source| {
					ConfigError::Parse {
						path: path.as_path().into(),
						source,
					}
				})?;

				debug!(path = %path.display(), "Loaded node config;");

				config.validate()?;
				Ok(config)
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				let config = Self::default();
				config.save(data_dir).await?;

				info!(path = %path.display(), "Created default node config;");

				Ok(config)
			}
			Err(e) => {
				Err(FileIOError::from_std_io_err_with_msg(&path, e, "reading node config").into())
			}
		}
	}

	pub async fn save(&self, data_dir: impl AsRef<Path>) -> Result<(), ConfigError> {
		let data_dir = data_dir.as_ref();

		fs::create_dir_all(data_dir)
			.await
			.map_err(|e| FileIOError::from_std_io_err(data_dir, e))?;

		let path = Self::config_path(data_dir);
		let json = serde_json::to_vec_pretty(self).map_err(ConfigError::Serialize)?;

		fs::write(&path, json)
			.await
			.map_err(|e| FileIOError::from_std_io_err_with_msg(&path, e, "writing node config"))?;

		Ok(())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		self.pagination_config()?;
		self.export_options()?;

		if self.max_concurrent_fetches == 0 {
			return Err(ConfigError::ZeroMaxConcurrentFetches);
		}

		Ok(())
	}

	#[must_use]
	pub fn database_path(&self, data_dir: impl AsRef<Path>) -> PathBuf {
		if self.database_path.is_absolute() {
			self.database_path.clone()
		} else {
			data_dir.as_ref().join(&self.database_path)
		}
	}

	pub const fn pagination_config(&self) -> Result<PaginationConfig, ConfigError> {
		PaginationConfig::new(
			self.pagination.byte_threshold,
			self.pagination.max_page_size,
		)
	}

	/// Export options with a fresh cancellation token
	pub fn export_options(&self) -> Result<ExportOptions, ConfigError> {
		let options = ExportOptions {
			pagination: self.pagination_config()?,
			fetch_timeout: Duration::from_secs(self.export.fetch_timeout_secs),
			concurrency: self.export.concurrency,
			failure_policy: self.export.failure_policy,
			..Default::default()
		};

		options.validate()?;

		Ok(options)
	}

	pub fn content_fetcher(&self) -> Result<ContentFetcher, ConfigError> {
		Ok(
			ContentFetcher::new(self.content_store.build_client(), self.max_concurrent_fetches)?
				.with_integrity_verification(self.export.verify_integrity),
		)
	}
}
