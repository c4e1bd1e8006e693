use nc_core::{NodeConfig, SqliteRecordStore};

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
	Human,
	Json,
}

/// Everything a command needs, built once from the flags and the node config
#[derive(Debug, Clone)]
pub struct Context {
	pub config: NodeConfig,
	pub format: OutputFormat,
	pub data_dir: PathBuf,
}

impl Context {
	pub const fn new(config: NodeConfig, format: OutputFormat, data_dir: PathBuf) -> Self {
		Self {
			config,
			format,
			data_dir,
		}
	}

	pub async fn open_store(&self) -> Result<SqliteRecordStore> {
		let path = self.config.database_path(&self.data_dir);
		debug!(path = %path.display(), "Opening records database;");

		Ok(SqliteRecordStore::open(path).await?)
	}
}
