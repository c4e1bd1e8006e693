use std::{
	path::{Path, PathBuf},
	process::Stdio,
	time::Duration,
};

use async_trait::async_trait;
use tokio::{process::Command, time::timeout};
use tracing::{instrument, trace};

use super::{Cid, ContentStoreClient, FetchError};

const DEFAULT_BINARY: &str = "ipget";

/// Out of process client, spawns `ipget -o - <cid>` and collects its standard output.
///
/// The child is killed if the fetch future is dropped, so timing out or cancelling a fetch
/// never leaves stray processes behind.
#[derive(Debug, Clone)]
pub struct IpgetClient {
	binary: PathBuf,
}

impl Default for IpgetClient {
	fn default() -> Self {
		Self::new(DEFAULT_BINARY)
	}
}

impl IpgetClient {
	pub fn new(binary: impl Into<PathBuf>) -> Self {
		Self {
			binary: binary.into(),
		}
	}

	#[must_use]
	pub fn binary(&self) -> &Path {
		&self.binary
	}

	fn spawn_error(&self, source: std::io::Error) -> FetchError {
		FetchError::SpawnClient {
			binary: self.binary.as_path().into(),
			source,
		}
	}
}

#[async_trait]
impl ContentStoreClient for IpgetClient {
	fn name(&self) -> &'static str {
		"ipget"
	}

	#[instrument(skip(self), fields(binary = %self.binary.display()), err)]
	async fn fetch_by_cid(&self, cid: &Cid, max_wait: Duration) -> Result<Vec<u8>, FetchError> {
		let child = Command::new(&self.binary)
			.arg("-o")
			.arg("-")
			.arg(cid.as_str())
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| self.spawn_error(e))?;

		let output = timeout(max_wait, child.wait_with_output())
			.await
			.map_err(|_| FetchError::Timeout {
				cid: cid.clone(),
				timeout: max_wait,
			})?
			.map_err(|e| self.spawn_error(e))?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			let stderr = stderr.trim();

			return Err(if looks_like_not_found(stderr) {
				FetchError::NotFound { cid: cid.clone() }
			} else {
				FetchError::ClientFailed {
					cid: cid.clone(),
					reason: format!("{}: {stderr}", output.status),
				}
			});
		}

		trace!(bytes = output.stdout.len(), "Fetched content;");

		Ok(output.stdout)
	}
}

pub(super) fn looks_like_not_found(message: &str) -> bool {
	let message = message.to_ascii_lowercase();
	message.contains("not found") || message.contains("could not find")
}
