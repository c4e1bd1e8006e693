use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{instrument, trace};

use super::{ipget::looks_like_not_found, Cid, ContentStoreClient, FetchError};

/// In process client for a Kubo daemon, reads content through `POST /api/v0/cat`.
#[derive(Debug, Clone)]
pub struct KuboClient {
	client: reqwest::Client,
	api_url: String,
}

impl KuboClient {
	pub fn new(api_url: impl Into<String>) -> Self {
		Self::with_client(reqwest::Client::new(), api_url)
	}

	pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
		let mut api_url = api_url.into();
		while api_url.ends_with('/') {
			api_url.pop();
		}

		Self { client, api_url }
	}

	#[must_use]
	pub fn api_url(&self) -> &str {
		&self.api_url
	}

	fn classify(&self, cid: &Cid, max_wait: Duration, e: reqwest::Error) -> FetchError {
		if e.is_timeout() {
			FetchError::Timeout {
				cid: cid.clone(),
				timeout: max_wait,
			}
		} else if e.is_connect() {
			FetchError::Unreachable {
				endpoint: self.api_url.clone(),
				source: e,
			}
		} else {
			FetchError::Request {
				cid: cid.clone(),
				source: e,
			}
		}
	}
}

#[async_trait]
impl ContentStoreClient for KuboClient {
	fn name(&self) -> &'static str {
		"kubo"
	}

	#[instrument(skip(self), fields(api_url = %self.api_url), err)]
	async fn fetch_by_cid(&self, cid: &Cid, max_wait: Duration) -> Result<Vec<u8>, FetchError> {
		let response = self
			.client
			.post(format!("{}/api/v0/cat", self.api_url))
			.query(&[("arg", cid.as_str())])
			.timeout(max_wait)
			.send()
			.await
			.map_err(|e| self.classify(cid, max_wait, e))?;

		let status = response.status();
		if !status.is_success() {
			// Kubo answers missing blocks with a 500 and a JSON message, so we look at both
			let body = response.text().await.unwrap_or_default();

			return Err(
				if status == StatusCode::NOT_FOUND || looks_like_not_found(&body) {
					FetchError::NotFound { cid: cid.clone() }
				} else {
					FetchError::ClientFailed {
						cid: cid.clone(),
						reason: format!("HTTP {status}: {}", body.trim()),
					}
				},
			);
		}

		let bytes = response
			.bytes()
			.await
			.map_err(|e| self.classify(cid, max_wait, e))?;

		trace!(bytes = bytes.len(), "Fetched content;");

		Ok(bytes.to_vec())
	}
}
