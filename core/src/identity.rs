//! Resolving who is making a request. Issuing credentials is someone else's job, we only
//! consume them.

use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use thiserror::Error;

use super::record::OwnerId;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("credential could not be resolved to an identity")]
pub struct UnauthenticatedError;

/// An opaque bearer credential, never printed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	#[must_use]
	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Credential(<redacted>)")
	}
}

#[async_trait]
pub trait IdentityResolver: Send + Sync + fmt::Debug {
	async fn resolve_current_identity(
		&self,
		credential: &Credential,
	) -> Result<OwnerId, UnauthenticatedError>;
}

/// Resolves credentials from a fixed token table.
#[derive(Default, Clone)]
pub struct StaticTokenResolver {
	tokens: HashMap<String, OwnerId>,
}

impl StaticTokenResolver {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_token(mut self, token: impl Into<String>, owner_id: OwnerId) -> Self {
		self.tokens.insert(token.into(), owner_id);
		self
	}
}

impl fmt::Debug for StaticTokenResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StaticTokenResolver")
			.field("tokens", &self.tokens.len())
			.finish()
	}
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
	async fn resolve_current_identity(
		&self,
		credential: &Credential,
	) -> Result<OwnerId, UnauthenticatedError> {
		self.tokens
			.get(credential.expose())
			.copied()
			.ok_or(UnauthenticatedError)
	}
}
