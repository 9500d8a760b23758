//! Gitea server endpoints and the identity lookup used to validate fresh tokens.

pub mod identity;

pub use identity::*;

// self
use crate::{_prelude::*, error::ConfigError};

const AUTHORIZE_PATH: &str = "login/oauth/authorize";
const TOKEN_PATH: &str = "login/oauth/access_token";
const USER_PATH: &str = "api/v1/user";

/// OAuth and API endpoints derived from a server base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEndpoints {
	/// Normalized base URL without a trailing slash in its path.
	pub base: Url,
	/// Browser-facing authorization endpoint.
	pub authorization: Url,
	/// Token endpoint used for code exchange and refresh.
	pub token: Url,
	/// Endpoint returning the authenticated user.
	pub user: Url,
}
impl ServerEndpoints {
	/// Normalizes `raw` and derives every endpoint from it.
	///
	/// A missing scheme defaults to `https://`; sub-path deployments keep their path prefix.
	pub fn from_base(raw: &str) -> Result<Self, ConfigError> {
		let base = normalize_server_url(raw)?;
		let join = |path: &str| {
			Url::parse(&format!("{}/{path}", base.as_str().trim_end_matches('/'))).map_err(
				|source| ConfigError::InvalidServerUrl { url: raw.to_owned(), source },
			)
		};

		Ok(Self {
			authorization: join(AUTHORIZE_PATH)?,
			token: join(TOKEN_PATH)?,
			user: join(USER_PATH)?,
			base,
		})
	}
}

/// Parses a user-supplied server URL, adding `https://` when no scheme is present and trimming
/// trailing slashes.
pub fn normalize_server_url(raw: &str) -> Result<Url, ConfigError> {
	let trimmed = raw.trim().trim_end_matches('/');
	let candidate =
		if trimmed.contains("://") { trimmed.to_owned() } else { format!("https://{trimmed}") };
	let mut url = Url::parse(&candidate)
		.map_err(|source| ConfigError::InvalidServerUrl { url: raw.to_owned(), source })?;

	if url.cannot_be_a_base() || url.host_str().is_none() {
		return Err(ConfigError::InvalidServerUrl {
			url: raw.to_owned(),
			source: url::ParseError::EmptyHost,
		});
	}

	let path = url.path().trim_end_matches('/').to_owned();

	url.set_path(&path);
	url.set_query(None);
	url.set_fragment(None);

	Ok(url)
}
