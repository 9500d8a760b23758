//! OAuth client configuration shared by the login and refresh flows.

// std
use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	time::Duration as StdDuration,
};
// self
use crate::{
	_prelude::*,
	auth::{DEFAULT_SCOPES, ScopeSet},
	error::ConfigError,
};

/// Client id of the OAuth application Gitea registers for the `tea` CLI.
pub const DEFAULT_CLIENT_ID: &str = "d57cb8c4-630c-4168-8324-ec79935e18d4";
/// Redirect URI used when the caller does not supply one; port 0 lets the OS pick.
pub const DEFAULT_REDIRECT_URL: &str = "http://127.0.0.1:0";
/// Loopback address bound when no redirect URI is configured.
pub const DEFAULT_REDIRECT_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
/// How long the login flow waits for the browser callback.
pub const DEFAULT_CALLBACK_TIMEOUT: StdDuration = StdDuration::from_secs(60);
/// Random bytes drawn for the PKCE verifier (86 base64url characters).
pub const DEFAULT_VERIFIER_BYTES: usize = 64;
/// Random bytes drawn for the anti-forgery state token.
pub const DEFAULT_STATE_BYTES: usize = 32;

/// Login-flow settings that would otherwise be process-wide constants.
#[derive(Clone, Debug)]
pub struct OAuthConfig {
	/// Public client identifier sent with every request.
	pub client_id: String,
	/// Scopes requested during authorization.
	pub scopes: ScopeSet,
	/// Character placed between scopes in the `scope` parameter.
	pub scope_delimiter: char,
	/// Redirect URI registered with the OAuth application; `None` binds [`DEFAULT_REDIRECT_ADDR`].
	pub redirect_url: Option<Url>,
	/// Deadline for the browser callback.
	pub callback_timeout: StdDuration,
	/// Random bytes used for the PKCE verifier.
	pub verifier_bytes: usize,
	/// Random bytes used for the state token.
	pub state_bytes: usize,
}
impl OAuthConfig {
	/// Overrides the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Overrides the callback deadline.
	pub fn with_callback_timeout(mut self, timeout: StdDuration) -> Self {
		self.callback_timeout = timeout;

		self
	}

	/// Renders the `scope` request parameter.
	pub fn scope_param(&self) -> String {
		self.scopes.joined(self.scope_delimiter)
	}
}
impl Default for OAuthConfig {
	fn default() -> Self {
		Self {
			client_id: DEFAULT_CLIENT_ID.into(),
			scopes: ScopeSet::new(DEFAULT_SCOPES).unwrap_or_default(),
			scope_delimiter: ' ',
			redirect_url: None,
			callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
			verifier_bytes: DEFAULT_VERIFIER_BYTES,
			state_bytes: DEFAULT_STATE_BYTES,
		}
	}
}

/// Parses a caller-supplied redirect URI; blank input means "use the default".
pub fn parse_redirect_url(raw: &str) -> Result<Option<Url>, ConfigError> {
	let raw = raw.trim();

	if raw.is_empty() {
		return Ok(None);
	}

	Url::parse(raw)
		.map(Some)
		.map_err(|source| ConfigError::InvalidRedirect { url: raw.to_owned(), source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_registered_application() {
		let config = OAuthConfig::default();

		assert_eq!(config.client_id, DEFAULT_CLIENT_ID);
		assert!(config.redirect_url.is_none());
		assert_eq!(DEFAULT_REDIRECT_ADDR.to_string(), "127.0.0.1:0");
		assert_eq!(config.callback_timeout, StdDuration::from_secs(60));
		assert_eq!(config.scopes.len(), DEFAULT_SCOPES.len());
		assert!(config.scope_param().starts_with("admin user issue"));
	}

	#[test]
	fn scope_delimiter_is_configurable() {
		let mut config = OAuthConfig::default()
			.with_scopes(ScopeSet::new(["read", "write"]).expect("Scopes should be valid."));

		config.scope_delimiter = ',';

		assert_eq!(config.scope_param(), "read,write");
	}

	#[test]
	fn redirect_parsing_falls_back_to_default() {
		assert_eq!(parse_redirect_url("  ").expect("Blank redirect should fall back."), None);
		assert_eq!(
			parse_redirect_url(DEFAULT_REDIRECT_URL)
				.expect("Default redirect should parse.")
				.map(String::from)
				.as_deref(),
			Some("http://127.0.0.1:0/")
		);
		assert!(parse_redirect_url("not a url").is_err());
	}
}
