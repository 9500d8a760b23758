//! Login and token lifecycle orchestration.

pub mod auth_code_pkce;
pub mod common;
pub mod refresh;

pub use auth_code_pkce::*;
pub use common::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	browser::{BrowserOpener, SystemBrowser},
	config::OAuthConfig,
	store::LoginStore,
};

/// Entry point for interactive logins and token refreshes against Gitea servers.
///
/// The authenticator holds no per-server state: each call derives endpoints and an HTTP client
/// from the login being processed. Settings that would otherwise be process-wide (client id,
/// scopes, timeouts, entropy sizes) live in [`OAuthConfig`].
#[derive(Clone)]
pub struct Authenticator {
	/// Store receiving new logins and refreshed tokens.
	pub store: Arc<dyn LoginStore>,
	/// Opener used to show the authorization URL.
	pub browser: Arc<dyn BrowserOpener>,
	/// Client configuration.
	pub config: OAuthConfig,
	/// Counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl Authenticator {
	/// Creates an authenticator that opens the system browser.
	pub fn new(store: Arc<dyn LoginStore>, config: OAuthConfig) -> Self {
		Self {
			store,
			browser: Arc::new(SystemBrowser),
			config,
			refresh_metrics: Default::default(),
		}
	}

	/// Replaces the browser opener.
	pub fn with_browser(mut self, browser: Arc<dyn BrowserOpener>) -> Self {
		self.browser = browser;

		self
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("config", &self.config)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
