//! Interactive Authorization Code + PKCE login.
//!
//! [`Authenticator::login`] runs the whole attempt: proof material, loopback listener, browser,
//! callback, state check, code exchange, identity validation, and finally persistence. Any
//! failure ends the attempt without writing a record.

pub mod callback;
pub mod pkce;
pub mod session;

pub use callback::*;
pub use pkce::{PkceCodeChallengeMethod, PkcePair};
pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::LoginRecord,
	flows::{Authenticator, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	server::{self, ServerEndpoints},
	store::StoreError,
};

/// Caller-supplied options for one interactive login.
#[derive(Clone, Debug)]
pub struct LoginRequest {
	/// Login name; derived from the server host when absent.
	pub name: Option<String>,
	/// Server base URL as typed by the user.
	pub server_url: String,
	/// Skip TLS certificate verification.
	pub insecure_tls: bool,
	/// OAuth client id overriding the configured default.
	pub client_id: Option<String>,
	/// Redirect URI overriding the configured default.
	pub redirect_url: Option<Url>,
	/// Whether API calls should check the server version later on.
	pub version_check: bool,
}
impl LoginRequest {
	/// Creates a request for `server_url` with default options.
	pub fn new(server_url: impl Into<String>) -> Self {
		Self {
			name: None,
			server_url: server_url.into(),
			insecure_tls: false,
			client_id: None,
			redirect_url: None,
			version_check: true,
		}
	}

	/// Sets the login name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Enables or disables TLS verification bypass.
	pub fn with_insecure_tls(mut self, insecure_tls: bool) -> Self {
		self.insecure_tls = insecure_tls;

		self
	}

	/// Overrides the OAuth client id.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Overrides the redirect URI.
	pub fn with_redirect_url(mut self, redirect_url: Url) -> Self {
		self.redirect_url = Some(redirect_url);

		self
	}

	/// Sets the version check flag stored with the login.
	pub fn with_version_check(mut self, version_check: bool) -> Self {
		self.version_check = version_check;

		self
	}
}

impl Authenticator {
	/// Runs an interactive login and persists the resulting record.
	pub async fn login(&self, request: LoginRequest) -> Result<LoginRecord> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run_login(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				tracing::debug!(error = %e, "Login attempt failed.");

				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn run_login(&self, request: LoginRequest) -> Result<LoginRecord> {
		let endpoints = ServerEndpoints::from_base(&request.server_url)?;
		let name = common::resolve_login_name(
			self.store.as_ref(),
			request.name.as_deref(),
			&endpoints.base,
		)
		.await?;
		let client_id = request
			.client_id
			.filter(|id| !id.trim().is_empty())
			.unwrap_or_else(|| self.config.client_id.clone());
		let redirect_url = request.redirect_url.as_ref().or(self.config.redirect_url.as_ref());
		let (http, token_endpoint) =
			common::server_clients(&endpoints, &client_id, request.insecure_tls)?;
		let session = AuthorizationSession::start(
			&self.config,
			endpoints.clone(),
			client_id.clone(),
			redirect_url,
			request.insecure_tls,
		)
		.await?;

		tracing::info!(
			login = %name,
			port = session.callback_port(),
			"Waiting for the authorization callback."
		);

		if let Err(e) = self.browser.open(&session.authorize_url) {
			tracing::warn!(
				error = %e,
				url = %session.authorize_url,
				"Failed to open a browser; visit the URL manually."
			);
		}

		let authorized = session.wait_for_code(self.config.callback_timeout).await?;
		let token = token_endpoint
			.exchange_authorization_code(
				&authorized.code,
				authorized.verifier(),
				&authorized.redirect_uri,
			)
			.await
			.map_err(Error::Exchange)?;
		let user = server::fetch_current_user(&http, &endpoints, &token.access_token).await?;
		let mut record = LoginRecord::new(name, endpoints.base.clone(), user.login, token)
			.with_insecure(request.insecure_tls)
			.with_version_check(request.version_check)
			.with_client_id(client_id);

		if let Some(host) = common::ssh_host(&endpoints.base) {
			record = record.with_ssh_host(host);
		}

		self.store.add_record(record.clone()).await.map_err(|e| match e {
			StoreError::Duplicate { name } => Error::LoginExists { name },
			other => other.into(),
		})?;

		tracing::info!(login = %record.name, user = %record.user, "Login stored.");

		Ok(record)
	}
}
