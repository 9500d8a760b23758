//! Authorization URL construction and the lifecycle of one login attempt.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	config::OAuthConfig,
	flows::auth_code_pkce::{
		callback::{CallbackListener, CallbackResult},
		pkce::{self, PkceCodeChallengeMethod, PkcePair},
	},
	server::ServerEndpoints,
};

/// Parameters of the browser-facing authorization URL.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizationRequest<'a> {
	/// Server authorization endpoint.
	pub authorization_endpoint: &'a Url,
	/// Public client identifier.
	pub client_id: &'a str,
	/// Redirect URI with its port already resolved.
	pub redirect_uri: &'a Url,
	/// Rendered scope parameter; omitted when empty.
	pub scope: &'a str,
	/// Anti-forgery state token.
	pub state: &'a str,
	/// PKCE challenge.
	pub code_challenge: &'a str,
	/// PKCE challenge method.
	pub code_challenge_method: PkceCodeChallengeMethod,
}
impl AuthorizationRequest<'_> {
	/// Renders the authorization URL.
	pub fn to_url(&self) -> Url {
		let mut url = self.authorization_endpoint.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", self.client_id);
		pairs.append_pair("redirect_uri", self.redirect_uri.as_str());

		if !self.scope.is_empty() {
			pairs.append_pair("scope", self.scope);
		}

		pairs.append_pair("state", self.state);
		pairs.append_pair("code_challenge", self.code_challenge);
		pairs.append_pair("code_challenge_method", self.code_challenge_method.as_str());

		drop(pairs);

		url
	}
}

/// One in-flight authorization attempt.
///
/// The session owns its [`CallbackListener`]; the listener is closed when the session is
/// consumed by [`wait_for_code`](Self::wait_for_code) or dropped.
pub struct AuthorizationSession {
	/// Client identifier used for this attempt.
	pub client_id: String,
	/// Endpoints of the server being logged into.
	pub endpoints: ServerEndpoints,
	/// Redirect URI with the bound port.
	pub redirect_uri: Url,
	/// Rendered scope parameter.
	pub scope: String,
	/// Anti-forgery state the callback must echo.
	pub state: String,
	/// Skip TLS verification for server requests.
	pub insecure_tls: bool,
	/// URL the user must visit.
	pub authorize_url: Url,
	pkce: PkcePair,
	listener: CallbackListener,
}
impl AuthorizationSession {
	/// Generates proof material, binds the callback listener, and renders the authorization URL,
	/// in that order.
	pub async fn start(
		config: &OAuthConfig,
		endpoints: ServerEndpoints,
		client_id: String,
		redirect_url: Option<&Url>,
		insecure_tls: bool,
	) -> Result<Self> {
		let pkce = PkcePair::generate(config.verifier_bytes)?;
		let state = pkce::new_state(config.state_bytes)?;
		let listener = CallbackListener::bind(redirect_url).await?;
		let redirect_uri = listener.redirect_uri().clone();
		let scope = config.scope_param();
		let authorize_url = AuthorizationRequest {
			authorization_endpoint: &endpoints.authorization,
			client_id: &client_id,
			redirect_uri: &redirect_uri,
			scope: &scope,
			state: &state,
			code_challenge: pkce.challenge(),
			code_challenge_method: pkce.method(),
		}
		.to_url();

		Ok(Self {
			client_id,
			endpoints,
			redirect_uri,
			scope,
			state,
			insecure_tls,
			authorize_url,
			pkce,
			listener,
		})
	}

	/// PKCE code challenge derived from the secret verifier.
	pub fn code_challenge(&self) -> &str {
		self.pkce.challenge()
	}

	/// Port the callback listener is bound to.
	pub fn callback_port(&self) -> u16 {
		self.listener.port()
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}

	/// Waits for the redirect, closes the listener, and checks the returned state.
	pub async fn wait_for_code(mut self, timeout: StdDuration) -> Result<AuthorizedCode> {
		let outcome = self.listener.wait(timeout).await?;

		match outcome {
			CallbackResult::Code { code, state } => {
				self.validate_state(&state)?;

				Ok(AuthorizedCode { code, redirect_uri: self.redirect_uri, pkce: self.pkce })
			},
			CallbackResult::Error { error, description } =>
				Err(Error::AuthorizationDenied { error, description }),
			CallbackResult::TimedOut => Err(Error::Timeout { after: timeout }),
		}
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("client_id", &self.client_id)
			.field("endpoints", &self.endpoints)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("insecure_tls", &self.insecure_tls)
			.field("authorize_url", &self.authorize_url.as_str())
			.field("pkce", &self.pkce)
			.field("listener", &self.listener)
			.finish()
	}
}

/// Authorization code that passed the state check, ready for exchange.
pub struct AuthorizedCode {
	/// Code returned by the server.
	pub code: String,
	/// Redirect URI that must be repeated in the exchange.
	pub redirect_uri: Url,
	pkce: PkcePair,
}
impl AuthorizedCode {
	/// PKCE verifier for the exchange.
	pub fn verifier(&self) -> &str {
		self.pkce.verifier()
	}
}
impl Debug for AuthorizedCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizedCode")
			.field("code", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authorization_url_carries_every_parameter() {
		let endpoint = Url::parse("https://gitea.example.com/login/oauth/authorize")
			.expect("Authorization endpoint fixture should parse successfully.");
		let redirect = Url::parse("http://127.0.0.1:43110/")
			.expect("Redirect URL fixture should parse successfully.");
		let url = AuthorizationRequest {
			authorization_endpoint: &endpoint,
			client_id: "abc",
			redirect_uri: &redirect,
			scope: "read write",
			state: "S1",
			code_challenge: "C1",
			code_challenge_method: PkceCodeChallengeMethod::S256,
		}
		.to_url();
		let query = url.query().expect("Authorization URL should carry a query.");

		for expected in [
			"response_type=code",
			"client_id=abc",
			"redirect_uri=http%3A%2F%2F127.0.0.1%3A43110%2F",
			"scope=read+write",
			"state=S1",
			"code_challenge=C1",
			"code_challenge_method=S256",
		] {
			assert!(query.contains(expected), "Missing `{expected}` in `{query}`.");
		}

		assert_eq!(url.path(), "/login/oauth/authorize");
	}

	async fn start_session() -> AuthorizationSession {
		let endpoints = ServerEndpoints::from_base("https://gitea.example.com")
			.expect("Server endpoints fixture should build.");

		AuthorizationSession::start(&OAuthConfig::default(), endpoints, "abc".into(), None, false)
			.await
			.expect("Session should start on a loopback port.")
	}

	#[tokio::test]
	async fn session_url_uses_the_bound_port() {
		let session = start_session().await;
		let redirect = session
			.authorize_url
			.query_pairs()
			.find(|(key, _)| key == "redirect_uri")
			.map(|(_, value)| value.into_owned())
			.expect("Authorization URL should include the redirect URI.");

		assert_eq!(redirect, format!("http://127.0.0.1:{}/", session.callback_port()));
		assert_eq!(session.code_challenge().len(), 43);
		assert!(session.validate_state(&session.state.clone()).is_ok());
		assert!(matches!(session.validate_state("S1"), Err(Error::StateMismatch)));
	}

	#[tokio::test]
	async fn matching_state_yields_the_code() {
		let session = start_session().await;
		let callback = format!("{}?code=XYZ&state={}", session.redirect_uri, session.state);
		let request = tokio::spawn(reqwest::get(callback));
		let authorized = session
			.wait_for_code(StdDuration::from_secs(5))
			.await
			.expect("Matching state should be accepted.");

		assert_eq!(authorized.code, "XYZ");
		assert_eq!(authorized.verifier().len(), 86);

		request
			.await
			.expect("Callback request task should not panic.")
			.expect("Callback request should succeed.");
	}

	#[tokio::test]
	async fn wrong_state_is_rejected() {
		let session = start_session().await;
		let callback = format!("{}?code=XYZ&state=S1", session.redirect_uri);
		let request = tokio::spawn(reqwest::get(callback));
		let err = session
			.wait_for_code(StdDuration::from_secs(5))
			.await
			.expect_err("Foreign state must be rejected.");

		assert!(matches!(err, Error::StateMismatch));

		request
			.await
			.expect("Callback request task should not panic.")
			.expect("Callback request should succeed.");
	}
}
