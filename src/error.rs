//! Login-level error types shared across flows, transports, and stores.

// std
use std::{io, time::Duration as StdDuration};
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every variant terminates the attempt in progress; nothing is retried internally.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The loopback callback listener could not be opened.
	#[error("Failed to start the local callback server on {addr}.")]
	Bind {
		/// Address the listener attempted to bind.
		addr: String,
		/// Underlying socket failure.
		#[source]
		source: io::Error,
	},
	/// The secure random source is unavailable.
	#[error("Secure random source is unavailable.")]
	Entropy {
		/// Underlying RNG failure.
		#[source]
		source: BoxError,
	},
	/// The server (or the user) answered the authorization request with an error.
	#[error("Authorization failed: {}.", describe_denial(error, description.as_deref()))]
	AuthorizationDenied {
		/// OAuth `error` code from the callback.
		error: String,
		/// Optional `error_description` from the callback.
		description: Option<String>,
	},
	/// No callback arrived before the deadline.
	#[error("Authentication timed out after {}s.", after.as_secs())]
	Timeout {
		/// Deadline that elapsed.
		after: StdDuration,
	},
	/// Returned `state` differs from the value that was sent.
	#[error("State mismatch, possible CSRF attack.")]
	StateMismatch,
	/// Authorization code exchange failed.
	#[error("Token exchange failed.")]
	Exchange(#[source] TokenEndpointError),
	/// Freshly issued token failed the identity lookup.
	#[error("Failed to validate token: {reason}.")]
	TokenValidation {
		/// Human-readable failure summary.
		reason: String,
		/// HTTP status returned by the identity endpoint, when available.
		status: Option<u16>,
	},
	/// Refresh token was rejected or could not be exchanged.
	#[error("Failed to refresh token for login `{login}`.")]
	Refresh {
		/// Login whose refresh failed.
		login: String,
		/// Token endpoint failure.
		#[source]
		source: TokenEndpointError,
	},
	/// Record carries no refresh token, so it cannot be refreshed.
	#[error(
		"Login `{login}` does not have a refresh token. It may have been created using a different authentication method."
	)]
	MissingRefreshToken {
		/// Login lacking the refresh token.
		login: String,
	},
	/// No record exists for the requested login.
	#[error("Login `{name}` not found.")]
	UnknownLogin {
		/// Requested login name.
		name: String,
	},
	/// A record already uses the requested name.
	#[error("Login with name `{name}` already exists.")]
	LoginExists {
		/// Conflicting login name.
		name: String,
	},
}
impl Error {
	/// Returns user-facing recovery guidance for errors that have a documented remedy.
	pub fn hint(&self) -> Option<String> {
		match self {
			Self::AuthorizationDenied { error, description } => {
				let text = describe_denial(error, description.as_deref()).to_ascii_lowercase();

				(text.contains("redirect") || text.contains("no authorization code"))
					.then(redirect_registration_hint)
			},
			Self::Timeout { .. } => Some(
				"No authorization callback arrived in time. Run the login command again and finish the authorization in the browser."
					.into(),
			),
			Self::Refresh { login, .. } => Some(format!(
				"Run `tea-login login oauth-refresh {login}` to retry, or add the login again to re-authenticate."
			)),
			Self::MissingRefreshToken { .. } =>
				Some("Add the login again with `--oauth` to obtain a refreshable token.".into()),
			Self::StateMismatch =>
				Some("Discard this attempt and start a new login; do not reuse the old URL.".into()),
			_ => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Server URL cannot be parsed.
	#[error("Unable to parse server URL `{url}`.")]
	InvalidServerUrl {
		/// Raw URL supplied by the caller.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI `{url}` is invalid.")]
	InvalidRedirect {
		/// Raw redirect URI supplied by the caller.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI does not point at a loopback host.
	#[error("Redirect URI `{url}` must use a loopback host.")]
	NonLoopbackRedirect {
		/// Offending redirect URI.
		url: String,
	},
	/// Login name failed validation.
	#[error("Login name is invalid.")]
	InvalidLoginName(#[from] crate::auth::IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Store location could not be determined.
	#[error("Unable to determine the configuration directory.")]
	MissingConfigDir,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures reported while talking to the token endpoint.
#[derive(Debug, ThisError)]
pub enum TokenEndpointError {
	/// Server answered with an OAuth error payload.
	#[error("Token endpoint returned an OAuth error: {}.", describe_denial(error, description.as_deref()))]
	Rejected {
		/// OAuth `error` field.
		error: String,
		/// OAuth `error_description` field.
		description: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Network or IO failure while calling the endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Request could not be built.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Any other unexpected response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl TokenEndpointError {
	/// Returns the HTTP status recorded for the failing response, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::Parse { status, .. }
			| Self::Unexpected { status, .. } => *status,
			Self::Transport(_) | Self::Config(_) => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the server.")]
	Io(#[from] io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Formats the redirect registration steps shown when the server rejects the redirect URI.
fn redirect_registration_hint() -> String {
	[
		"The redirect URL is probably not registered on the server. To fix this:",
		"1. Sign in to your Gitea instance and open Settings > Applications.",
		"2. Register a new OAuth2 application whose redirect URI matches the one used by this login.",
		"3. Retry with `--client-id <CLIENT_ID> --redirect-url <REDIRECT_URL>`.",
		"Alternatively, use a token-based login.",
	]
	.join("\n")
}

fn describe_denial(error: &str, description: Option<&str>) -> String {
	match description {
		Some(description) if !description.is_empty() => format!("{error}: {description}"),
		_ => error.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn denial_hint_mentions_redirect_registration() {
		let err = Error::AuthorizationDenied {
			error: "invalid_request".into(),
			description: Some("redirect_uri does not match".into()),
		};
		let hint = err.hint().expect("Redirect problems should carry a hint.");

		assert!(hint.contains("Settings > Applications"));
		assert_eq!(
			err.to_string(),
			"Authorization failed: invalid_request: redirect_uri does not match."
		);
	}

	#[test]
	fn plain_denial_has_no_hint() {
		let err = Error::AuthorizationDenied { error: "access_denied".into(), description: None };

		assert!(err.hint().is_none());
		assert_eq!(err.to_string(), "Authorization failed: access_denied.");
	}

	#[test]
	fn refresh_hint_names_the_login() {
		let err = Error::Refresh {
			login: "gitea.com".into(),
			source: TokenEndpointError::Rejected {
				error: "invalid_grant".into(),
				description: None,
				status: Some(400),
			},
		};

		assert!(err.hint().is_some_and(|hint| hint.contains("oauth-refresh gitea.com")));
		assert_eq!(StdError::source(&err).map(|source| source.to_string()), Some(
			"Token endpoint returned an OAuth error: invalid_grant.".into()
		));
	}
}
