//! Token endpoint facade over the `oauth2` crate.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthorizationCode, ClientId, EndpointNotSet, EndpointSet, HttpClientError, PkceCodeVerifier,
	RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::TokenMaterial,
	error::{ConfigError, TokenEndpointError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type EndpointResult<T> = std::result::Result<T, TokenEndpointError>;

/// Public-client token endpoint: the client id travels in the request body and no secret is
/// ever sent.
#[derive(Clone, Debug)]
pub struct TokenEndpoint {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
}
impl TokenEndpoint {
	/// Builds a facade for `token_url` using `client_id`.
	pub fn new(
		client_id: &str,
		token_url: &Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::from_url(token_url.clone());
		let oauth_client =
			BasicClient::new(ClientId::new(client_id.to_owned())).set_token_uri(token_url);

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges an authorization code plus PKCE verifier for token material.
	pub async fn exchange_authorization_code(
		&self,
		code: &str,
		pkce_verifier: &str,
		redirect_uri: &Url,
	) -> EndpointResult<TokenMaterial> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let redirect_url = RedirectUrl::from_url(redirect_uri.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(map_token_response(response))
	}

	/// Redeems a refresh token for new token material.
	///
	/// The returned material only carries a refresh token or expiry when the server sent one;
	/// callers merge it into the stored material.
	pub async fn refresh_token(&self, refresh_token: &str) -> EndpointResult<TokenMaterial> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(map_token_response(response))
	}
}

fn map_token_response(response: BasicTokenResponse) -> TokenMaterial {
	let mut material = TokenMaterial::new(response.access_token().secret().to_owned());

	if let Some(refresh) = response.refresh_token().filter(|token| !token.secret().is_empty()) {
		material = material.with_refresh_token(refresh.secret().to_owned());
	}
	if let Some(expires_in) = response.expires_in() {
		let seconds = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);

		material = material.with_expires_in(OffsetDateTime::now_utc(), Duration::seconds(seconds));
	}

	material
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> TokenEndpointError {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		RequestTokenError::Parse(source, _body) => TokenEndpointError::Parse { source, status },
		RequestTokenError::Other(message) => TokenEndpointError::Unexpected { message, status },
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	status: Option<u16>,
) -> TokenEndpointError {
	TokenEndpointError::Rejected {
		error: response.error().as_ref().to_owned(),
		description: response.error_description().cloned(),
		status,
	}
}

fn map_transport_error(
	err: HttpClientError<ReqwestError>,
	status: Option<u16>,
) -> TokenEndpointError {
	match err {
		HttpClientError::Reqwest(inner) if inner.is_builder() =>
			ConfigError::http_client_build(*inner).into(),
		HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TokenEndpointError::Unexpected { message, status },
		_ => TokenEndpointError::Unexpected {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		},
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builds_public_client_without_secret() {
		let token_url = Url::parse("https://gitea.com/login/oauth/access_token")
			.expect("Token URL fixture should parse.");
		let http = ReqwestHttpClient::new(false).expect("HTTP client should build.");

		assert!(TokenEndpoint::new("abc", &token_url, http).is_ok());
	}

	#[test]
	fn server_errors_keep_code_description_and_status() {
		let response: BasicErrorResponse = serde_json::from_str(
			"{\"error\":\"invalid_grant\",\"error_description\":\"code expired\"}",
		)
		.expect("Error response fixture should deserialize.");
		let err = map_server_response_error(response, Some(400));

		assert_eq!(err.status(), Some(400));
		assert!(matches!(
			err,
			TokenEndpointError::Rejected { ref error, ref description, .. }
				if error == "invalid_grant" && description.as_deref() == Some("code expired")
		));
	}
}
