//! Identity lookup against `GET /api/v1/user`.

// crates.io
use reqwest::{StatusCode, header::ACCEPT};
// self
use crate::{_prelude::*, auth::TokenSecret, http::ReqwestHttpClient, server::ServerEndpoints};

/// Subset of the Gitea user object needed to label a login.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ServerUser {
	/// Account name.
	#[serde(alias = "username")]
	pub login: String,
	/// Numeric account id.
	#[serde(default)]
	pub id: Option<i64>,
}

/// Fetches the account that owns `token`, proving the token works.
///
/// Any failure maps to [`Error::TokenValidation`]; transport problems keep their message so the
/// user can tell an unreachable server from a rejected token.
pub async fn fetch_current_user(
	http: &ReqwestHttpClient,
	endpoints: &ServerEndpoints,
	token: &TokenSecret,
) -> Result<ServerUser> {
	let response = http
		.get(endpoints.user.clone())
		.bearer_auth(token.expose())
		.header(ACCEPT, "application/json")
		.send()
		.await
		.map_err(|e| Error::TokenValidation { reason: e.to_string(), status: None })?;
	let status = response.status();

	if status != StatusCode::OK {
		return Err(Error::TokenValidation {
			reason: format!("identity lookup returned HTTP {status}"),
			status: Some(status.as_u16()),
		});
	}

	let bytes = response.bytes().await.map_err(|e| Error::TokenValidation {
		reason: e.to_string(),
		status: Some(status.as_u16()),
	})?;
	let de = &mut serde_json::Deserializer::from_slice(&bytes);
	let user: ServerUser = serde_path_to_error::deserialize(de).map_err(|e| {
		Error::TokenValidation {
			reason: format!("unexpected user payload at `{}`: {}", e.path(), e.inner()),
			status: Some(status.as_u16()),
		}
	})?;

	if user.login.is_empty() {
		return Err(Error::TokenValidation {
			reason: "server reported an empty username".into(),
			status: Some(status.as_u16()),
		});
	}

	tracing::debug!(user = %user.login, "Validated token against the identity endpoint.");

	Ok(user)
}
