//! Shared helpers for flow implementations (login naming, HTTP setup, SSH host derivation).

// self
use crate::{
	_prelude::*,
	auth::LoginName,
	error::ConfigError,
	http::ReqwestHttpClient,
	oauth::TokenEndpoint,
	server::ServerEndpoints,
	store::LoginStore,
};

/// Picks the name for a new login.
///
/// An explicit name is validated and must be free; otherwise the name derives from the server
/// host and gets a `_2`, `_3`, ... suffix until it no longer collides.
pub(crate) async fn resolve_login_name(
	store: &dyn LoginStore,
	requested: Option<&str>,
	server_url: &Url,
) -> Result<LoginName> {
	let existing = store.list_names().await?;

	if let Some(requested) = requested.filter(|name| !name.is_empty()) {
		let name = LoginName::new(requested).map_err(ConfigError::from)?;

		if existing.iter().any(|taken| name.matches(taken)) {
			return Err(Error::LoginExists { name: name.into() });
		}

		return Ok(name);
	}

	let base = LoginName::from_server_url(server_url)
		.map_or_else(|| "login".to_owned(), String::from);

	unique_login_name(&base, &existing).map_err(Error::from)
}

/// Appends the smallest numeric suffix that makes `base` unique among `existing`.
pub fn unique_login_name(base: &str, existing: &[String]) -> Result<LoginName, ConfigError> {
	let taken = |candidate: &str| existing.iter().any(|name| name.eq_ignore_ascii_case(candidate));

	if !taken(base) {
		return Ok(LoginName::new(base)?);
	}

	let mut suffix = 2_usize;

	loop {
		let candidate = format!("{base}_{suffix}");

		if !taken(&candidate) {
			return Ok(LoginName::new(candidate)?);
		}

		suffix += 1;
	}
}

/// SSH host recorded for a login: the server host plus any explicit port.
pub(crate) fn ssh_host(server_url: &Url) -> Option<String> {
	let host = server_url.host_str()?;

	Some(match server_url.port() {
		Some(port) => format!("{host}:{port}"),
		None => host.to_owned(),
	})
}

/// Builds the per-server HTTP client and token endpoint facade.
pub(crate) fn server_clients(
	endpoints: &ServerEndpoints,
	client_id: &str,
	insecure_tls: bool,
) -> Result<(ReqwestHttpClient, TokenEndpoint), ConfigError> {
	let http = ReqwestHttpClient::new(insecure_tls)?;
	let token_endpoint = TokenEndpoint::new(client_id, &endpoints.token, http.clone())?;

	Ok((http, token_endpoint))
}
