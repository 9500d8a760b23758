//! Token material returned by the token endpoint and its expiry checks.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access token, optional refresh token, and optional absolute expiry.
///
/// A missing expiry means the server never reported one; such tokens are treated as needing a
/// refresh whenever a refresh token is available.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMaterial {
	/// Current access token.
	#[serde(rename = "token")]
	pub access_token: TokenSecret,
	/// Refresh token, if the server issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry instant (serialized as unix seconds).
	#[serde(
		default,
		rename = "token_expiry",
		with = "time::serde::timestamp::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenMaterial {
	/// Creates material holding only an access token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access_token), refresh_token: None, expires_at: None }
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets the absolute expiry instant.
	pub fn with_expires_at(mut self, expires_at: OffsetDateTime) -> Self {
		self.expires_at = Some(expires_at);

		self
	}

	/// Sets the expiry relative to `now`; non-positive or overflowing lifetimes leave the expiry
	/// unknown.
	pub fn with_expires_in(mut self, now: OffsetDateTime, expires_in: Duration) -> Self {
		self.expires_at = expires_in
			.is_positive()
			.then(|| now.checked_add(expires_in))
			.flatten()
			.map(whole_seconds);

		self
	}

	/// Refresh token that can actually be redeemed; an empty string counts as absent.
	pub fn usable_refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_empty())
	}

	/// Returns `true` if a refresh should run before the token is used at `instant`.
	///
	/// Tokens without a usable refresh token never need one because nothing could be done.
	pub fn needs_refresh_at(&self, instant: OffsetDateTime) -> bool {
		if self.usable_refresh_token().is_none() {
			return false;
		}

		match self.expires_at {
			Some(expires_at) => expires_at <= instant,
			None => true,
		}
	}

	/// Applies a refresh response, keeping the old refresh token and expiry when the server
	/// omits them.
	pub fn merge_refreshed(&mut self, refreshed: TokenMaterial) {
		self.access_token = refreshed.access_token;

		if let Some(refresh_token) = refreshed.refresh_token {
			self.refresh_token = Some(refresh_token);
		}
		if let Some(expires_at) = refreshed.expires_at {
			self.expires_at = Some(expires_at);
		}
	}
}
impl Debug for TokenMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenMaterial")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Drops sub-second precision so instants survive the unix-seconds wire format unchanged.
pub(crate) fn whole_seconds(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}
