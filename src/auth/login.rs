//! Persisted login records.

// self
use crate::{
	_prelude::*,
	auth::{LoginName, TokenMaterial, token::material::whole_seconds},
};

/// Everything the client remembers about one authenticated server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRecord {
	/// Unique login name.
	pub name: LoginName,
	/// Normalized server base URL.
	pub url: Url,
	/// Username reported by the server when the login was validated.
	pub user: String,
	/// Token material issued for this login.
	#[serde(flatten)]
	pub token: TokenMaterial,
	/// Skip TLS certificate verification when talking to this server.
	#[serde(default)]
	pub insecure: bool,
	/// Check the server version before issuing API calls.
	#[serde(default = "default_version_check")]
	pub version_check: bool,
	/// SSH host override for git remotes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ssh_host: Option<String>,
	/// OAuth client id used at login time; refreshes reuse it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	/// Creation instant (unix seconds).
	#[serde(with = "time::serde::timestamp")]
	pub created: OffsetDateTime,
}
impl LoginRecord {
	/// Creates a record stamped with the current time and default flags.
	pub fn new(name: LoginName, url: Url, user: impl Into<String>, token: TokenMaterial) -> Self {
		Self {
			name,
			url,
			user: user.into(),
			token,
			insecure: false,
			version_check: true,
			ssh_host: None,
			client_id: None,
			created: whole_seconds(OffsetDateTime::now_utc()),
		}
	}

	/// Marks the login as skipping TLS verification.
	pub fn with_insecure(mut self, insecure: bool) -> Self {
		self.insecure = insecure;

		self
	}

	/// Sets whether the server version is checked.
	pub fn with_version_check(mut self, version_check: bool) -> Self {
		self.version_check = version_check;

		self
	}

	/// Records the OAuth client id used for this login.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the SSH host override.
	pub fn with_ssh_host(mut self, ssh_host: impl Into<String>) -> Self {
		self.ssh_host = Some(ssh_host.into());

		self
	}
}

fn default_version_check() -> bool {
	true
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn fixture() -> LoginRecord {
		let name = LoginName::new("gitea.com").expect("Login name fixture should be valid.");
		let url = Url::parse("https://gitea.com").expect("URL fixture should parse.");
		let token = TokenMaterial::new("access")
			.with_refresh_token("refresh")
			.with_expires_at(datetime!(2025-01-01 00:00 UTC));
		let mut record = LoginRecord::new(name, url, "alice", token).with_client_id("abc");

		record.created = datetime!(2024-12-31 00:00 UTC);

		record
	}

	#[test]
	fn serializes_flat_token_fields_as_unix_seconds() {
		let value = serde_json::to_value(fixture()).expect("Record should serialize successfully.");

		assert_eq!(value["token"], "access");
		assert_eq!(value["refresh_token"], "refresh");
		assert_eq!(value["token_expiry"], 1_735_689_600_i64);
		assert_eq!(value["created"], 1_735_603_200_i64);
		assert_eq!(value["client_id"], "abc");
		assert!(value.get("ssh_host").is_none());
	}

	#[test]
	fn missing_optional_fields_use_defaults() {
		let payload = r#"{
			"name": "work",
			"url": "https://git.example.com/",
			"user": "bob",
			"token": "access",
			"created": 1735603200
		}"#;
		let record: LoginRecord =
			serde_json::from_str(payload).expect("Minimal record should deserialize successfully.");

		assert!(record.version_check);
		assert!(!record.insecure);
		assert!(record.token.refresh_token.is_none());
		assert!(record.token.expires_at.is_none());
		assert!(record.client_id.is_none());
	}
}
