//! Validated login names used to address stored records.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when login name validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The name was empty.
	#[error("Login name cannot be empty.")]
	Empty,
	/// The name contains whitespace characters.
	#[error("Login name contains whitespace.")]
	ContainsWhitespace,
	/// The name exceeded the allowed character count.
	#[error("Login name exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Unique, user-chosen name of a stored login.
///
/// Names keep their original casing for display but compare case-insensitively through
/// [`LoginName::matches`], which is what store lookups use.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoginName(String);
impl LoginName {
	/// Creates a new login name after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Derives a login name from a server URL host, appending the port when one is explicit.
	///
	/// Returns `None` for URLs without a host.
	pub fn from_server_url(url: &Url) -> Option<Self> {
		let host = url.host_str()?;
		let raw = match url.port() {
			Some(port) => format!("{host}_{port}"),
			None => host.to_owned(),
		};

		Self::new(raw).ok()
	}

	/// Returns `true` when `other` names the same login, ignoring ASCII case.
	pub fn matches(&self, other: &str) -> bool {
		self.0.eq_ignore_ascii_case(other)
	}
}
impl Deref for LoginName {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for LoginName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<LoginName> for String {
	fn from(value: LoginName) -> Self {
		value.0
	}
}
impl TryFrom<String> for LoginName {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for LoginName {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for LoginName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Login({})", self.0)
	}
}
impl Display for LoginName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for LoginName {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.chars().count() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
