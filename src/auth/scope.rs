//! Scope modeling for authorization requests.

// self
use crate::_prelude::*;

/// Scopes requested by default: full access to every Gitea API area.
pub const DEFAULT_SCOPES: [&str; 8] = [
	"admin",
	"user",
	"issue",
	"misc",
	"notification",
	"organization",
	"package",
	"repository",
];

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Deduplicated list of OAuth scopes.
///
/// Unlike a sorted set, the list keeps the caller's order so the rendered `scope` parameter
/// matches what was configured. Duplicates after the first occurrence are dropped.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
}
impl ScopeSet {
	/// Creates a normalized scope list from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { scopes: normalize(scopes)? })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Joins the scopes with `delimiter`, producing the `scope` request parameter.
	pub fn joined(&self, delimiter: char) -> String {
		let mut out = String::new();

		for (idx, scope) in self.scopes.iter().enumerate() {
			if idx > 0 {
				out.push(delimiter);
			}

			out.push_str(scope);
		}

		out
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined(' '))
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	/// Parses a comma- or whitespace-separated scope string.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}

		let parts = s
			.split(|c: char| c == ',' || c.is_whitespace())
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>();

		if parts.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(parts)
	}
}

fn normalize<I, S>(scopes: I) -> Result<Arc<[String]>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut list = Vec::<String>::new();

	for scope in scopes {
		let owned: String = scope.into();

		if owned.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
		}
		if !list.contains(&owned) {
			list.push(owned);
		}
	}

	Ok(Arc::from(list))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_keep_order_and_drop_duplicates() {
		let scopes = ScopeSet::new(["repository", "user", "repository"])
			.expect("Scope list fixture should be valid.");

		assert_eq!(scopes.len(), 2);
		assert_eq!(scopes.joined(' '), "repository user");
		assert_eq!(scopes.joined(','), "repository,user");
	}

	#[test]
	fn scopes_reject_whitespace_padding() {
		let err = ScopeSet::new([" user "]).expect_err("Padded scopes must be rejected.");

		assert!(matches!(err, ScopeValidationError::ContainsWhitespace { .. }));
		assert!(ScopeSet::new([""]).is_err());
		assert!(ScopeSet::from_str("").is_ok(), "Empty string represents an empty scope list.");
		assert!(ScopeSet::from_str(" , ").is_err(), "Separator-only input must be rejected.");
	}

	#[test]
	fn parsing_accepts_commas_and_spaces() {
		let scopes = ScopeSet::from_str("admin,user issue")
			.expect("Mixed separators should parse successfully.");

		assert!(scopes.contains("issue"));
		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["admin", "user", "issue"]);
	}

	#[test]
	fn default_scopes_render_in_declared_order() {
		let scopes = ScopeSet::new(DEFAULT_SCOPES).expect("Default scopes should be valid.");

		assert_eq!(
			scopes.to_string(),
			"admin user issue misc notification organization package repository"
		);
	}
}
