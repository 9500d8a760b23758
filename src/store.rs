//! Storage contract and built-in store implementations for login records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// std
use std::mem;
// self
use crate::{_prelude::*, auth::LoginRecord};

/// Boxed future returned by [`LoginStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable collection of login records, keyed by case-insensitive login name.
pub trait LoginStore
where
	Self: Send + Sync,
{
	/// Fetches the record whose name matches `name`, ignoring ASCII case.
	fn get_record<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<LoginRecord>>;

	/// Inserts a new record; fails with [`StoreError::Duplicate`] when the name is taken.
	fn add_record(&self, record: LoginRecord) -> StoreFuture<'_, ()>;

	/// Replaces an existing record; fails with [`StoreError::Missing`] when none matches.
	fn update_record(&self, record: LoginRecord) -> StoreFuture<'_, ()>;

	/// Lists every stored login name in insertion order.
	fn list_names(&self) -> StoreFuture<'_, Vec<String>>;
}

/// Error type produced by [`LoginStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Records could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A record with the same name already exists.
	#[error("Login `{name}` already exists.")]
	Duplicate {
		/// Conflicting login name.
		name: String,
	},
	/// No record matches the name being updated.
	#[error("Login `{name}` does not exist.")]
	Missing {
		/// Requested login name.
		name: String,
	},
}

/// Shared insert rule: names are unique regardless of case.
fn insert_unique(records: &mut Vec<LoginRecord>, record: LoginRecord) -> Result<(), StoreError> {
	if records.iter().any(|existing| existing.name.matches(&record.name)) {
		return Err(StoreError::Duplicate { name: record.name.into() });
	}

	records.push(record);

	Ok(())
}

/// Shared update rule: replaces the record in place so list order stays stable.
///
/// Returns the slot index and the replaced record so callers can roll back.
fn replace_existing(
	records: &mut [LoginRecord],
	record: LoginRecord,
) -> Result<(usize, LoginRecord), StoreError> {
	match records.iter().position(|existing| existing.name.matches(&record.name)) {
		Some(index) => Ok((index, mem::replace(&mut records[index], record))),
		None => Err(StoreError::Missing { name: record.name.into() }),
	}
}

fn find_by_name(records: &[LoginRecord], name: &str) -> Option<LoginRecord> {
	records.iter().find(|record| record.name.matches(name)).cloned()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::login_record_fixture, auth::TokenMaterial};

	#[test]
	fn store_error_converts_into_login_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk full"));

		let source = StdError::source(&error)
			.expect("Login error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn insert_rejects_case_insensitive_duplicates() {
		let mut records = Vec::new();

		insert_unique(
			&mut records,
			login_record_fixture("Work", "https://git.example.com", TokenMaterial::new("a")),
		)
		.expect("First insert should succeed.");

		let err = insert_unique(
			&mut records,
			login_record_fixture("work", "https://git.example.com", TokenMaterial::new("b")),
		)
		.expect_err("Second insert with the same name must fail.");

		assert_eq!(err, StoreError::Duplicate { name: "work".into() });
		assert_eq!(
			find_by_name(&records, "WORK").map(|record| record.token.access_token),
			Some(TokenMaterial::new("a").access_token)
		);
	}

	#[test]
	fn replace_requires_existing_record() {
		let mut records =
			vec![login_record_fixture("a", "https://a.example.com", TokenMaterial::new("old"))];

		replace_existing(
			&mut records,
			login_record_fixture("A", "https://a.example.com", TokenMaterial::new("new")),
		)
		.expect("Replacing an existing record should succeed.");

		assert_eq!(records[0].token.access_token.expose(), "new");
		assert!(matches!(
			replace_existing(
				&mut records,
				login_record_fixture("b", "https://b.example.com", TokenMaterial::new("x")),
			),
			Err(StoreError::Missing { .. })
		));
	}
}
