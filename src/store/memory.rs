//! Thread-safe in-memory [`LoginStore`] implementation for tests and embedding.

// self
use crate::{
	_prelude::*,
	auth::LoginRecord,
	store::{self, LoginStore, StoreError, StoreFuture},
};

type RecordList = Arc<RwLock<Vec<LoginRecord>>>;

/// Keeps login records in-process; nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(RecordList);
impl MemoryStore {
	/// Returns a snapshot of every stored record.
	pub fn records(&self) -> Vec<LoginRecord> {
		self.0.read().clone()
	}

	fn add_now(list: RecordList, record: LoginRecord) -> Result<(), StoreError> {
		store::insert_unique(&mut list.write(), record)
	}

	fn update_now(list: RecordList, record: LoginRecord) -> Result<(), StoreError> {
		store::replace_existing(&mut list.write(), record).map(|_| ())
	}
}
impl LoginStore for MemoryStore {
	fn get_record<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<LoginRecord>> {
		let list = self.0.clone();

		Box::pin(async move { Ok(store::find_by_name(&list.read(), name)) })
	}

	fn add_record(&self, record: LoginRecord) -> StoreFuture<'_, ()> {
		let list = self.0.clone();

		Box::pin(async move { Self::add_now(list, record) })
	}

	fn update_record(&self, record: LoginRecord) -> StoreFuture<'_, ()> {
		let list = self.0.clone();

		Box::pin(async move { Self::update_now(list, record) })
	}

	fn list_names(&self) -> StoreFuture<'_, Vec<String>> {
		let list = self.0.clone();

		Box::pin(async move {
			Ok(list.read().iter().map(|record| record.name.to_string()).collect())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::login_record_fixture, auth::TokenMaterial};

	#[tokio::test]
	async fn add_get_update_round_trip() {
		let store = MemoryStore::default();
		let record =
			login_record_fixture("gitea.com", "https://gitea.com", TokenMaterial::new("first"));

		store.add_record(record.clone()).await.expect("Adding a new record should succeed.");

		let mut fetched = store
			.get_record("GITEA.com")
			.await
			.expect("Lookup should succeed.")
			.expect("Record should be found case-insensitively.");

		assert_eq!(fetched, record);

		fetched.token = TokenMaterial::new("second");

		store.update_record(fetched).await.expect("Updating the record should succeed.");

		assert_eq!(store.records()[0].token.access_token.expose(), "second");
		assert_eq!(
			store.list_names().await.expect("Listing names should succeed."),
			vec!["gitea.com".to_owned()]
		);
	}

	#[tokio::test]
	async fn update_of_unknown_login_fails() {
		let store = MemoryStore::default();
		let err = store
			.update_record(login_record_fixture(
				"ghost",
				"https://gitea.com",
				TokenMaterial::new("x"),
			))
			.await
			.expect_err("Updating an unknown login must fail.");

		assert_eq!(err, StoreError::Missing { name: "ghost".into() });
	}
}
