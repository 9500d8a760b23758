//! JSON file-backed [`LoginStore`] used by the command-line client.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::LoginRecord,
	store::{self, LoginStore, StoreError, StoreFuture},
};

/// Persists login records as a JSON array, rewriting the file after each mutation.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the original, so a crash never
/// leaves a half-written login file behind.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Vec<LoginRecord>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Vec<LoginRecord>, StoreError> {
		if !path.exists() {
			return Ok(Vec::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Vec::new());
		}

		let de = &mut serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(de).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &[LoginRecord]) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize login records: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl LoginStore for FileStore {
	fn get_record<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<LoginRecord>> {
		Box::pin(async move { Ok(store::find_by_name(&self.inner.read(), name)) })
	}

	fn add_record(&self, record: LoginRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			store::insert_unique(&mut guard, record)?;

			if let Err(e) = self.persist_locked(&guard) {
				guard.pop();

				return Err(e);
			}

			Ok(())
		})
	}

	fn update_record(&self, record: LoginRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			let (index, previous) = store::replace_existing(&mut guard, record)?;

			if let Err(e) = self.persist_locked(&guard) {
				guard[index] = previous;

				return Err(e);
			}

			Ok(())
		})
	}

	fn list_names(&self) -> StoreFuture<'_, Vec<String>> {
		Box::pin(async move {
			Ok(self.inner.read().iter().map(|record| record.name.to_string()).collect())
		})
	}
}
