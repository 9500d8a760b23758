//! Interactive OAuth 2.0 PKCE login for Gitea command-line clients.
//!
//! The crate captures the authorization code on a loopback listener, exchanges it for tokens,
//! validates them against the server, and refreshes them lazily before use.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod server;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::io;
	// self
	use crate::{
		auth::{LoginName, LoginRecord, TokenMaterial},
		browser::BrowserOpener,
		config::OAuthConfig,
		flows::Authenticator,
		store::{LoginStore, MemoryStore},
	};

	/// Browser stand-in that never launches anything and only remembers the last URL.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingBrowser(pub Arc<Mutex<Vec<Url>>>);
	impl RecordingBrowser {
		/// Returns every URL the flow asked to open.
		pub fn opened(&self) -> Vec<Url> {
			self.0.lock().clone()
		}
	}
	impl BrowserOpener for RecordingBrowser {
		fn open(&self, url: &Url) -> io::Result<()> {
			self.0.lock().push(url.clone());

			Ok(())
		}
	}

	/// Constructs an [`Authenticator`] backed by an in-memory store and the provided browser.
	pub fn build_test_authenticator(
		config: OAuthConfig,
		browser: impl 'static + BrowserOpener,
	) -> (Authenticator, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn LoginStore> = store_backend.clone();
		let authenticator = Authenticator::new(store, config).with_browser(Arc::new(browser));

		(authenticator, store_backend)
	}

	/// Builds a login record pointing at `server_url` with the provided token material.
	pub fn login_record_fixture(name: &str, server_url: &str, token: TokenMaterial) -> LoginRecord {
		let name = LoginName::new(name).expect("Login name fixture should be valid.");
		let url = Url::parse(server_url).expect("Server URL fixture should parse successfully.");

		LoginRecord::new(name, url, "fixture-user", token)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
