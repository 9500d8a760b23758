//! Browser launching seam.

// std
use std::io;
// self
use crate::_prelude::*;

/// Opens the authorization URL for the user.
///
/// Opening is best-effort: the login flow logs a failure and keeps waiting, because the URL has
/// already been printed for manual use.
pub trait BrowserOpener
where
	Self: Send + Sync,
{
	/// Asks the platform to display `url`.
	fn open(&self, url: &Url) -> io::Result<()>;
}

/// Prints the URL to stderr and hands it to the platform opener (`xdg-open`, `open`, `start`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBrowser;
impl BrowserOpener for SystemBrowser {
	fn open(&self, url: &Url) -> io::Result<()> {
		eprintln!("Please authorize the application by visiting this URL in your browser:\n{url}");

		open::that(url.as_str())
	}
}

/// Opener that only prints the URL, for headless sessions.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintOnlyBrowser;
impl BrowserOpener for PrintOnlyBrowser {
	fn open(&self, url: &Url) -> io::Result<()> {
		eprintln!("Open this URL in a browser to authorize the login:\n{url}");

		Ok(())
	}
}
