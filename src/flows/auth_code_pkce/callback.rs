//! Transient loopback HTTP endpoint that captures the authorization redirect.
//!
//! The listener is bound (and accepting) before the browser opens. The first request at the
//! callback path that carries `code` or `error` wins; later requests get `404` and cannot change
//! the outcome. The server is always shut down before [`CallbackListener::wait`] returns.

// std
use std::{
	io,
	net::{IpAddr, Ipv4Addr, SocketAddr},
	time::Duration as StdDuration,
};
// crates.io
use axum::{
	Router,
	extract::State,
	http::{Method, StatusCode, Uri},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use url::{Host, form_urlencoded};
// self
use crate::{
	_prelude::*,
	config::DEFAULT_REDIRECT_ADDR,
	error::{ConfigError, TransportError},
};

const SHUTDOWN_GRACE: StdDuration = StdDuration::from_secs(1);
const SUCCESS_BODY: &str =
	"Authorization successful! You can close this window and return to the CLI.";
const NO_CODE_ERROR: &str = "no authorization code received";

/// Outcome of one authorization redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackResult {
	/// The server redirected back with an authorization code.
	Code {
		/// Authorization code to exchange.
		code: String,
		/// Returned anti-forgery state; verified by the caller.
		state: String,
	},
	/// The server or the user rejected the request.
	Error {
		/// OAuth `error` code.
		error: String,
		/// Optional `error_description`.
		description: Option<String>,
	},
	/// No usable request arrived before the deadline.
	TimedOut,
}

struct CallbackSlot {
	path: String,
	sender: Mutex<Option<oneshot::Sender<CallbackResult>>>,
}

/// Loopback server owned by exactly one authorization attempt.
pub struct CallbackListener {
	local_addr: SocketAddr,
	redirect_uri: Url,
	receiver: Option<oneshot::Receiver<CallbackResult>>,
	shutdown: Option<oneshot::Sender<()>>,
	task: Option<JoinHandle<()>>,
}
impl CallbackListener {
	/// Binds the loopback listener described by `redirect_uri` and starts serving immediately.
	///
	/// `None` binds `127.0.0.1` on an OS-assigned port. A redirect without an explicit port also
	/// gets an OS-assigned port. Non-loopback hosts are rejected.
	pub async fn bind(redirect_uri: Option<&Url>) -> Result<Self> {
		let (bind_addr, mut redirect_uri) = match redirect_uri {
			Some(url) => (loopback_addr(url)?, url.clone()),
			None => (DEFAULT_REDIRECT_ADDR, default_redirect(DEFAULT_REDIRECT_ADDR)?),
		};
		let listener = TcpListener::bind(bind_addr)
			.await
			.map_err(|source| Error::Bind { addr: bind_addr.to_string(), source })?;
		let local_addr = listener
			.local_addr()
			.map_err(|source| Error::Bind { addr: bind_addr.to_string(), source })?;

		redirect_uri.set_port(Some(local_addr.port())).map_err(|_| {
			ConfigError::InvalidRedirect {
				url: redirect_uri.to_string(),
				source: url::ParseError::InvalidPort,
			}
		})?;

		let path = match redirect_uri.path() {
			"" => "/".to_owned(),
			path => path.to_owned(),
		};
		let (result_tx, result_rx) = oneshot::channel();
		let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
		let slot = Arc::new(CallbackSlot { path, sender: Mutex::new(Some(result_tx)) });
		let router = Router::new().fallback(handle_callback).with_state(slot);
		let task = tokio::spawn(async move {
			let server = axum::serve(listener, router).with_graceful_shutdown(async move {
				let _ = shutdown_rx.await;
			});

			if let Err(e) = server.await {
				tracing::warn!(error = %e, "Callback server stopped unexpectedly.");
			}
		});

		tracing::debug!(%local_addr, "Callback listener accepting connections.");

		Ok(Self {
			local_addr,
			redirect_uri,
			receiver: Some(result_rx),
			shutdown: Some(shutdown_tx),
			task: Some(task),
		})
	}

	/// Socket address the listener is bound to.
	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	/// Port the listener is bound to.
	pub fn port(&self) -> u16 {
		self.local_addr.port()
	}

	/// Redirect URI with the bound port filled in.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	/// Waits for the first callback or for `timeout`, then shuts the server down.
	pub async fn wait(&mut self, timeout: StdDuration) -> Result<CallbackResult> {
		let outcome = match self.receiver.take() {
			Some(receiver) => match tokio::time::timeout(timeout, receiver).await {
				Ok(Ok(result)) => Ok(result),
				Ok(Err(_)) => Err(TransportError::Io(io::Error::other(
					"callback server stopped before receiving a request",
				))
				.into()),
				Err(_) => Ok(CallbackResult::TimedOut),
			},
			None => Ok(CallbackResult::TimedOut),
		};

		self.close().await;

		outcome
	}

	/// Shuts the server down gracefully, aborting it if the grace period elapses.
	pub async fn close(&mut self) {
		if let Some(shutdown) = self.shutdown.take() {
			let _ = shutdown.send(());
		}
		if let Some(mut task) = self.task.take() {
			let drained = tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_ok();

			if !drained {
				task.abort();

				let _ = task.await;
			}
		}

		tracing::debug!(local_addr = %self.local_addr, "Callback listener closed.");
	}
}
impl Debug for CallbackListener {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackListener")
			.field("local_addr", &self.local_addr)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("running", &self.task.is_some())
			.finish()
	}
}
impl Drop for CallbackListener {
	fn drop(&mut self) {
		if let Some(shutdown) = self.shutdown.take() {
			let _ = shutdown.send(());
		}
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}

async fn handle_callback(
	State(slot): State<Arc<CallbackSlot>>,
	method: Method,
	uri: Uri,
) -> (StatusCode, String) {
	if uri.path() != slot.path {
		return (StatusCode::NOT_FOUND, "Not found".into());
	}
	if method != Method::GET {
		return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".into());
	}

	let Some(sender) = slot.sender.lock().take() else {
		tracing::debug!("Ignoring repeated callback request.");

		return (StatusCode::NOT_FOUND, "Not found".into());
	};
	let (status, body, result) = classify(uri.query().unwrap_or_default());

	if sender.send(result).is_err() {
		tracing::debug!("Callback arrived after the login attempt ended.");
	}

	(status, body)
}

fn classify(query: &str) -> (StatusCode, String, CallbackResult) {
	let mut code = None;
	let mut state = None;
	let mut error = None;
	let mut description = None;

	for (key, value) in form_urlencoded::parse(query.as_bytes()) {
		let slot = match key.as_ref() {
			"code" => &mut code,
			"state" => &mut state,
			"error" => &mut error,
			"error_description" => &mut description,
			_ => continue,
		};

		if slot.is_none() && !value.is_empty() {
			*slot = Some(value.into_owned());
		}
	}

	if let Some(error) = error {
		let body = match &description {
			Some(description) => format!("Error: {error}: {description}"),
			None => format!("Error: {error}"),
		};

		return (StatusCode::BAD_REQUEST, body, CallbackResult::Error { error, description });
	}

	match code {
		Some(code) => (
			StatusCode::OK,
			SUCCESS_BODY.into(),
			CallbackResult::Code { code, state: state.unwrap_or_default() },
		),
		None => (
			StatusCode::BAD_REQUEST,
			"Error: No authorization code received".into(),
			CallbackResult::Error { error: NO_CODE_ERROR.into(), description: None },
		),
	}
}

fn loopback_addr(url: &Url) -> Result<SocketAddr, ConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::NonLoopbackRedirect { url: url.to_string() });
	}

	let ip = match url.host() {
		Some(Host::Domain(domain)) if domain.eq_ignore_ascii_case("localhost") =>
			IpAddr::V4(Ipv4Addr::LOCALHOST),
		Some(Host::Ipv4(ip)) if ip.is_loopback() => IpAddr::V4(ip),
		Some(Host::Ipv6(ip)) if ip.is_loopback() => IpAddr::V6(ip),
		_ => return Err(ConfigError::NonLoopbackRedirect { url: url.to_string() }),
	};

	Ok(SocketAddr::new(ip, url.port().unwrap_or(0)))
}

fn default_redirect(addr: SocketAddr) -> Result<Url, ConfigError> {
	let raw = format!("http://{addr}/");

	Url::parse(&raw).map_err(|source| ConfigError::InvalidRedirect { url: raw, source })
}
