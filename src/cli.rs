//! Command-line front end: `tea-login login add --oauth`, `login oauth-refresh`, `login token`.

// std
use std::{path::PathBuf, time::Duration as StdDuration};
// crates.io
use clap::{Args, Parser, Subcommand};
use color_eyre::{Report, Section, eyre::eyre};
use tracing_subscriber::EnvFilter;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	browser::PrintOnlyBrowser,
	config::{self, OAuthConfig},
	error::ConfigError,
	flows::{Authenticator, LoginRequest},
	store::{FileStore, LoginStore},
};

const STORE_DIR: &str = "tea-login";
const STORE_FILE: &str = "logins.json";

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "tea-login", version, about = "OAuth2 login management for Gitea")]
pub struct Cli {
	/// Enable debug logging.
	#[arg(long, global = true)]
	pub debug: bool,
	/// Path of the login store.
	#[arg(long, global = true, env = "TEA_LOGIN_CONFIG")]
	pub config: Option<PathBuf>,
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Manage logins.
	#[command(subcommand)]
	Login(LoginCommand),
}

#[derive(Debug, Subcommand)]
enum LoginCommand {
	/// Add a login through the browser-based OAuth flow.
	Add(AddArgs),
	/// Refresh the OAuth token of a login.
	OauthRefresh(RefreshArgs),
	/// Print a usable access token, refreshing it first when expired.
	Token(TokenArgs),
	/// List stored login names.
	List,
}

#[derive(Debug, Args)]
struct AddArgs {
	/// Use the interactive OAuth flow.
	#[arg(long, required = true)]
	oauth: bool,
	/// Server URL.
	#[arg(long, env = "GITEA_SERVER_URL", default_value = "https://gitea.com")]
	url: String,
	/// Login name; derived from the server host when omitted.
	#[arg(long)]
	name: Option<String>,
	/// Skip TLS certificate verification.
	#[arg(long)]
	insecure: bool,
	/// OAuth client id of a custom application.
	#[arg(long)]
	client_id: Option<String>,
	/// Comma- or space-separated scopes to request; defaults to every Gitea scope.
	#[arg(long)]
	scopes: Option<ScopeSet>,
	/// Redirect URL registered for the custom application.
	#[arg(long)]
	redirect_url: Option<String>,
	/// Disable the server version check for this login.
	#[arg(long)]
	no_version_check: bool,
	/// Print the authorization URL instead of launching a browser.
	#[arg(long)]
	no_browser: bool,
	/// Seconds to wait for the authorization callback.
	#[arg(long, default_value_t = config::DEFAULT_CALLBACK_TIMEOUT.as_secs())]
	timeout: u64,
}

#[derive(Debug, Args)]
struct RefreshArgs {
	/// Login to refresh; defaults to the first login in the store file.
	name: Option<String>,
}

#[derive(Debug, Args)]
struct TokenArgs {
	/// Login whose token should be printed.
	name: String,
}

/// Parses arguments, installs reporting and logging, and runs the selected command.
pub fn run() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	init_tracing(cli.debug);

	let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

	runtime.block_on(execute(cli))
}

/// Runs an already parsed command line.
pub async fn execute(cli: Cli) -> color_eyre::Result<()> {
	let path = match cli.config {
		Some(path) => path,
		None => default_store_path()?,
	};
	let store: Arc<dyn LoginStore> = Arc::new(FileStore::open(path)?);

	match cli.command {
		Command::Login(LoginCommand::Add(args)) => add(store, args).await,
		Command::Login(LoginCommand::OauthRefresh(args)) => refresh(store, args).await,
		Command::Login(LoginCommand::Token(args)) => {
			let authenticator = Authenticator::new(store, OAuthConfig::default());
			let token = authenticator.access_token(&args.name).await.map_err(report)?;

			println!("{}", token.expose());

			Ok(())
		},
		Command::Login(LoginCommand::List) => {
			for name in store.list_names().await? {
				println!("{name}");
			}

			Ok(())
		},
	}
}

async fn add(store: Arc<dyn LoginStore>, args: AddArgs) -> color_eyre::Result<()> {
	let mut config =
		OAuthConfig::default().with_callback_timeout(StdDuration::from_secs(args.timeout));

	if let Some(scopes) = args.scopes {
		config = config.with_scopes(scopes);
	}

	let mut authenticator = Authenticator::new(store, config);

	if args.no_browser {
		authenticator = authenticator.with_browser(Arc::new(PrintOnlyBrowser));
	}

	let mut request = LoginRequest::new(args.url)
		.with_insecure_tls(args.insecure)
		.with_version_check(!args.no_version_check);

	if let Some(name) = args.name {
		request = request.with_name(name);
	}
	if let Some(client_id) = args.client_id {
		request = request.with_client_id(client_id);
	}
	if let Some(redirect_url) =
		args.redirect_url.as_deref().map(config::parse_redirect_url).transpose()?.flatten()
	{
		request = request.with_redirect_url(redirect_url);
	}

	let record = authenticator.login(request).await.map_err(report)?;

	println!(
		"Login as {} on {} successful. Added this login as {}",
		record.user, record.url, record.name
	);

	Ok(())
}

async fn refresh(store: Arc<dyn LoginStore>, args: RefreshArgs) -> color_eyre::Result<()> {
	let name = match args.name {
		Some(name) => name,
		None => store
			.list_names()
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| eyre!("No logins are configured."))?,
	};
	let authenticator = Authenticator::new(store, OAuthConfig::default());
	let record = authenticator.refresh_now(&name).await.map_err(report)?;

	println!("Successfully refreshed OAuth token for {}", record.name);

	Ok(())
}

fn report(e: Error) -> Report {
	let hint = e.hint();
	let report = Report::new(e);

	match hint {
		Some(hint) => report.suggestion(hint),
		None => report,
	}
}

fn init_tracing(debug: bool) {
	let filter = if debug {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.compact()
		.init();
}

fn default_store_path() -> Result<PathBuf, ConfigError> {
	dirs::config_dir()
		.map(|dir| dir.join(STORE_DIR).join(STORE_FILE))
		.ok_or(ConfigError::MissingConfigDir)
}
