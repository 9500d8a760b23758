//! Lazy refresh-token lifecycle.
//!
//! [`Authenticator::ensure_access_token`] is the gate every API call passes through: a token
//! that is still valid is returned untouched, an expired one (or one with unknown expiry) is
//! redeemed with the stored refresh token and persisted before use.
//! [`Authenticator::refresh_now`] forces the exchange regardless of expiry.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{LoginRecord, TokenSecret},
	flows::{Authenticator, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	server::ServerEndpoints,
};

impl Authenticator {
	/// Returns a usable access token for `record`, refreshing and persisting it first if needed.
	///
	/// On success `record` reflects what is stored. A record without a refresh token is returned
	/// as is; the server decides whether its token still works.
	pub async fn ensure_access_token(&self, record: &mut LoginRecord) -> Result<TokenSecret> {
		let now = OffsetDateTime::now_utc();

		if !record.token.needs_refresh_at(now) {
			self.refresh_metrics.record_skipped();
			obs::record_flow_outcome(FlowKind::Refresh, FlowOutcome::Skipped);

			tracing::debug!(login = %record.name, "Access token is still usable.");

			return Ok(record.token.access_token.clone());
		}

		self.refresh_record(record, "ensure_access_token").await?;

		Ok(record.token.access_token.clone())
	}

	/// Loads `name` from the store and returns a usable access token for it.
	pub async fn access_token(&self, name: &str) -> Result<TokenSecret> {
		let mut record = self.load_record(name).await?;

		self.ensure_access_token(&mut record).await
	}

	/// Refreshes `name` unconditionally and returns the stored result.
	pub async fn refresh_now(&self, name: &str) -> Result<LoginRecord> {
		let mut record = self.load_record(name).await?;

		if record.token.usable_refresh_token().is_none() {
			return Err(Error::MissingRefreshToken { login: record.name.into() });
		}

		self.refresh_record(&mut record, "refresh_now").await?;

		Ok(record)
	}

	async fn load_record(&self, name: &str) -> Result<LoginRecord> {
		self.store.get_record(name).await?.ok_or_else(|| Error::UnknownLogin { name: name.into() })
	}

	async fn refresh_record(&self, record: &mut LoginRecord, stage: &'static str) -> Result<()> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span.instrument(self.exchange_refresh(record)).await;

		match &result {
			Ok(()) => {
				self.refresh_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(e) => {
				tracing::warn!(error = %e, "Token refresh failed.");

				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn exchange_refresh(&self, record: &mut LoginRecord) -> Result<()> {
		let login = String::from(record.name.clone());
		let refresh_token = record
			.token
			.usable_refresh_token()
			.cloned()
			.ok_or_else(|| Error::MissingRefreshToken { login: login.clone() })?;
		let endpoints = ServerEndpoints::from_base(record.url.as_str())?;
		let client_id = record.client_id.clone().unwrap_or_else(|| self.config.client_id.clone());
		let (_, token_endpoint) = common::server_clients(&endpoints, &client_id, record.insecure)?;
		let refreshed = token_endpoint
			.refresh_token(refresh_token.expose())
			.await
			.map_err(|source| Error::Refresh { login: login.clone(), source })?;

		// The caller keeps the new tokens even when persisting fails.
		record.token.merge_refreshed(refreshed);
		self.store.update_record(record.clone()).await?;

		tracing::info!(login = %login, expires_at = ?record.token.expires_at, "Access token refreshed.");

		Ok(())
	}
}
