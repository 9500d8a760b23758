// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use tea_login::{
	auth::{LoginName, LoginRecord, TokenMaterial},
	browser::PrintOnlyBrowser,
	config::OAuthConfig,
	error::{Error, TokenEndpointError},
	flows::Authenticator,
	store::{LoginStore, MemoryStore},
	url::Url,
};

async fn seed(store: &MemoryStore, server: &MockServer, token: TokenMaterial) -> LoginRecord {
	let name = LoginName::new("gitea").expect("Login name fixture should be valid.");
	let url = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let record = LoginRecord::new(name, url, "alice", token);

	store.add_record(record.clone()).await.expect("Seeding the store should succeed.");

	record
}

fn authenticator(store: Arc<MemoryStore>) -> Authenticator {
	Authenticator::new(store, OAuthConfig::default()).with_browser(Arc::new(PrintOnlyBrowser))
}

#[tokio::test]
async fn valid_token_makes_no_network_calls() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/login/oauth/access_token");
			then.status(500);
		})
		.await;
	let store = Arc::new(MemoryStore::default());
	let mut record = seed(
		&store,
		&server,
		TokenMaterial::new("access-current")
			.with_refresh_token("refresh-current")
			.with_expires_at(OffsetDateTime::now_utc() + Duration::hours(1)),
	)
	.await;
	let token = authenticator(store)
		.ensure_access_token(&mut record)
		.await
		.expect("A valid token should be returned.");

	assert_eq!(token.expose(), "access-current");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_persisted() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/login/oauth/access_token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\",\"expires_in\":1800}",
				);
		})
		.await;
	let store = Arc::new(MemoryStore::default());
	let mut record = seed(
		&store,
		&server,
		TokenMaterial::new("access-old")
			.with_refresh_token("refresh-old")
			.with_expires_at(OffsetDateTime::now_utc() - Duration::minutes(1)),
	)
	.await;
	let authenticator = authenticator(store.clone());
	let token = authenticator
		.ensure_access_token(&mut record)
		.await
		.expect("An expired token should be refreshed.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "access-new");
	assert!(record.token.expires_at.is_some_and(|at| at > OffsetDateTime::now_utc()));

	let stored = store
		.get_record("gitea")
		.await
		.expect("Store lookup should succeed.")
		.expect("The login should still exist.");

	assert_eq!(stored.token.access_token.expose(), "access-new");
	assert_eq!(
		stored.token.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("refresh-new")
	);
	assert_eq!(authenticator.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn refresh_without_rotation_keeps_old_refresh_token() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/login/oauth/access_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\"}");
		})
		.await;

	let store = Arc::new(MemoryStore::default());
	let expires_at = OffsetDateTime::now_utc() - Duration::minutes(1);

	seed(
		&store,
		&server,
		TokenMaterial::new("access-old")
			.with_refresh_token("refresh-keep")
			.with_expires_at(expires_at),
	)
	.await;

	let record = authenticator(store)
		.refresh_now("gitea")
		.await
		.expect("Forced refresh should succeed.");

	assert_eq!(record.token.access_token.expose(), "access-new");
	assert_eq!(
		record.token.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("refresh-keep")
	);
	assert_eq!(record.token.expires_at, Some(expires_at));
}

#[tokio::test]
async fn refresh_now_ignores_a_valid_expiry() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/login/oauth/access_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-forced\",\"token_type\":\"bearer\",\"expires_in\":60}");
		})
		.await;
	let store = Arc::new(MemoryStore::default());

	seed(
		&store,
		&server,
		TokenMaterial::new("access-current")
			.with_refresh_token("refresh-current")
			.with_expires_at(OffsetDateTime::now_utc() + Duration::hours(1)),
	)
	.await;

	let record = authenticator(store)
		.refresh_now("GITEA")
		.await
		.expect("Forced refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(record.token.access_token.expose(), "access-forced");
}

#[tokio::test]
async fn rejected_refresh_reports_login_and_keeps_record() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/login/oauth/access_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;

	let store = Arc::new(MemoryStore::default());

	seed(
		&store,
		&server,
		TokenMaterial::new("access-old")
			.with_refresh_token("refresh-revoked")
			.with_expires_at(OffsetDateTime::now_utc() - Duration::minutes(1)),
	)
	.await;

	let authenticator = authenticator(store.clone());
	let err = authenticator
		.access_token("gitea")
		.await
		.expect_err("A rejected refresh token should fail.");

	match err {
		Error::Refresh {
			ref login,
			source: TokenEndpointError::Rejected { ref error, status, .. },
		} => {
			assert_eq!(login, "gitea");
			assert_eq!(error, "invalid_grant");
			assert_eq!(status, Some(400));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	let stored = store
		.get_record("gitea")
		.await
		.expect("Store lookup should succeed.")
		.expect("A failed refresh must not remove the login.");

	assert_eq!(stored.token.access_token.expose(), "access-old");
	assert_eq!(authenticator.refresh_metrics.failures(), 1);
}
