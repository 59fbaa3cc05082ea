#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use file_token_cache::{
	asset::FileRef,
	cache::FileTokenCache,
	config::CacheConfig,
	error::IssuanceError,
	issuer::{HttpTokenIssuer, TokenIssuer},
};

const SESSION: &str = "session-token";

fn build_config(server: &MockServer) -> CacheConfig {
	CacheConfig::builder()
		.base_url(server.base_url())
		.build()
		.expect("Mock server base URL should produce a valid configuration.")
}

fn build_issuer(server: &MockServer) -> HttpTokenIssuer {
	HttpTokenIssuer::new(&build_config(server))
		.expect("Default reqwest client should build.")
		.with_session(SESSION)
}

#[tokio::test]
async fn issues_token_with_session_header() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/files/token").header("authorization", SESSION);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"file-token-1\"}");
		})
		.await;
	let issuer = build_issuer(&server);
	let token = issuer.issue().await.expect("Token endpoint should issue a token.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "file-token-1");
	assert_eq!(issuer.endpoint().as_str(), server.url("/api/files/token"));
}

#[tokio::test]
async fn missing_session_skips_the_network() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/files/token");
			then.status(200).body("{\"token\":\"never\"}");
		})
		.await;
	let issuer = build_issuer(&server);

	issuer.clear_session();

	let err = issuer.issue().await.expect_err("Issuance without a session should fail.");

	assert!(matches!(err, IssuanceError::Unauthenticated));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unauthorized_responses_map_to_unauthenticated() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/files/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"code\":401,\"message\":\"The request requires valid record authorization token.\"}");
		})
		.await;

	let err = build_issuer(&server).issue().await.expect_err("401 responses should fail.");

	assert!(matches!(err, IssuanceError::Unauthenticated));
}

#[tokio::test]
async fn server_errors_carry_status_and_preview() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/files/token");
			then.status(500).body("{\"message\":\"Something went wrong.\"}");
		})
		.await;

	let err = build_issuer(&server).issue().await.expect_err("500 responses should fail.");

	match err {
		IssuanceError::Rejected { status, message } => {
			assert_eq!(status, 500);
			assert!(message.contains("Something went wrong."));
		},
		other => panic!("Expected a rejected issuance, got {other:?}."),
	}
}

#[tokio::test]
async fn malformed_and_empty_bodies_are_rejected() {
	let server = MockServer::start_async().await;
	let mut malformed = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/files/token");
			then.status(200).header("content-type", "application/json").body("{\"tok\":1}");
		})
		.await;
	let issuer = build_issuer(&server);
	let err = issuer.issue().await.expect_err("Bodies without a token should fail.");

	assert!(matches!(err, IssuanceError::MalformedResponse { .. }));

	malformed.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/files/token");
			then.status(200).header("content-type", "application/json").body("{\"token\":\"\"}");
		})
		.await;

	let err = issuer.issue().await.expect_err("Empty tokens should fail.");

	assert!(matches!(err, IssuanceError::EmptyToken));
}

#[tokio::test]
async fn cache_authorizes_file_urls_with_one_issuance() -> Result<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/files/token").header("authorization", SESSION);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"photo-token\"}");
		})
		.await;
	let (cache, issuer): (FileTokenCache, Arc<HttpTokenIssuer>) =
		FileTokenCache::http(build_config(&server))?;

	issuer.set_session(SESSION);

	let lunch = FileRef::new("food_log", "rec1", "lunch.jpg").with_thumb("100x100");
	let dinner = FileRef::new("food_log", "rec2", "dinner.jpg");
	let (lunch_url, dinner_url) =
		tokio::join!(cache.authenticated_file_url(&lunch), cache.authenticated_file_url(&dinner));

	assert_eq!(
		lunch_url,
		server.url("/api/files/food_log/rec1/lunch.jpg?thumb=100x100&token=photo-token")
	);
	assert_eq!(dinner_url, server.url("/api/files/food_log/rec2/dinner.jpg?token=photo-token"));

	mock.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn cache_fails_open_when_the_session_is_missing() -> Result<()> {
	let server = MockServer::start_async().await;
	let (cache, issuer) = FileTokenCache::http(build_config(&server))?;

	assert!(!issuer.has_session());

	let file = FileRef::new("food_log", "rec1", "lunch.jpg");
	let url = cache.authenticated_file_url(&file).await;

	assert_eq!(url, server.url("/api/files/food_log/rec1/lunch.jpg"));
	assert_eq!(cache.metrics().fail_open(), 1);

	Ok(())
}
