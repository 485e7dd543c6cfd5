// crates.io
use httpmock::prelude::*;
// self
use appfolder_sync::{
	_preludet::*,
	auth::{UserId, VerificationMethod, VerifiedIdentity},
};

fn identity(user: &str) -> VerifiedIdentity {
	let user_id = UserId::new(user).expect("User fixture should be valid.");

	VerifiedIdentity::new(user_id, VerificationMethod::IdToken)
}

#[tokio::test]
async fn exchange_returns_credentials_for_the_verified_user() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let id_token = sign_id_token("user-42", TEST_CLIENT_ID, TEST_ISSUER, Duration::minutes(5));
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("code=one-time-code")
				.body_includes("redirect_uri=postmessage")
				.body_includes("grant_type=authorization_code")
				.body_includes("client_secret=secret-it");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"access_token": "access-42",
					"refresh_token": "refresh-42",
					"id_token": id_token,
					"expires_in": 3600,
				})
				.to_string(),
			);
		})
		.await;
	let before = OffsetDateTime::now_utc();
	let credentials = broker
		.exchange_code(&identity("user-42"), "one-time-code")
		.await
		.expect("Exchange for the verified user should succeed.");

	token.assert_calls_async(1).await;

	assert_eq!(credentials.user_id.as_ref(), "user-42");
	assert_eq!(credentials.access_token.expose(), "access-42");
	assert_eq!(credentials.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-42"));
	assert!(credentials.expiry >= before + Duration::seconds(3600));
	assert!(credentials.expiry <= OffsetDateTime::now_utc() + Duration::seconds(3600));
}

#[tokio::test]
async fn exchange_without_id_token_introspects_the_access_token() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"ya29.fresh\",\"expires_in\":3600}");
		})
		.await;

	let tokeninfo = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokeninfo").body_includes("access_token=ya29.fresh");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"issued_to": TEST_CLIENT_ID,
					"user_id": "user-42",
					"expires_in": 3599,
				})
				.to_string(),
			);
		})
		.await;
	let credentials = broker
		.exchange_code(&identity("user-42"), "code")
		.await
		.expect("Exchange verified through introspection should succeed.");

	tokeninfo.assert_calls_async(1).await;

	assert!(credentials.refresh_token.is_none());
}

#[tokio::test]
async fn exchange_for_another_user_is_refused() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let id_token = sign_id_token("user-B", TEST_CLIENT_ID, TEST_ISSUER, Duration::minutes(5));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"access_token": "access-B",
					"refresh_token": "refresh-B",
					"id_token": id_token,
					"expires_in": 3600,
				})
				.to_string(),
			);
		})
		.await;

	let err = broker
		.exchange_code(&identity("user-A"), "code")
		.await
		.expect_err("Credentials for another user must never be returned.");

	match err {
		Error::IdentityMismatch { expected, actual } => {
			assert_eq!(expected, "user-A");
			assert_eq!(actual, "user-B");
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn rejected_exchange_surfaces_remote_status_without_retry() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let err = broker
		.exchange_code(&identity("user-42"), "used-code")
		.await
		.expect_err("A rejected code must fail.");

	assert!(matches!(err, Error::Remote { operation: "exchange_code", status: 400 }));

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn exchanged_id_token_with_wrong_audience_is_invalid() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let id_token = sign_id_token("user-42", "another-client", TEST_ISSUER, Duration::minutes(5));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"access_token": "access-42",
					"id_token": id_token,
					"expires_in": 3600,
				})
				.to_string(),
			);
		})
		.await;

	let err = broker
		.exchange_code(&identity("user-42"), "code")
		.await
		.expect_err("Exchanged tokens for another client must be rejected.");

	assert!(matches!(err, Error::InvalidCredential { .. }));
}
