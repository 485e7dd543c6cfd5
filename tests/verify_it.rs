// crates.io
use httpmock::prelude::*;
// self
use appfolder_sync::{_preludet::*, auth::VerificationMethod};

fn tokeninfo_body(issued_to: &str, user_id: &str, expires_in: i64) -> String {
	serde_json::json!({ "issued_to": issued_to, "user_id": user_id, "expires_in": expires_in })
		.to_string()
}

#[tokio::test]
async fn identity_tokens_verify_offline() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let tokeninfo = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokeninfo");
			then.status(500);
		})
		.await;
	let token = sign_id_token("user-42", TEST_CLIENT_ID, TEST_ISSUER, Duration::minutes(5));
	let identity = broker
		.authenticate(Some(&format!("Bearer {token}")))
		.await
		.expect("A valid identity token should authenticate.");

	assert_eq!(identity.user_id().as_ref(), "user-42");
	assert_eq!(identity.method(), VerificationMethod::IdToken);

	tokeninfo.assert_calls_async(0).await;
}

#[tokio::test]
async fn opaque_tokens_fall_back_to_introspection() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let tokeninfo = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokeninfo").body_includes("access_token=ya29.opaque");
			then.status(200)
				.header("content-type", "application/json")
				.body(tokeninfo_body(TEST_CLIENT_ID, "user-7", 1800));
		})
		.await;
	let identity = broker
		.authenticate(Some("bearer ya29.opaque"))
		.await
		.expect("Introspection should vouch for the opaque token.");

	assert_eq!(identity.user_id().as_ref(), "user-7");
	assert_eq!(identity.method(), VerificationMethod::AccessToken);

	tokeninfo.assert_calls_async(1).await;
}

#[tokio::test]
async fn identity_tokens_for_other_audiences_are_rejected() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let tokeninfo = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokeninfo");
			then.status(400).body("{\"error\":\"invalid_token\"}");
		})
		.await;
	let token = sign_id_token("user-42", "another-client", TEST_ISSUER, Duration::minutes(5));
	let err = broker
		.authenticate(Some(&format!("Bearer {token}")))
		.await
		.expect_err("Foreign audiences must not authenticate.");

	assert!(matches!(err, Error::InvalidCredential { .. }));
	assert!(err.is_authentication_failure());

	tokeninfo.assert_calls_async(1).await;
}

#[tokio::test]
async fn introspection_rejects_foreign_or_expired_tokens() {
	for (issued_to, expires_in) in [("another-client", 1800), (TEST_CLIENT_ID, 0)] {
		let server = MockServer::start_async().await;
		let broker = build_reqwest_test_broker(&server.base_url());

		server
			.mock_async(|when, then| {
				when.method(POST).path("/tokeninfo");
				then.status(200)
					.header("content-type", "application/json")
					.body(tokeninfo_body(issued_to, "user-7", expires_in));
			})
			.await;

		let err = broker
			.authenticate(Some("Bearer ya29.opaque"))
			.await
			.expect_err("Foreign or expired access tokens must be rejected.");

		assert!(
			matches!(err, Error::InvalidCredential { .. }),
			"issued_to={issued_to} expires_in={expires_in} produced {err:?}."
		);
	}
}

#[tokio::test]
async fn missing_bearer_scheme_skips_verification() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let tokeninfo = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(500);
		})
		.await;

	for header in [None, Some(""), Some("Basic dXNlcjpwYXNz")] {
		assert!(matches!(broker.authenticate(header).await, Err(Error::MissingCredential)));
	}

	tokeninfo.assert_calls_async(0).await;
}

#[tokio::test]
async fn key_set_is_fetched_from_certs_endpoint() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/certs");
			then.status(200).header("content-type", "application/json").body(TEST_JWKS);
		})
		.await;

	let url = Url::parse(&server.url("/certs")).expect("Mock certs URL should parse.");
	let keys = appfolder_sync::verify::KeySet::fetch(&test_reqwest_http_client(), &url)
		.await
		.expect("Key set should download.");

	assert!(keys.find(TEST_KEY_ID).is_some());
}
