//! Crate-level error types shared across verification, exchange, token sources, and sync.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every variant is request-scoped; none of them should terminate the serving process.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The request carried no `Authorization` header or no bearer scheme prefix.
	#[error("Authorization required.")]
	MissingCredential,
	/// The bearer credential is malformed, expired, issued to another client, or was rejected by
	/// the identity provider.
	#[error("Mismatched or malformed authorization: {reason}.")]
	InvalidCredential {
		/// Diagnostic reason; never shown to end users.
		reason: String,
	},
	/// Exchanged credentials belong to a different user than the one already verified.
	#[error("Exchanged credentials belong to user {actual}; expected {expected}.")]
	IdentityMismatch {
		/// User verified for the in-flight request.
		expected: String,
		/// User the exchanged token was issued to.
		actual: String,
	},
	/// No stored credentials exist for the user.
	#[error("No credentials are stored for user {user}.")]
	CredentialsNotFound {
		/// User whose credentials were requested.
		user: String,
	},
	/// A token endpoint answered successfully but without an access token.
	#[error("The {source_kind} token endpoint returned an empty access token.")]
	EmptyAccessToken {
		/// Token source label.
		source_kind: &'static str,
	},
	/// Remote endpoint answered with a non-success status.
	#[error("Remote {operation} call failed with status {status}.")]
	Remote {
		/// Operation label (e.g. `exchange_code`, `upload`).
		operation: &'static str,
		/// HTTP status code returned by the remote endpoint.
		status: u16,
	},
	/// Remote endpoint returned a body that could not be decoded.
	#[error("Remote {operation} response could not be decoded.")]
	Decode {
		/// Operation label.
		operation: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A successful create response did not name the new file.
	#[error("Remote {operation} response did not carry a file id.")]
	MissingRemoteId {
		/// Operation label.
		operation: &'static str,
	},
	/// A document's remote file id cannot address a single file.
	#[error("Remote file id {id:?} is not a usable path segment.")]
	InvalidRemoteId {
		/// Offending identifier.
		id: String,
	},
	/// A document could not be encoded for an outbound request.
	#[error("Document could not be encoded for {operation}.")]
	Encode {
		/// Operation label.
		operation: &'static str,
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Shared cache failure.
	#[error(transparent)]
	Cache(#[from] crate::cache::CacheError),
	/// Credential storage failure.
	#[error(transparent)]
	Storage(#[from] crate::store::StoreError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Returns `true` for failures the router should answer with an authentication response.
	pub fn is_authentication_failure(&self) -> bool {
		matches!(
			self,
			Self::MissingCredential | Self::InvalidCredential { .. } | Self::IdentityMismatch { .. }
		)
	}

	pub(crate) fn invalid_credential(reason: impl Into<String>) -> Self {
		Self::InvalidCredential { reason: reason.into() }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An endpoint URL could not be used.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// App-only credentials are missing a key or secret.
	#[error("App-only credentials require a non-empty key and secret.")]
	MissingAppCredentials,
	/// Service account credentials are missing a private key or email.
	#[error("Service account credentials require a non-empty private key and email.")]
	MissingServiceAccount,
	/// Service account private key could not be parsed or used for signing.
	#[error("Service account private key is invalid.")]
	InvalidServiceAccountKey(#[source] jsonwebtoken::errors::Error),
	/// The JWKS document could not be parsed.
	#[error("Identity token key set is invalid.")]
	InvalidKeySet(#[source] serde_json::Error),
	/// Stored credentials cannot be refreshed.
	#[error("Stored credentials are missing a refresh token.")]
	MissingRefreshToken,
	/// Token endpoint omitted `expires_in`.
	#[error("The token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {operation}.")]
	Network {
		/// Operation label.
		operation: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The token endpoint failed in a way the OAuth client could not classify.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling a remote endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error for the labelled operation.
	pub fn network(
		operation: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { operation, source: Box::new(src) }
	}
}

/// Decodes a JSON response body, keeping the path of the first failing field.
pub(crate) fn decode_json<T>(operation: &'static str, body: &[u8]) -> Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode { operation, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct TokenInfoFixture {
		#[allow(dead_code)]
		expires_in: i64,
	}

	#[test]
	fn authentication_failures_are_classified() {
		assert!(Error::MissingCredential.is_authentication_failure());
		assert!(Error::invalid_credential("expired").is_authentication_failure());
		assert!(
			Error::IdentityMismatch { expected: "a".into(), actual: "b".into() }
				.is_authentication_failure()
		);
		assert!(!Error::Remote { operation: "upload", status: 500 }.is_authentication_failure());
	}

	#[test]
	fn decode_json_reports_field_path() {
		let err = decode_json::<TokenInfoFixture>("tokeninfo", br#"{"expires_in":"soon"}"#)
			.expect_err("A string expires_in must fail to decode.");

		match err {
			Error::Decode { operation, source } => {
				assert_eq!(operation, "tokeninfo");
				assert_eq!(source.path().to_string(), "expires_in");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn encode_failures_name_the_operation() {
		let source = serde_json::to_vec(&std::collections::HashMap::from([((1, 2), 3)]))
			.expect_err("Tuple keys cannot become JSON object keys.");
		let err = Error::Encode { operation: "upload", source };

		assert_eq!(err.to_string(), "Document could not be encoded for upload.");
		assert!(!err.is_authentication_failure());
	}
}
