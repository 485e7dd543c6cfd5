//! Access tokens produced by token sources.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access token minted by a [`TokenSource`](crate::token_source::TokenSource).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer secret to attach to outbound requests.
	pub secret: TokenSecret,
	/// Expiry instant, when the issuer reported one.
	pub expires_at: Option<OffsetDateTime>,
}
impl AccessToken {
	/// Wraps a bearer secret without expiry information.
	pub fn new(secret: impl Into<TokenSecret>) -> Self {
		Self { secret: secret.into(), expires_at: None }
	}

	/// Attaches an absolute expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// `Authorization` header value for this token.
	pub fn bearer_header(&self) -> String {
		self.secret.bearer_header()
	}
}
