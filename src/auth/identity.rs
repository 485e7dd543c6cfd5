//! Request-scoped verified identity.

// self
use crate::{_prelude::*, auth::UserId};

/// Verification arm that established an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerificationMethod {
	/// Signed identity token (JWT), verified offline against the provider's keys.
	IdToken,
	/// Opaque access token, verified by the provider's introspection endpoint.
	AccessToken,
}
impl VerificationMethod {
	/// Verification arms in the order they are attempted.
	pub const ORDERED: [Self; 2] = [Self::IdToken, Self::AccessToken];

	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::IdToken => "id_token",
			Self::AccessToken => "access_token",
		}
	}
}
impl Display for VerificationMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// User identity established for a single request.
///
/// The value is immutable and passed explicitly to every downstream operation; nothing
/// re-derives the user mid-request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
	user_id: UserId,
	method: VerificationMethod,
}
impl VerifiedIdentity {
	/// Binds a user to the verification arm that vouched for it.
	pub fn new(user_id: UserId, method: VerificationMethod) -> Self {
		Self { user_id, method }
	}

	/// Verified user identifier.
	pub fn user_id(&self) -> &UserId {
		&self.user_id
	}

	/// Verification arm that produced this identity.
	pub fn method(&self) -> VerificationMethod {
		self.method
	}
}
