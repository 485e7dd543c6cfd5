// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::{
		AppConfig, AppOnlyConfig, ClientConfig, DriveConfig, IdentityEndpoints,
		ServiceAccountConfig,
	},
};

/// Well-known Google endpoints used by [`AppConfigBuilder::google`].
pub mod google {
	/// OAuth 2.0 token endpoint.
	pub const TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";
	/// Access-token introspection endpoint.
	pub const TOKEN_INFO_URL: &str = "https://www.googleapis.com/oauth2/v1/tokeninfo";
	/// Identity-token signing keys.
	pub const CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
	/// Accepted identity-token issuers.
	pub const ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
	/// Drive v2 files endpoint.
	pub const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v2/files";
	/// Drive v2 multipart upload endpoint.
	pub const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v2/files";
	/// Title of the per-user document inside the application folder.
	pub const DRIVE_FILENAME: &str = "user_data.json";
	/// Twitter application-only token endpoint.
	pub const APP_ONLY_TOKEN_URL: &str = "https://api.twitter.com/oauth2/token";
}

/// Errors raised while constructing or validating configuration.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigValidationError {
	/// Client identifier is empty.
	#[error("Client identifier cannot be empty.")]
	MissingClientId,
	/// A required endpoint was not provided.
	#[error("Missing {endpoint} endpoint.")]
	MissingEndpoint {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// A default endpoint could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they target a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// At least one identity-token issuer must be accepted.
	#[error("At least one identity token issuer must be configured.")]
	NoIssuers,
	/// The document filename is empty.
	#[error("Drive filename cannot be empty.")]
	MissingFilename,
}

/// Builder for [`AppConfig`] values.
#[derive(Debug)]
pub struct AppConfigBuilder {
	client_id: String,
	client_secret: TokenSecret,
	token: Option<Url>,
	token_info: Option<Url>,
	certs: Option<Url>,
	issuers: Vec<String>,
	drive_files: Option<Url>,
	drive_upload: Option<Url>,
	drive_filename: Option<String>,
	service_account: ServiceAccountConfig,
	app_only_key: String,
	app_only_secret: TokenSecret,
	app_only_token: Option<Url>,
	google_defaults: bool,
}
impl AppConfigBuilder {
	/// Creates an empty builder for the provided client identifier.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::default(),
			token: None,
			token_info: None,
			certs: None,
			issuers: Vec::new(),
			drive_files: None,
			drive_upload: None,
			drive_filename: None,
			service_account: ServiceAccountConfig::default(),
			app_only_key: String::new(),
			app_only_secret: TokenSecret::default(),
			app_only_token: None,
			google_defaults: false,
		}
	}

	/// Creates a builder that falls back to the well-known Google endpoints, issuers, and
	/// document filename for anything left unset.
	pub fn google(client_id: impl Into<String>) -> Self {
		Self { google_defaults: true, ..Self::new(client_id) }
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<TokenSecret>) -> Self {
		self.client_secret = secret.into();

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token = Some(url);

		self
	}

	/// Sets the access-token introspection endpoint.
	pub fn token_info_endpoint(mut self, url: Url) -> Self {
		self.token_info = Some(url);

		self
	}

	/// Sets the JWKS endpoint.
	pub fn certs_endpoint(mut self, url: Url) -> Self {
		self.certs = Some(url);

		self
	}

	/// Accepts an additional identity-token issuer.
	pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuers.push(issuer.into());

		self
	}

	/// Sets the remote files endpoint.
	pub fn drive_files_endpoint(mut self, url: Url) -> Self {
		self.drive_files = Some(url);

		self
	}

	/// Sets the remote multipart upload endpoint.
	pub fn drive_upload_endpoint(mut self, url: Url) -> Self {
		self.drive_upload = Some(url);

		self
	}

	/// Sets the per-user document title.
	pub fn drive_filename(mut self, filename: impl Into<String>) -> Self {
		self.drive_filename = Some(filename.into());

		self
	}

	/// Sets the service-account email and PEM private key.
	pub fn service_account(
		mut self,
		email: impl Into<String>,
		private_key: impl Into<TokenSecret>,
	) -> Self {
		self.service_account =
			ServiceAccountConfig { email: email.into(), private_key: private_key.into() };

		self
	}

	/// Sets the app-only consumer key and secret.
	pub fn app_only_credentials(
		mut self,
		key: impl Into<String>,
		secret: impl Into<TokenSecret>,
	) -> Self {
		self.app_only_key = key.into();
		self.app_only_secret = secret.into();

		self
	}

	/// Sets the app-only token endpoint.
	pub fn app_only_token_endpoint(mut self, url: Url) -> Self {
		self.app_only_token = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<AppConfig, ConfigValidationError> {
		let defaults = self.google_defaults;
		let endpoints = IdentityEndpoints {
			token: resolve("token", self.token, defaults, google::TOKEN_URL)?,
			token_info: resolve("token_info", self.token_info, defaults, google::TOKEN_INFO_URL)?,
			certs: resolve("certs", self.certs, defaults, google::CERTS_URL)?,
		};
		let issuers = if self.issuers.is_empty() && defaults {
			google::ISSUERS.iter().map(|issuer| (*issuer).to_owned()).collect()
		} else {
			self.issuers
		};
		let filename = match self.drive_filename {
			Some(filename) => filename,
			None if defaults => google::DRIVE_FILENAME.to_owned(),
			None => String::new(),
		};
		let drive = DriveConfig {
			files: resolve("drive_files", self.drive_files, defaults, google::DRIVE_FILES_URL)?,
			upload: resolve("drive_upload", self.drive_upload, defaults, google::DRIVE_UPLOAD_URL)?,
			filename,
		};
		let app_only = AppOnlyConfig {
			key: self.app_only_key,
			secret: self.app_only_secret,
			token_url: resolve(
				"app_only_token",
				self.app_only_token,
				defaults,
				google::APP_ONLY_TOKEN_URL,
			)?,
		};
		let config = AppConfig {
			client: ClientConfig { id: self.client_id, secret: self.client_secret },
			endpoints,
			issuers,
			drive,
			service_account: self.service_account,
			app_only,
		};

		config.validate()?;

		Ok(config)
	}
}

impl AppConfig {
	/// Validates invariants for the configuration.
	pub(crate) fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.client.id.trim().is_empty() {
			return Err(ConfigValidationError::MissingClientId);
		}
		if self.issuers.is_empty() {
			return Err(ConfigValidationError::NoIssuers);
		}
		if self.drive.filename.trim().is_empty() {
			return Err(ConfigValidationError::MissingFilename);
		}

		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("token_info", &self.endpoints.token_info)?;
		validate_endpoint("certs", &self.endpoints.certs)?;
		validate_endpoint("drive_files", &self.drive.files)?;
		validate_endpoint("drive_upload", &self.drive.upload)?;
		validate_endpoint("app_only_token", &self.app_only.token_url)?;

		Ok(())
	}
}

fn resolve(
	endpoint: &'static str,
	value: Option<Url>,
	defaults: bool,
	fallback: &str,
) -> Result<Url, ConfigValidationError> {
	match value {
		Some(url) => Ok(url),
		None if defaults =>
			Url::parse(fallback).map_err(|source| ConfigValidationError::InvalidUrl { endpoint, source }),
		None => Err(ConfigValidationError::MissingEndpoint { endpoint }),
	}
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), ConfigValidationError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigValidationError::InsecureEndpoint { endpoint, url: url.to_string() })
	}
}
