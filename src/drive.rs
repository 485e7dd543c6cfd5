//! Client for the remote document store's application folder.
//!
//! Only the handful of calls the sync flow needs are implemented: listing candidate files by
//! title, downloading one, and a multipart create-or-update upload. Every call is authorized with
//! an [`AccessToken`] obtained from the caller's token source.

// crates.io
use rand::{Rng, distr::Alphanumeric};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::DriveConfig,
	error::ConfigError,
	http::{self, ReqwestHttpClient},
	sync::AppFolderDocument,
};

const APP_FOLDER: &str = "appfolder";
const LIST_FIELDS: &str = "nextPageToken,items(id,downloadUrl,modifiedDate)";
const LIST_MAX_RESULTS: &str = "100";
const BOUNDARY_LEN: usize = 30;

/// File entry returned by the listing call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
	/// Remote file identifier.
	#[serde(default)]
	pub id: String,
	/// Direct content URL; empty when the file cannot be downloaded.
	#[serde(default)]
	pub download_url: String,
	/// RFC 3339 last-modified timestamp.
	#[serde(default)]
	pub modified_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
	#[serde(default)]
	items: Vec<DriveItem>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
	#[serde(default)]
	id: String,
}

/// Picks the most recently modified downloadable candidate.
///
/// Items with an unparseable `modifiedDate` or an empty `downloadUrl` are skipped. When several
/// items share the latest timestamp the first one listed wins.
pub fn select_latest(items: &[DriveItem]) -> Option<&DriveItem> {
	let mut latest: Option<(&DriveItem, OffsetDateTime)> = None;

	for item in items {
		if item.download_url.is_empty() {
			continue;
		}

		let modified = match OffsetDateTime::parse(&item.modified_date, &Rfc3339) {
			Ok(modified) => modified,
			Err(err) => {
				tracing::debug!(id = %item.id, error = %err, "Skipping candidate with bad modifiedDate.");

				continue;
			},
		};

		if latest.is_none_or(|(_, best)| modified > best) {
			latest = Some((item, modified));
		}
	}

	latest.map(|(item, _)| item)
}

/// Application-folder client.
#[derive(Clone, Debug)]
pub struct DriveClient {
	config: DriveConfig,
	http_client: ReqwestHttpClient,
}
impl DriveClient {
	/// Creates a client for the configured endpoints and document title.
	pub fn new(config: DriveConfig, http_client: ReqwestHttpClient) -> Self {
		Self { config, http_client }
	}

	/// Lists non-trashed files in the application folder titled with the configured filename.
	pub async fn list_candidates(&self, token: &AccessToken) -> Result<Vec<DriveItem>> {
		const OPERATION: &str = "list";

		let query = format!(
			"'{APP_FOLDER}' in parents and title = '{}' and trashed = false",
			self.config.filename
		);
		let request = self
			.http_client
			.get(self.config.files.clone())
			.header(AUTHORIZATION, token.bearer_header())
			.query(&[
				("q", query.as_str()),
				("fields", LIST_FIELDS),
				("maxResults", LIST_MAX_RESULTS),
			]);
		let (status, body) = self.http_client.send(OPERATION, request).await?;

		if status != StatusCode::OK {
			return Err(Error::Remote { operation: OPERATION, status: status.as_u16() });
		}

		Ok(crate::error::decode_json::<FileList>(OPERATION, &body)?.items)
	}

	/// Downloads raw file content from `download_url`.
	pub async fn download(&self, token: &AccessToken, download_url: &str) -> Result<Vec<u8>> {
		const OPERATION: &str = "download";

		let request =
			self.http_client.get(download_url).header(AUTHORIZATION, token.bearer_header());
		let (status, body) = self.http_client.send(OPERATION, request).await?;

		if !status.is_success() {
			return Err(Error::Remote { operation: OPERATION, status: status.as_u16() });
		}

		Ok(body)
	}

	/// Creates or updates the user's document and returns its remote file id.
	///
	/// A document without a remote id is created with `POST`; otherwise the existing file is
	/// replaced with `PUT`.
	pub async fn upload(&self, token: &AccessToken, document: &AppFolderDocument) -> Result<String> {
		const OPERATION: &str = "upload";

		let (body, boundary) = self.multipart_body(document)?;
		let builder = match document.remote_file_id.as_str() {
			"" => self.http_client.post(self.config.upload.clone()),
			id => self.http_client.put(self.file_upload_url(id)?),
		};
		let request = builder
			.header(AUTHORIZATION, token.bearer_header())
			.header(CONTENT_TYPE, format!("multipart/related; boundary={boundary}"))
			.query(&[("uploadType", "multipart")])
			.body(body);
		let (status, body) = self.http_client.send(OPERATION, request).await?;

		if status.as_u16() > 299 {
			tracing::error!(
				status = status.as_u16(),
				body = %http::body_preview(&body),
				"Document upload was rejected."
			);

			return Err(Error::Remote { operation: OPERATION, status: status.as_u16() });
		}

		if document.remote_file_id.is_empty() {
			let uploaded: UploadedFile = crate::error::decode_json(OPERATION, &body)?;

			if uploaded.id.is_empty() {
				return Err(Error::MissingRemoteId { operation: OPERATION });
			}

			return Ok(uploaded.id);
		}

		// Updates keep the known id when the response omits it.
		Ok(serde_json::from_slice::<UploadedFile>(&body)
			.ok()
			.map(|file| file.id)
			.filter(|id| !id.is_empty())
			.unwrap_or_else(|| document.remote_file_id.clone()))
	}

	fn file_upload_url(&self, id: &str) -> Result<Url> {
		// `push` silently drops dot segments.
		if matches!(id, "." | "..") {
			return Err(Error::InvalidRemoteId { id: id.into() });
		}

		let mut target = self.config.upload.clone();

		target
			.path_segments_mut()
			.map_err(|()| ConfigError::InvalidEndpoint {
				source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
			})?
			.pop_if_empty()
			.push(id);

		Ok(target)
	}

	fn multipart_body(&self, document: &AppFolderDocument) -> Result<(Vec<u8>, String)> {
		let boundary = rand::rng()
			.sample_iter(Alphanumeric)
			.take(BOUNDARY_LEN)
			.map(char::from)
			.collect::<String>();
		let metadata = serde_json::to_vec(&serde_json::json!({
			"title": self.config.filename,
			"mimeType": "application/json",
			"parents": [{ "id": APP_FOLDER }],
		}))
		.map_err(|source| Error::Encode { operation: "upload", source })?;
		let content = serde_json::to_vec(document)
			.map_err(|source| Error::Encode { operation: "upload", source })?;
		let mut body = Vec::with_capacity(metadata.len() + content.len() + 4 * BOUNDARY_LEN);

		for part in [&metadata, &content] {
			body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
			body.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
			body.extend_from_slice(part);
			body.extend_from_slice(b"\r\n");
		}

		body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

		Ok((body, boundary))
	}
}
