//! Cache-coherent read and write of the per-user AppFolder document.
//!
//! Reads are served from the shared cache when possible and only fall through to the remote
//! document store on a miss. Writes always go to the remote store first; the cache is refreshed
//! afterwards on a best-effort basis, so a failed cache write can leave a stale entry for at
//! most [`APP_DATA_TTL`](crate::cache::APP_DATA_TTL).

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, UserCredentials, VerifiedIdentity},
	cache::{AppDataCache, CacheGateway},
	config::AppConfig,
	drive::{self, DriveClient},
	http::ReqwestHttpClient,
	obs::{self, FlowKind},
	store::{self, CredentialStore},
	token_source::{TokenSource, UserTokenSource},
};

/// Small per-user JSON document kept in the user's application folder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFolderDocument {
	/// Remote file identifier; empty until the document has been written remotely.
	#[serde(rename = "id", default)]
	pub remote_file_id: String,
	/// Push-messaging registration key.
	#[serde(rename = "gcm_key", default)]
	pub push_key: String,
	/// Bookmarked session identifiers.
	#[serde(rename = "starred_sessions", default, deserialize_with = "null_as_empty")]
	pub bookmarked_items: Vec<String>,
	/// Viewed video identifiers.
	#[serde(rename = "viewed_videos", default, deserialize_with = "null_as_empty")]
	pub viewed_items: Vec<String>,
	/// Sessions the user already submitted feedback for.
	#[serde(rename = "feedback_submitted_sessions", default, deserialize_with = "null_as_empty")]
	pub feedback_items: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads and writes AppFolder documents on behalf of verified users.
#[derive(Clone)]
pub struct AppFolderSync {
	config: Arc<AppConfig>,
	http_client: ReqwestHttpClient,
	drive: DriveClient,
	cache: CacheGateway,
	credentials: Arc<dyn CredentialStore>,
}
impl AppFolderSync {
	/// Creates a sync service from its collaborators.
	pub fn new(
		config: Arc<AppConfig>,
		http_client: ReqwestHttpClient,
		cache: Arc<dyn AppDataCache>,
		credentials: Arc<dyn CredentialStore>,
	) -> Self {
		let drive = DriveClient::new(config.drive.clone(), http_client.clone());

		Self { config, http_client, drive, cache: CacheGateway::new(cache), credentials }
	}

	/// Returns the user's document, from cache when possible.
	///
	/// A user with no document in the store gets an empty one; this is not an error.
	pub async fn get(&self, identity: &VerifiedIdentity) -> Result<AppFolderDocument> {
		obs::observe(FlowKind::AppDataGet, "get", async move {
			let user = identity.user_id();

			if let Some(document) = self.cache.fetch(user).await {
				return Ok(document);
			}

			let credentials = store::require_credentials(self.credentials.as_ref(), user).await?;
			let token = self.user_token(credentials).await?;
			let candidates = self.drive.list_candidates(&token).await?;
			let document = match drive::select_latest(&candidates) {
				Some(item) => {
					let body = self.drive.download(&token, &item.download_url).await?;
					let mut document: AppFolderDocument =
						crate::error::decode_json("download", &body)?;

					document.remote_file_id = item.id.clone();

					document
				},
				None => {
					tracing::info!(%user, "No AppFolder document found; using an empty one.");

					AppFolderDocument::default()
				},
			};

			self.refresh_cache(identity, &document).await;

			Ok(document)
		})
		.await
	}

	/// Writes `document` to the remote store and refreshes the cache.
	///
	/// On success the remote file id is assigned to `document`, so later writes update the same
	/// file instead of creating another one.
	pub async fn store(
		&self,
		identity: &VerifiedIdentity,
		document: &mut AppFolderDocument,
	) -> Result<()> {
		obs::observe(FlowKind::AppDataStore, "store", async move {
			let user = identity.user_id();
			let credentials = store::require_credentials(self.credentials.as_ref(), user).await?;
			let token = self.user_token(credentials).await?;

			document.remote_file_id = self.drive.upload(&token, document).await?;

			self.refresh_cache(identity, document).await;

			Ok(())
		})
		.await
	}

	async fn user_token(&self, credentials: UserCredentials) -> Result<AccessToken> {
		let source =
			UserTokenSource::new(self.config.clone(), credentials, self.http_client.clone());
		let token = source.token().await?;

		if let Some(rotated) = source.refreshed() {
			if let Err(err) = self.credentials.save(rotated).await {
				tracing::warn!(error = %err, "Failed to persist refreshed credentials.");
			}
		}

		Ok(token)
	}

	async fn refresh_cache(&self, identity: &VerifiedIdentity, document: &AppFolderDocument) {
		if let Err(err) = self.cache.store(identity.user_id(), document).await {
			tracing::warn!(
				user = %identity.user_id(),
				error = %err,
				"Cached document may be stale until it expires."
			);
		}
	}
}
impl Debug for AppFolderSync {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppFolderSync")
			.field("drive", &self.drive)
			.field("cache", &self.cache)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn document_uses_wire_names_and_tolerates_gaps() {
		let document: AppFolderDocument = serde_json::from_str(
			r#"{"id":"file-1","gcm_key":"k","starred_sessions":null,"viewed_videos":["v1"]}"#,
		)
		.expect("Partial documents should decode.");

		assert_eq!(document.remote_file_id, "file-1");
		assert_eq!(document.push_key, "k");
		assert!(document.bookmarked_items.is_empty());
		assert_eq!(document.viewed_items, ["v1"]);
		assert!(document.feedback_items.is_empty());

		let encoded = serde_json::to_value(&document).expect("Document should encode.");

		assert_eq!(encoded["feedback_submitted_sessions"], serde_json::json!([]));
		assert_eq!(encoded["starred_sessions"], serde_json::json!([]));
	}
}
