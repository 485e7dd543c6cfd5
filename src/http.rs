//! Shared HTTP transport.
//!
//! [`ReqwestHttpClient`] is the single transport injected into every component. Plain JSON and
//! form calls (introspection, code exchange, client-credentials, document store) go through the
//! wrapped [`ReqwestClient`] directly; the OAuth refresh grant runs through the `oauth2` crate,
//! which receives an [`InstrumentedHandle`] that records the response status in a
//! [`ResponseMetadataSlot`] so error mapping can report it.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::TransportError};

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Callers apply request deadlines by configuring the wrapped client; nothing in this crate adds
/// timeouts or retries on top of it.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds an instrumented handle for the `oauth2` crate.
	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}

	/// Sends `request`, returning the status and the full response body.
	///
	/// Only network failures become errors here; status handling is left to the caller.
	pub(crate) async fn send(
		&self,
		operation: &'static str,
		request: reqwest::RequestBuilder,
	) -> Result<(StatusCode, Vec<u8>)> {
		let response =
			request.send().await.map_err(|err| TransportError::network(operation, err))?;
		let status = response.status();
		let body =
			response.bytes().await.map_err(|err| TransportError::network(operation, err))?;

		Ok((status, body.to_vec()))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Instrumented adapter that implements [`AsyncHttpClient`] for reqwest.
pub(crate) struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient::instrumented`] for `oauth2` token requests.
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Lossy UTF-8 preview of a response body for error logs.
pub(crate) fn body_preview(body: &[u8]) -> String {
	const LIMIT: usize = 512;

	let text = String::from_utf8_lossy(body);

	if text.chars().count() > LIMIT {
		format!("{}…", text.chars().take(LIMIT).collect::<String>())
	} else {
		text.into_owned()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(400) });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(400));
		assert!(slot.take().is_none());
	}

	#[test]
	fn body_preview_truncates_long_bodies() {
		let body = "x".repeat(600);
		let preview = body_preview(body.as_bytes());

		assert_eq!(preview.chars().count(), 513);
		assert_eq!(body_preview(b"{\"error\":\"invalid_grant\"}"), "{\"error\":\"invalid_grant\"}");
	}
}
