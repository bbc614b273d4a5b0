//! Data fetching used by preload functions.
//!
//! [`Fetch`] is the seam between preload code and the network. Browser and
//! native hosts use [`HttpFetch`]; tests and static hosts use
//! [`MemoryFetch`], which serves canned JSON and records every request.

use std::cell::RefCell;
use std::collections::HashMap;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Error type for data requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FetchError {
	/// The requested URL could not be resolved.
	#[error("invalid URL '{url}': {message}")]
	InvalidUrl {
		/// URL as given.
		url: String,
		/// Parser message.
		message: String,
	},
	/// The request could not be completed.
	#[error("request to {url} failed: {message}")]
	Network {
		/// Requested URL.
		url: String,
		/// Transport message.
		message: String,
	},
	/// The server answered with a non-success status.
	#[error("request to {url} failed with status {status}")]
	Status {
		/// Requested URL.
		url: String,
		/// HTTP status.
		status: u16,
	},
	/// The response body was not valid JSON.
	#[error("response from {url} is not valid JSON: {message}")]
	Decode {
		/// Requested URL.
		url: String,
		/// Decoder message.
		message: String,
	},
}

/// Fetches JSON documents.
pub trait Fetch {
	/// Requests `url` and decodes the JSON body.
	fn fetch(&self, url: &Url) -> LocalBoxFuture<'static, Result<Value, FetchError>>;
}

/// Path plus non-empty query, the form used for cache keys and request logs.
pub(crate) fn request_key(url: &Url) -> String {
	match url.query() {
		Some(query) if !query.is_empty() => format!("{}?{}", url.path(), query),
		_ => url.path().to_string(),
	}
}

#[derive(Debug, Clone)]
enum CannedResponse {
	Json(Value),
	Status(u16),
}

/// In-memory [`Fetch`] serving canned responses keyed by path.
///
/// Unknown paths answer `404`.
#[derive(Debug, Default)]
pub struct MemoryFetch {
	responses: RefCell<HashMap<String, CannedResponse>>,
	requests: RefCell<Vec<String>>,
}

impl MemoryFetch {
	/// Creates an empty fetcher.
	pub fn new() -> Self {
		Self::default()
	}

	/// Serves `body` for `path`.
	pub fn with_json(self, path: impl Into<String>, body: Value) -> Self {
		self.insert_json(path, body);
		self
	}

	/// Answers `path` with an error status.
	pub fn with_status(self, path: impl Into<String>, status: u16) -> Self {
		self.responses
			.borrow_mut()
			.insert(path.into(), CannedResponse::Status(status));
		self
	}

	/// Serves `body` for `path`, replacing any previous response.
	pub fn insert_json(&self, path: impl Into<String>, body: Value) {
		self.responses
			.borrow_mut()
			.insert(path.into(), CannedResponse::Json(body));
	}

	/// Returns every requested path (with query) in request order.
	pub fn requests(&self) -> Vec<String> {
		self.requests.borrow().clone()
	}

	/// Returns how many times `path` was requested.
	pub fn request_count(&self, path: &str) -> usize {
		self.requests
			.borrow()
			.iter()
			.filter(|request| *request == path)
			.count()
	}

	/// Forgets recorded requests.
	pub fn clear_requests(&self) {
		self.requests.borrow_mut().clear();
	}
}

impl Fetch for MemoryFetch {
	fn fetch(&self, url: &Url) -> LocalBoxFuture<'static, Result<Value, FetchError>> {
		let key = request_key(url);
		debug!(url = %key, "memory fetch");
		self.requests.borrow_mut().push(key.clone());

		let canned = {
			let responses = self.responses.borrow();
			// Query variants fall back to the bare path
			responses
				.get(&key)
				.or_else(|| responses.get(url.path()))
				.cloned()
		};
		let result = match canned {
			Some(CannedResponse::Json(body)) => Ok(body),
			Some(CannedResponse::Status(status)) => Err(FetchError::Status { url: key, status }),
			None => Err(FetchError::Status {
				url: key,
				status: 404,
			}),
		};
		future::ready(result).boxed_local()
	}
}

/// [`Fetch`] over HTTP using `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetch {
	client: reqwest::Client,
}

impl HttpFetch {
	/// Creates a fetcher with a default client.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a fetcher reusing an existing client.
	pub fn with_client(client: reqwest::Client) -> Self {
		Self { client }
	}
}

impl Fetch for HttpFetch {
	fn fetch(&self, url: &Url) -> LocalBoxFuture<'static, Result<Value, FetchError>> {
		let request = self
			.client
			.get(url.clone())
			.header(reqwest::header::ACCEPT, "application/json");
		let url = url.to_string();

		async move {
			debug!(url = %url, "http fetch");
			let response = request.send().await.map_err(|e| FetchError::Network {
				url: url.clone(),
				message: e.to_string(),
			})?;

			let status = response.status();
			if !status.is_success() {
				return Err(FetchError::Status {
					url,
					status: status.as_u16(),
				});
			}

			response.json::<Value>().await.map_err(|e| FetchError::Decode {
				url,
				message: e.to_string(),
			})
		}
		.boxed_local()
	}
}
