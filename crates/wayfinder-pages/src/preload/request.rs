//! The request shape handed to preload functions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::Props;
use crate::router::Params;

/// The incoming request as seen by a preload function.
///
/// Built identically on the server (initial document) and the client
/// (navigation), so preload code never needs to know where it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadRequest {
	/// HTTP method; client navigations are always `GET`.
	pub method: String,
	/// Path plus query string, as requested.
	pub url: String,
	/// Path component, still percent-encoded.
	pub path: String,
	/// Decoded query parameters (last value wins).
	pub query: BTreeMap<String, String>,
	/// Decoded route parameters.
	pub params: Params,
	/// Host-provided values such as session data.
	pub extras: Props,
}

impl PreloadRequest {
	/// Builds a `GET` request for `url` with the matched route parameters.
	pub fn new(url: &Url, params: Params) -> Self {
		let path = url.path().to_string();
		let request_url = match url.query() {
			Some(query) if !query.is_empty() => format!("{path}?{query}"),
			_ => path.clone(),
		};
		let query = url
			.query_pairs()
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect();

		Self {
			method: "GET".to_string(),
			url: request_url,
			path,
			query,
			params,
			extras: Props::new(),
		}
	}

	/// Sets the HTTP method.
	pub fn with_method(mut self, method: impl Into<String>) -> Self {
		self.method = method.into().to_ascii_uppercase();
		self
	}

	/// Replaces the host-provided extras.
	pub fn with_extras(mut self, extras: Props) -> Self {
		self.extras = extras;
		self
	}

	/// Adds a single host-provided value.
	pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
		self.extras.insert(key.into(), value);
		self
	}

	/// Returns a route parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	/// Returns a query parameter.
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query.get(name).map(String::as_str)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_request_from_url() {
		let url = Url::parse("http://localhost:3000/blog/hello?draft=1&tag=a%20b#top").unwrap();
		let mut params = Params::new();
		params.insert("slug".to_string(), "hello".to_string());

		let request = PreloadRequest::new(&url, params);

		assert_eq!(request.method, "GET");
		assert_eq!(request.url, "/blog/hello?draft=1&tag=a%20b");
		assert_eq!(request.path, "/blog/hello");
		assert_eq!(request.query_param("tag"), Some("a b"));
		assert_eq!(request.param("slug"), Some("hello"));
	}

	#[rstest]
	#[case("http://localhost/show-url", "/show-url")]
	#[case("http://localhost/?", "/")]
	fn test_request_url_omits_empty_query(#[case] url: &str, #[case] expected: &str) {
		let request = PreloadRequest::new(&Url::parse(url).unwrap(), Params::new());
		assert_eq!(request.url, expected);
		assert!(request.query.is_empty());
	}

	#[rstest]
	fn test_request_extras_and_method() {
		let url = Url::parse("http://localhost/").unwrap();
		let request = PreloadRequest::new(&url, Params::new())
			.with_method("post")
			.with_extra("session", json!({"user": "tobias"}));

		assert_eq!(request.method, "POST");
		assert_eq!(request.extras["session"]["user"], "tobias");
	}
}
