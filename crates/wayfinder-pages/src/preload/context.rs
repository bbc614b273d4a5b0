//! Capabilities handed to a running preload.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use url::Url;

use super::{PreloadError, Redirect};
use crate::fetch::{Fetch, FetchError};

/// Context passed to every preload invocation.
///
/// Relative data URLs resolve against the application root, so
/// `context.fetch("blog/hello.json")` requests `/blog/hello.json` no matter
/// which page is loading.
#[derive(Clone)]
pub struct PreloadContext {
	base: Url,
	fetch: Rc<dyn Fetch>,
}

impl fmt::Debug for PreloadContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PreloadContext")
			.field("base", &self.base.as_str())
			.finish_non_exhaustive()
	}
}

impl PreloadContext {
	/// Creates a context resolving relative URLs against `base`.
	pub fn new(base: Url, fetch: Rc<dyn Fetch>) -> Self {
		Self { base, fetch }
	}

	/// Returns the base URL.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Fetches JSON data.
	pub async fn fetch(&self, href: &str) -> Result<Value, FetchError> {
		let url = self.base.join(href).map_err(|e| FetchError::InvalidUrl {
			url: href.to_string(),
			message: e.to_string(),
		})?;
		self.fetch.fetch(&url).await
	}

	/// Builds a redirect error, for `return Err(context.redirect(..))`.
	pub fn redirect(&self, status: u16, location: impl Into<String>) -> PreloadError {
		PreloadError::Redirect(Redirect::new(status, location))
	}

	/// Builds a status error, for `return Err(context.error(..))`.
	pub fn error(&self, status: u16, message: impl Into<String>) -> PreloadError {
		PreloadError::status(status, message)
	}
}
