//! Preload results and their normalized outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::fetch::FetchError;

/// Props handed to a page component.
pub type Props = serde_json::Map<String, Value>;

/// Instruction to continue navigation at another location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
	/// HTTP status (3xx).
	pub status: u16,
	/// Target location, absolute or relative to the redirecting URL.
	pub location: String,
}

impl Redirect {
	/// Creates a redirect descriptor.
	pub fn new(status: u16, location: impl Into<String>) -> Self {
		Self {
			status,
			location: location.into(),
		}
	}
}

/// Failure rendered through the error page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageError {
	/// HTTP status reported for the page.
	pub status: u16,
	/// Human readable message.
	pub message: String,
}

impl PageError {
	/// Creates a page error.
	pub fn new(status: u16, message: impl Into<String>) -> Self {
		Self {
			status,
			message: message.into(),
		}
	}

	/// A 404 error for a path that no page handles.
	pub fn not_found(path: &str) -> Self {
		Self::new(404, format!("Not found: {path}"))
	}

	/// A 500 error with the given message.
	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(500, message)
	}

	/// Returns true for 4xx statuses.
	pub fn is_client_error(&self) -> bool {
		(400..500).contains(&self.status)
	}

	/// Returns true for anything that is not a client error.
	pub fn is_server_error(&self) -> bool {
		!self.is_client_error()
	}
}

/// Value returned by a successful preload.
#[derive(Debug, Clone, PartialEq)]
pub enum PreloadResult {
	/// Render the page with these props.
	Props(Props),
	/// Continue at another location.
	Redirect(Redirect),
}

impl PreloadResult {
	/// Builds a redirect result.
	pub fn redirect(status: u16, location: impl Into<String>) -> Self {
		Self::Redirect(Redirect::new(status, location))
	}

	/// Builds props from any serializable value that serializes to an object.
	pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, PreloadError> {
		match serde_json::to_value(value) {
			Ok(Value::Object(props)) => Ok(Self::Props(props)),
			Ok(other) => Err(PreloadError::Other(format!(
				"preload props must serialize to an object, got {other}"
			))),
			Err(e) => Err(PreloadError::Other(e.to_string())),
		}
	}
}

impl From<Props> for PreloadResult {
	fn from(props: Props) -> Self {
		Self::Props(props)
	}
}

/// Error returned by a preload function.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PreloadError {
	/// Explicit failure with an HTTP status.
	#[error("preload failed with status {status}: {message}")]
	Status {
		/// HTTP status.
		status: u16,
		/// Message shown on the error page.
		message: String,
	},
	/// Redirect raised as an error (short-circuits the preload body).
	#[error("preload redirected to {} ({})", .0.location, .0.status)]
	Redirect(Redirect),
	/// A data request made through the preload context failed.
	#[error("preload fetch failed: {0}")]
	Fetch(#[from] FetchError),
	/// Any other failure.
	#[error("{0}")]
	Other(String),
}

impl PreloadError {
	/// Creates a status error.
	pub fn status(status: u16, message: impl Into<String>) -> Self {
		Self::Status {
			status,
			message: message.into(),
		}
	}

	/// Creates an untyped error.
	pub fn other(message: impl Into<String>) -> Self {
		Self::Other(message.into())
	}
}

/// Normalized result of running a route's preload.
///
/// Exactly one variant is produced per preload invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreloadOutcome {
	/// Render the page with these props.
	Props(Props),
	/// Continue at another location.
	Redirect(Redirect),
	/// Render the error page.
	Error(PageError),
}

impl PreloadOutcome {
	/// Normalizes a successful preload result.
	pub fn from_result(result: PreloadResult) -> Self {
		match result {
			PreloadResult::Props(props) => Self::Props(props),
			PreloadResult::Redirect(redirect) => Self::from_redirect(redirect),
		}
	}

	/// Classifies a preload error.
	///
	/// 4xx statuses stay client errors and 5xx statuses keep their value;
	/// everything else becomes a 500.
	pub fn from_error(error: PreloadError) -> Self {
		match error {
			PreloadError::Redirect(redirect) => Self::from_redirect(redirect),
			PreloadError::Status { status, message } => Self::Error(classify(status, message)),
			PreloadError::Fetch(FetchError::Status { status, url }) => {
				let message = if (400..500).contains(&status) {
					format!("Not found: {url}")
				} else {
					format!("request to {url} failed with status {status}")
				};
				Self::Error(classify(status, message))
			}
			other => Self::Error(PageError::internal(other.to_string())),
		}
	}

	fn from_redirect(redirect: Redirect) -> Self {
		if (300..400).contains(&redirect.status) {
			Self::Redirect(redirect)
		} else {
			Self::Error(PageError::internal(format!(
				"invalid redirect status {} for {}",
				redirect.status, redirect.location
			)))
		}
	}

	/// Returns the props if this outcome renders the page.
	pub fn props(&self) -> Option<&Props> {
		match self {
			Self::Props(props) => Some(props),
			_ => None,
		}
	}
}

fn classify(status: u16, message: String) -> PageError {
	match status {
		400..=599 => PageError::new(status, message),
		_ => PageError::internal(message),
	}
}
