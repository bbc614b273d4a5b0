//! Crate-level error types.

use thiserror::Error;

use crate::hydration::HydrationError;
use crate::router::RouterError;

/// Error raised by navigation and client start-up.
///
/// Preload failures are not errors at this level: they render the error
/// page and are reported through
/// [`NavigationOutcome::Failed`](crate::navigation::NavigationOutcome::Failed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum NavigationError {
	/// A navigation target could not be resolved to an absolute URL.
	#[error("invalid URL '{url}': {source}")]
	InvalidUrl {
		/// URL as given.
		url: String,
		/// Parser error.
		#[source]
		source: url::ParseError,
	},
	/// The root container is missing from the document.
	#[error("root element '#{0}' not found")]
	RootNotFound(String),
	/// Mounting or hydrating the page failed.
	#[error(transparent)]
	Hydration(#[from] HydrationError),
	/// A route table operation failed.
	#[error(transparent)]
	Router(#[from] RouterError),
}

/// Result type for navigation operations.
pub type NavigationResult<T> = std::result::Result<T, NavigationError>;

/// Error raised while loading settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SettingsError {
	/// TOML input could not be parsed.
	#[error("failed to parse settings: {0}")]
	Parse(String),
	/// An environment variable holds an unusable value.
	#[error("invalid value '{value}' for {key}: {message}")]
	Env {
		/// Variable name.
		key: String,
		/// Raw value.
		value: String,
		/// Why it was rejected.
		message: String,
	},
	/// The settings are inconsistent.
	#[error("invalid settings: {0}")]
	Invalid(String),
}

/// Result type for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
