//! Error types for route definition and reverse lookup.

use thiserror::Error;

/// Error raised while compiling a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PatternError {
	/// Pattern string is longer than the allowed maximum.
	#[error("pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Actual length in bytes.
		length: usize,
		/// Maximum length in bytes.
		max: usize,
	},
	/// Pattern has more segments than allowed.
	#[error("pattern has {count} path segments, exceeding maximum of {max}")]
	TooManySegments {
		/// Actual segment count.
		count: usize,
		/// Maximum segment count.
		max: usize,
	},
	/// A rest parameter appears before the final segment.
	#[error("rest parameter '{0}' must be the final segment")]
	RestNotLast(String),
	/// The same parameter name is used twice.
	#[error("duplicate parameter name '{0}'")]
	DuplicateParam(String),
	/// A parameter segment could not be parsed.
	#[error("malformed parameter segment '{0}'")]
	MalformedParam(String),
	/// A constraint did not compile to a regex.
	#[error("invalid constraint for parameter '{name}': {message}")]
	InvalidConstraint {
		/// Parameter name.
		name: String,
		/// Regex compiler message.
		message: String,
	},
}

/// Error type for route table operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RouterError {
	/// No route registered under this name.
	#[error("Invalid route name: {0}")]
	InvalidRouteName(String),
	/// A parameter required by the pattern was not supplied.
	#[error("Missing parameter: {0}")]
	MissingParameter(String),
	/// The pattern itself is invalid.
	#[error("Invalid pattern: {0}")]
	Pattern(#[from] PatternError),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_pattern_error_display() {
		let err = PatternError::TooManySegments { count: 40, max: 32 };
		assert_eq!(
			err.to_string(),
			"pattern has 40 path segments, exceeding maximum of 32"
		);
	}

	#[rstest]
	fn test_router_error_display() {
		assert_eq!(
			RouterError::InvalidRouteName("blog".to_string()).to_string(),
			"Invalid route name: blog"
		);
		assert_eq!(
			RouterError::MissingParameter("slug".to_string()).to_string(),
			"Missing parameter: slug"
		);
	}

	#[rstest]
	fn test_router_error_from_pattern_error() {
		let err: RouterError = PatternError::RestNotLast("path".to_string()).into();
		assert!(err.to_string().contains("must be the final segment"));
	}
}
