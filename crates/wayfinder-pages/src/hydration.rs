//! Client-side hydration and page mounting.
//!
//! The initial document arrives fully rendered by the server. Hydration
//! walks that markup against the page's [`View`](crate::component::View),
//! reusing every node and attaching event handlers. Later navigations mount
//! freshly built nodes through the same [`Reconciler`].

mod reconciler;
mod record;

pub use reconciler::Reconciler;
pub use record::HydrationRecord;

use crate::dom::DomError;

/// Errors that can occur during hydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationError {
	/// The hydration root element was not found.
	RootNotFound(String),
	/// DOM structure doesn't match expected structure.
	StructureMismatch {
		/// Position of the mismatch (dotted child indexes).
		path: String,
		/// Expected node.
		expected: String,
		/// Actual node.
		actual: String,
	},
	/// A DOM mutation failed.
	Dom(DomError),
}

impl std::fmt::Display for HydrationError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::RootNotFound(id) => write!(f, "Hydration root element not found: {}", id),
			Self::StructureMismatch {
				path,
				expected,
				actual,
			} => {
				write!(
					f,
					"DOM structure mismatch at {}: expected {}, found {}",
					path, expected, actual
				)
			}
			Self::Dom(err) => write!(f, "DOM operation failed: {}", err),
		}
	}
}

impl std::error::Error for HydrationError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Dom(err) => Some(err),
			_ => None,
		}
	}
}

impl From<DomError> for HydrationError {
	fn from(err: DomError) -> Self {
		Self::Dom(err)
	}
}
