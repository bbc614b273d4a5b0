//! Navigation states and outcomes.

use url::Url;

use super::NavigationToken;
use crate::preload::PageError;

/// Observable state of the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationState {
	/// No navigation in flight.
	#[default]
	Idle,
	/// Resolving the preload for the current token.
	Preloading(NavigationToken),
	/// Mounting the resolved page.
	Committing(NavigationToken),
	/// Mounting the error page.
	Failed(NavigationToken),
}

impl NavigationState {
	/// Returns the token the state belongs to.
	pub fn token(self) -> Option<NavigationToken> {
		match self {
			Self::Idle => None,
			Self::Preloading(token) | Self::Committing(token) | Self::Failed(token) => Some(token),
		}
	}

	/// Returns whether no navigation is in flight.
	pub fn is_idle(self) -> bool {
		self == Self::Idle
	}
}

/// Why an error page was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
	/// No route matches the path. Preload never ran.
	///
	/// Reported for the initial document only: client navigations to
	/// unmatched paths are handed to the browser instead.
	RouteNotFound,
	/// Preload failed with a 4xx status.
	ClientError,
	/// Preload failed for any other reason.
	ServerError,
	/// The redirect chain exceeded the configured limit.
	RedirectLoop,
}

impl FailureKind {
	/// Classifies a preload error.
	pub fn of(error: &PageError) -> Self {
		if error.is_client_error() {
			Self::ClientError
		} else {
			Self::ServerError
		}
	}
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
	/// The page was mounted and the address updated.
	Committed {
		/// Token of the navigation.
		token: NavigationToken,
		/// Final address.
		url: Url,
	},
	/// The error page was mounted at the requested address.
	Failed {
		/// Token of the navigation.
		token: NavigationToken,
		/// Requested address.
		url: Url,
		/// Error shown.
		error: PageError,
		/// Classification of the error.
		kind: FailureKind,
	},
	/// A newer navigation started first; the result was dropped.
	Superseded {
		/// Token of the dropped navigation.
		token: NavigationToken,
	},
	/// Only the fragment changed; the page was scrolled.
	Scrolled {
		/// New address.
		url: Url,
	},
	/// The target is not a page; a full server load was requested.
	External {
		/// Address handed to the browser.
		url: Url,
	},
	/// The link is left to the browser.
	Native,
	/// Nothing changed.
	Unchanged,
}

impl NavigationOutcome {
	/// Returns whether a page (or error page) was mounted.
	pub fn is_mounted(&self) -> bool {
		matches!(self, Self::Committed { .. } | Self::Failed { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::navigation::TokenSource;
	use rstest::rstest;

	#[rstest]
	fn test_state_token() {
		let token = TokenSource::new().issue();
		assert_eq!(NavigationState::Idle.token(), None);
		assert_eq!(NavigationState::Preloading(token).token(), Some(token));
		assert!(NavigationState::default().is_idle());
	}

	#[rstest]
	#[case(PageError::new(404, "Not found"), FailureKind::ClientError)]
	#[case(PageError::new(503, "Unavailable"), FailureKind::ServerError)]
	#[case(PageError::internal("boom"), FailureKind::ServerError)]
	fn test_failure_kind(#[case] error: PageError, #[case] expected: FailureKind) {
		assert_eq!(FailureKind::of(&error), expected);
	}
}
