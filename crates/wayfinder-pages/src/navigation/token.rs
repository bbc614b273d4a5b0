//! Navigation tokens.

use std::cell::Cell;
use std::fmt;

/// Identifies one navigation attempt.
///
/// Tokens increase monotonically; only the most recently issued token is
/// current, and only work performed under the current token may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NavigationToken(u64);

impl NavigationToken {
	/// Returns the raw token value.
	pub fn value(self) -> u64 {
		self.0
	}
}

impl fmt::Display for NavigationToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Issues navigation tokens.
#[derive(Debug, Default)]
pub struct TokenSource {
	last: Cell<u64>,
}

impl TokenSource {
	/// Creates a source that has not issued any token.
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues a new token, making every earlier token stale.
	pub fn issue(&self) -> NavigationToken {
		let next = self.last.get() + 1;
		self.last.set(next);
		NavigationToken(next)
	}

	/// Returns the current token, if any was issued.
	pub fn current(&self) -> Option<NavigationToken> {
		match self.last.get() {
			0 => None,
			value => Some(NavigationToken(value)),
		}
	}

	/// Returns whether `token` is still current.
	pub fn is_current(&self, token: NavigationToken) -> bool {
		self.last.get() == token.0
	}
}
