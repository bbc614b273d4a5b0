//! Navigation requests.

use url::Url;

/// What started a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
	/// An intercepted link activation.
	LinkClick,
	/// A programmatic `goto`.
	Programmatic,
	/// A history traversal to the entry tagged `state_id`.
	HistoryPop {
		/// State id of the entry being restored.
		state_id: u64,
	},
}

impl Trigger {
	/// Whether committing adds a history entry.
	pub fn pushes_history(self) -> bool {
		!matches!(self, Self::HistoryPop { .. })
	}

	/// State id whose scroll offset should be restored.
	pub fn restore_id(self) -> Option<u64> {
		match self {
			Self::HistoryPop { state_id } => Some(state_id),
			_ => None,
		}
	}
}

/// A request to navigate. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
	url: Url,
	trigger: Trigger,
	referrer: Option<Url>,
}

impl NavigationRequest {
	/// Creates a request for `url`.
	pub fn new(url: Url, trigger: Trigger) -> Self {
		Self {
			url,
			trigger,
			referrer: None,
		}
	}

	/// Creates a link-click request.
	pub fn link_click(url: Url) -> Self {
		Self::new(url, Trigger::LinkClick)
	}

	/// Creates a programmatic request.
	pub fn programmatic(url: Url) -> Self {
		Self::new(url, Trigger::Programmatic)
	}

	/// Creates a history-pop request.
	pub fn history_pop(url: Url, state_id: u64) -> Self {
		Self::new(url, Trigger::HistoryPop { state_id })
	}

	/// Sets the page the navigation started from.
	pub fn with_referrer(mut self, referrer: Url) -> Self {
		self.referrer = Some(referrer);
		self
	}

	/// Target URL including query and fragment.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// What started the navigation.
	pub fn trigger(&self) -> Trigger {
		self.trigger
	}

	/// The page the navigation started from.
	pub fn referrer(&self) -> Option<&Url> {
		self.referrer.as_ref()
	}
}
