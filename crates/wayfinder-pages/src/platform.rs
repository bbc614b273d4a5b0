//! Window-level platform services: location, history and scrolling.
//!
//! [`MemoryPlatform`] keeps a session history stack in memory and records
//! every history operation and full page load, which is how native hosts
//! and tests observe navigation.

#[cfg(target_arch = "wasm32")]
pub mod browser;

use std::cell::{Cell, RefCell};

use url::Url;

/// Scroll offset of the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
	/// Horizontal offset in pixels.
	pub x: f64,
	/// Vertical offset in pixels.
	pub y: f64,
}

impl ScrollPosition {
	/// The top-left corner.
	pub const TOP: Self = Self { x: 0.0, y: 0.0 };

	/// Creates a position.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Browser window services used by the navigator.
pub trait Platform {
	/// Returns the current address.
	fn location(&self) -> Result<Url, url::ParseError>;

	/// Adds a history entry for `url` tagged with `state_id`.
	fn push_state(&self, state_id: u64, url: &Url);

	/// Replaces the current history entry.
	fn replace_state(&self, state_id: u64, url: &Url);

	/// Performs a full page load of `url`.
	fn assign(&self, url: &Url);

	/// Returns the current scroll offset.
	fn scroll_position(&self) -> ScrollPosition;

	/// Scrolls the window.
	fn scroll_to(&self, position: ScrollPosition);
}

/// A recorded history operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOp {
	/// `pushState`.
	Push {
		/// State id stored with the entry.
		state_id: u64,
		/// Entry URL.
		url: Url,
	},
	/// `replaceState`.
	Replace {
		/// State id stored with the entry.
		state_id: u64,
		/// Entry URL.
		url: Url,
	},
}

#[derive(Debug, Clone)]
struct Entry {
	state_id: Option<u64>,
	url: Url,
}

/// In-memory session history and window.
#[derive(Debug)]
pub struct MemoryPlatform {
	entries: RefCell<Vec<Entry>>,
	index: Cell<usize>,
	operations: RefCell<Vec<HistoryOp>>,
	full_loads: RefCell<Vec<Url>>,
	scroll: Cell<ScrollPosition>,
}

impl MemoryPlatform {
	/// Creates a window whose only history entry is `url`.
	pub fn new(url: Url) -> Self {
		Self {
			entries: RefCell::new(vec![Entry {
				state_id: None,
				url,
			}]),
			index: Cell::new(0),
			operations: RefCell::new(Vec::new()),
			full_loads: RefCell::new(Vec::new()),
			scroll: Cell::new(ScrollPosition::TOP),
		}
	}

	/// Returns the recorded history operations.
	pub fn operations(&self) -> Vec<HistoryOp> {
		self.operations.borrow().clone()
	}

	/// Returns the number of recorded `pushState` calls.
	pub fn push_count(&self) -> usize {
		self.operations
			.borrow()
			.iter()
			.filter(|op| matches!(op, HistoryOp::Push { .. }))
			.count()
	}

	/// Returns the URLs handed to [`Platform::assign`].
	pub fn full_loads(&self) -> Vec<Url> {
		self.full_loads.borrow().clone()
	}

	/// Returns the number of session history entries.
	pub fn history_len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Moves back one entry, returning what a `popstate` event would carry.
	pub fn back(&self) -> Option<(Option<u64>, Url)> {
		let index = self.index.get().checked_sub(1)?;
		self.go_to(index)
	}

	/// Moves forward one entry, returning what a `popstate` event would carry.
	pub fn forward(&self) -> Option<(Option<u64>, Url)> {
		let index = self.index.get() + 1;
		self.go_to(index)
	}

	fn go_to(&self, index: usize) -> Option<(Option<u64>, Url)> {
		let entry = self.entries.borrow().get(index).cloned()?;
		self.index.set(index);
		Some((entry.state_id, entry.url))
	}
}

impl Platform for MemoryPlatform {
	fn location(&self) -> Result<Url, url::ParseError> {
		Ok(self.entries.borrow()[self.index.get()].url.clone())
	}

	fn push_state(&self, state_id: u64, url: &Url) {
		let mut entries = self.entries.borrow_mut();
		// Pushing discards forward entries
		entries.truncate(self.index.get() + 1);
		entries.push(Entry {
			state_id: Some(state_id),
			url: url.clone(),
		});
		self.index.set(entries.len() - 1);
		self.operations.borrow_mut().push(HistoryOp::Push {
			state_id,
			url: url.clone(),
		});
	}

	fn replace_state(&self, state_id: u64, url: &Url) {
		self.entries.borrow_mut()[self.index.get()] = Entry {
			state_id: Some(state_id),
			url: url.clone(),
		};
		self.operations.borrow_mut().push(HistoryOp::Replace {
			state_id,
			url: url.clone(),
		});
	}

	fn assign(&self, url: &Url) {
		self.full_loads.borrow_mut().push(url.clone());
	}

	fn scroll_position(&self) -> ScrollPosition {
		self.scroll.get()
	}

	fn scroll_to(&self, position: ScrollPosition) {
		self.scroll.set(position);
	}
}
