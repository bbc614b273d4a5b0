//! Scroll position bookkeeping.

use std::borrow::Cow;
use std::collections::HashMap;

use url::Url;

use crate::dom::Dom;
use crate::platform::ScrollPosition;

/// Records scroll offsets per history entry and decides where to scroll
/// after a page mounts.
///
/// Targets are computed once the new page is mounted: a fragment whose
/// element appears later (for example after an asynchronous render) is not
/// chased.
#[derive(Debug, Clone)]
pub struct ScrollManager {
	positions: HashMap<u64, ScrollPosition>,
	restoration: bool,
}

impl ScrollManager {
	/// Creates a manager; `restoration` enables restoring on history pops.
	pub fn new(restoration: bool) -> Self {
		Self {
			positions: HashMap::new(),
			restoration,
		}
	}

	/// Remembers the offset of the entry being left.
	pub fn record(&mut self, state_id: u64, position: ScrollPosition) {
		self.positions.insert(state_id, position);
	}

	/// Returns the recorded offset for an entry.
	pub fn recorded(&self, state_id: u64) -> Option<ScrollPosition> {
		self.positions.get(&state_id).copied()
	}

	/// Computes the post-mount scroll target.
	///
	/// A history pop restores the recorded offset for `restore_id` when
	/// restoration is enabled. Otherwise a fragment scrolls to the element
	/// with that id, and everything else goes to the top.
	pub fn target<D: Dom>(&self, dom: &D, url: &Url, restore_id: Option<u64>) -> ScrollPosition {
		if self.restoration {
			if let Some(position) = restore_id.and_then(|id| self.recorded(id)) {
				return position;
			}
		}
		anchor_position(dom, url).unwrap_or(ScrollPosition::TOP)
	}
}

/// Returns the offset of the element named by the URL fragment.
pub fn anchor_position<D: Dom>(dom: &D, url: &Url) -> Option<ScrollPosition> {
	let fragment = url.fragment().filter(|fragment| !fragment.is_empty())?;
	let id = urlencoding::decode(fragment).unwrap_or(Cow::Borrowed(fragment));
	let element = dom.element_by_id(&id)?;
	Some(ScrollPosition::new(0.0, dom.offset_top(&element)))
}
