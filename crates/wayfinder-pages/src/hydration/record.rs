//! Record of the server-rendered nodes reused by hydration.

use crate::dom::ListenerId;

/// Identity mapping from view positions to reused DOM nodes.
///
/// Keys are dotted child indexes relative to the root container: `0` is
/// the first top-level node, `0.2` its third child, and so on.
#[derive(Debug, Clone)]
pub struct HydrationRecord<N> {
	nodes: Vec<(String, N)>,
	listeners: Vec<ListenerId>,
}

impl<N> Default for HydrationRecord<N> {
	fn default() -> Self {
		Self {
			nodes: Vec::new(),
			listeners: Vec::new(),
		}
	}
}

impl<N> HydrationRecord<N> {
	/// Creates an empty record.
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn insert(&mut self, key: String, node: N) {
		self.nodes.push((key, node));
	}

	pub(crate) fn push_listener(&mut self, id: ListenerId) {
		self.listeners.push(id);
	}

	/// Returns the node reused for `key`.
	pub fn get(&self, key: &str) -> Option<&N> {
		self.nodes
			.iter()
			.find(|(existing, _)| existing == key)
			.map(|(_, node)| node)
	}

	/// Iterates over reused nodes in document order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &N)> {
		self.nodes.iter().map(|(key, node)| (key.as_str(), node))
	}

	/// Returns the number of reused nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Returns whether no node was reused.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Returns the listeners attached during hydration.
	pub fn listeners(&self) -> &[ListenerId] {
		&self.listeners
	}
}
