//! Hydration of server markup and mounting of later pages.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::{HydrationError, HydrationRecord};
use crate::component::{EventHandler, FlatNode, View, flatten_views};
use crate::dom::{Dom, ListenerId, build_nodes};

/// Owns the page mounted inside the root container.
///
/// The first page is hydrated in place; every later page replaces the
/// container's children. Listeners registered for a page are removed when
/// the next page mounts, so only the surviving page's listeners remain.
pub struct Reconciler<D: Dom> {
	dom: Rc<D>,
	root: D::Node,
	listeners: RefCell<Vec<ListenerId>>,
	hydrated: Cell<bool>,
}

impl<D: Dom> fmt::Debug for Reconciler<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reconciler")
			.field("root", &self.root)
			.field("listeners", &self.listeners.borrow().len())
			.field("hydrated", &self.hydrated.get())
			.finish()
	}
}

impl<D: Dom> Reconciler<D> {
	/// Creates a reconciler for an existing root node.
	pub fn new(dom: Rc<D>, root: D::Node) -> Self {
		Self {
			dom,
			root,
			listeners: RefCell::new(Vec::new()),
			hydrated: Cell::new(false),
		}
	}

	/// Creates a reconciler for the element with id `root_id`.
	pub fn locate(dom: Rc<D>, root_id: &str) -> Result<Self, HydrationError> {
		let root = dom
			.element_by_id(root_id)
			.ok_or_else(|| HydrationError::RootNotFound(root_id.to_string()))?;
		Ok(Self::new(dom, root))
	}

	/// Returns the root container.
	pub fn root(&self) -> &D::Node {
		&self.root
	}

	/// Returns the document.
	pub fn dom(&self) -> &Rc<D> {
		&self.dom
	}

	/// Returns whether the current page was hydrated (not built fresh).
	pub fn is_hydrated(&self) -> bool {
		self.hydrated.get()
	}

	/// Returns the number of listeners owned by the mounted page.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	/// Adopts the server-rendered children of the root for `view`.
	///
	/// No node is created. Tag names, child counts and text must agree with
	/// the view. On a mismatch every listener attached so far is removed and
	/// the DOM is left untouched.
	pub fn hydrate(&self, view: &View) -> Result<HydrationRecord<D::Node>, HydrationError> {
		self.unmount();

		let mut record = HydrationRecord::new();
		if let Err(error) =
			self.hydrate_children(&self.root, std::slice::from_ref(view), "", &mut record)
		{
			for id in record.listeners() {
				self.dom.remove_listener(*id);
			}
			return Err(error);
		}

		debug!(
			nodes = record.len(),
			listeners = record.listeners().len(),
			"hydrated server markup"
		);
		*self.listeners.borrow_mut() = record.listeners().to_vec();
		self.hydrated.set(true);
		Ok(record)
	}

	fn hydrate_children(
		&self,
		parent: &D::Node,
		views: &[View],
		path: &str,
		record: &mut HydrationRecord<D::Node>,
	) -> Result<(), HydrationError> {
		let expected: Vec<FlatNode<'_>> = flatten_views(views)
			.into_iter()
			.filter(|node| !matches!(node, FlatNode::Text(text) if text.trim().is_empty()))
			.collect();
		let actual: Vec<D::Node> = self
			.dom
			.child_nodes(parent)
			.into_iter()
			.filter(|node| !self.is_blank_text(node))
			.collect();

		if expected.len() != actual.len() {
			return Err(HydrationError::StructureMismatch {
				path: display_path(path),
				expected: format!("{} child nodes", expected.len()),
				actual: format!("{} child nodes", actual.len()),
			});
		}

		for (index, (flat, node)) in expected.iter().zip(&actual).enumerate() {
			let key = child_key(path, index);
			let tag = self.dom.tag_name(node);
			match flat {
				FlatNode::Element(element) => {
					if tag.as_deref() != Some(element.tag_name()) {
						return Err(HydrationError::StructureMismatch {
							path: key,
							expected: format!("<{}>", element.tag_name()),
							actual: describe(tag),
						});
					}
					for (event, handler) in element.event_handlers() {
						let id = self
							.dom
							.add_listener(node, event, EventHandler::clone(handler))?;
						record.push_listener(id);
					}
					record.insert(key.clone(), node.clone());
					self.hydrate_children(node, element.child_views(), &key, record)?;
				}
				FlatNode::Text(text) => {
					if tag.is_some() {
						return Err(HydrationError::StructureMismatch {
							path: key,
							expected: "#text".to_string(),
							actual: describe(tag),
						});
					}
					// Server text is never patched in place
					let actual = self.dom.text_content(node);
					if actual != *text {
						return Err(HydrationError::StructureMismatch {
							path: key,
							expected: format!("{text:?}"),
							actual: format!("{actual:?}"),
						});
					}
					record.insert(key, node.clone());
				}
			}
		}
		Ok(())
	}

	fn is_blank_text(&self, node: &D::Node) -> bool {
		self.dom.tag_name(node).is_none() && self.dom.text_content(node).trim().is_empty()
	}

	/// Replaces the mounted page with freshly built nodes for `view`.
	pub fn mount(&self, view: &View) -> Result<(), HydrationError> {
		self.unmount();
		self.dom.clear_children(&self.root);

		let mut listeners = Vec::new();
		let result = build_nodes(
			self.dom.as_ref(),
			&self.root,
			std::slice::from_ref(view),
			Some(&mut listeners),
		);
		// Keep ids even on failure so a later unmount still removes them
		*self.listeners.borrow_mut() = listeners;
		self.hydrated.set(false);
		result.map_err(HydrationError::from)
	}

	/// Removes every listener registered by the mounted page.
	pub fn unmount(&self) {
		let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
		for id in listeners {
			self.dom.remove_listener(id);
		}
	}
}

fn child_key(path: &str, index: usize) -> String {
	if path.is_empty() {
		index.to_string()
	} else {
		format!("{path}.{index}")
	}
}

fn display_path(path: &str) -> String {
	if path.is_empty() {
		"root".to_string()
	} else {
		path.to_string()
	}
}

fn describe(tag: Option<String>) -> String {
	match tag {
		Some(tag) => format!("<{tag}>"),
		None => "#text".to_string(),
	}
}
