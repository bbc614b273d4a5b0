//! DOM abstraction.
//!
//! The engine touches the document only through [`Dom`]. Browser builds use
//! `platform::browser::BrowserDom`; native hosts and tests use
//! [`MemoryDom`], an arena-backed document with synchronous event dispatch.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::component::{EventHandler, FlatNode, View, flatten_views};

/// Error raised by DOM mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DomError {
	/// The host rejected an operation.
	#[error("DOM operation '{operation}' failed: {message}")]
	Operation {
		/// Operation name.
		operation: &'static str,
		/// Host message.
		message: String,
	},
	/// The node is not an element.
	#[error("node is not an element")]
	NotAnElement,
}

/// Identifier of a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Minimal document interface used by hydration, mounting and scrolling.
pub trait Dom {
	/// Node handle. Equality is node identity.
	type Node: Clone + PartialEq + fmt::Debug;

	/// Looks up an element by its `id` attribute.
	fn element_by_id(&self, id: &str) -> Option<Self::Node>;

	/// Returns all child nodes (elements and text) in order.
	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

	/// Returns the lowercase tag name, or `None` for text nodes.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;

	/// Returns an attribute value.
	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

	/// Returns the concatenated text of the node and its descendants.
	fn text_content(&self, node: &Self::Node) -> String;

	/// Creates a detached element.
	fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

	/// Creates a detached text node.
	fn create_text(&self, text: &str) -> Self::Node;

	/// Sets an attribute on an element.
	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

	/// Appends `child` to `parent`.
	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

	/// Removes every child of `node`.
	fn clear_children(&self, node: &Self::Node);

	/// Registers an event listener.
	fn add_listener(
		&self,
		node: &Self::Node,
		event: &str,
		handler: EventHandler,
	) -> Result<ListenerId, DomError>;

	/// Removes a previously registered listener. Unknown ids are ignored.
	fn remove_listener(&self, id: ListenerId);

	/// Returns the vertical document offset of the node in pixels.
	fn offset_top(&self, node: &Self::Node) -> f64;
}

/// Inserts the nodes an HTML parser would produce for `view` under `parent`.
///
/// No listeners are attached; this reproduces server-rendered markup.
pub fn append_markup<D: Dom>(dom: &D, parent: &D::Node, view: &View) -> Result<(), DomError> {
	build_nodes(dom, parent, std::slice::from_ref(view), None)
}

/// Builds fresh nodes for `views` under `parent`.
///
/// When `listeners` is given, element handlers are registered and their ids
/// collected there.
pub(crate) fn build_nodes<D: Dom>(
	dom: &D,
	parent: &D::Node,
	views: &[View],
	mut listeners: Option<&mut Vec<ListenerId>>,
) -> Result<(), DomError> {
	for node in flatten_views(views) {
		match node {
			FlatNode::Element(element) => {
				let created = dom.create_element(element.tag_name())?;
				for (name, value) in element.attrs() {
					dom.set_attribute(&created, name, value)?;
				}
				if let Some(ids) = listeners.as_deref_mut() {
					for (event, handler) in element.event_handlers() {
						ids.push(dom.add_listener(&created, event, EventHandler::clone(handler))?);
					}
				}
				build_nodes(dom, &created, element.child_views(), listeners.as_deref_mut())?;
				dom.append_child(parent, &created)?;
			}
			FlatNode::Text(text) => {
				let created = dom.create_text(&text);
				dom.append_child(parent, &created)?;
			}
		}
	}
	Ok(())
}

/// Handle to a node inside a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
	Element {
		tag: String,
		attrs: Vec<(String, String)>,
	},
	Text(String),
}

#[derive(Debug)]
struct NodeData {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

struct Listener {
	node: NodeId,
	event: String,
	handler: EventHandler,
}

/// Arena-backed in-memory document.
///
/// The document starts with a single `body` element. Vertical offsets are
/// the node's document-order position times [`MemoryDom::LINE_HEIGHT`].
pub struct MemoryDom {
	nodes: RefCell<Vec<NodeData>>,
	listeners: RefCell<BTreeMap<ListenerId, Listener>>,
	next_listener: Cell<u64>,
}

impl fmt::Debug for MemoryDom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDom")
			.field("nodes", &self.nodes.borrow().len())
			.field("listeners", &self.listeners.borrow().len())
			.finish()
	}
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	/// Height in pixels of each node in document order.
	pub const LINE_HEIGHT: f64 = 24.0;

	/// Creates a document containing an empty `body`.
	pub fn new() -> Self {
		let body = NodeData {
			kind: NodeKind::Element {
				tag: "body".to_string(),
				attrs: Vec::new(),
			},
			parent: None,
			children: Vec::new(),
		};
		Self {
			nodes: RefCell::new(vec![body]),
			listeners: RefCell::new(BTreeMap::new()),
			next_listener: Cell::new(1),
		}
	}

	/// Creates a document whose body contains `<div id="{root_id}">`.
	pub fn with_root(root_id: &str) -> Self {
		let dom = Self::new();
		let root = dom.push_node(NodeKind::Element {
			tag: "div".to_string(),
			attrs: vec![("id".to_string(), root_id.to_string())],
		});
		dom.link(dom.body(), root);
		dom
	}

	/// Returns the `body` element.
	pub fn body(&self) -> NodeId {
		NodeId(0)
	}

	fn push_node(&self, kind: NodeKind) -> NodeId {
		let mut nodes = self.nodes.borrow_mut();
		nodes.push(NodeData {
			kind,
			parent: None,
			children: Vec::new(),
		});
		NodeId(nodes.len() - 1)
	}

	fn link(&self, parent: NodeId, child: NodeId) {
		let mut nodes = self.nodes.borrow_mut();
		if let Some(previous) = nodes[child.0].parent.take() {
			nodes[previous.0].children.retain(|id| *id != child);
		}
		nodes[child.0].parent = Some(parent);
		nodes[parent.0].children.push(child);
	}

	/// Returns nodes reachable from `body` in document order.
	fn document_order(&self) -> Vec<NodeId> {
		let nodes = self.nodes.borrow();
		let mut order = Vec::new();
		let mut stack = vec![self.body()];
		while let Some(id) = stack.pop() {
			order.push(id);
			stack.extend(nodes[id.0].children.iter().rev().copied());
		}
		order
	}

	/// Returns the first attached element with the given tag.
	pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
		self.all_by_tag(tag).into_iter().next()
	}

	/// Returns all attached elements with the given tag, in document order.
	pub fn all_by_tag(&self, tag: &str) -> Vec<NodeId> {
		let order = self.document_order();
		let nodes = self.nodes.borrow();
		order
			.into_iter()
			.filter(|id| matches!(&nodes[id.0].kind, NodeKind::Element { tag: t, .. } if t == tag))
			.collect()
	}

	/// Returns the first attached element whose attribute equals `value`.
	pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
		let order = self.document_order();
		let nodes = self.nodes.borrow();
		order.into_iter().find(|id| match &nodes[id.0].kind {
			NodeKind::Element { attrs, .. } => attrs.iter().any(|(n, v)| n == name && v == value),
			NodeKind::Text(_) => false,
		})
	}

	/// Returns the text of the first attached element with the given tag.
	pub fn text_of(&self, tag: &str) -> Option<String> {
		self.first_by_tag(tag).map(|id| self.text_content(&id))
	}

	/// Invokes every listener registered for `event` on `node`.
	///
	/// Returns the number of handlers called.
	pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
		let handlers: Vec<EventHandler> = self
			.listeners
			.borrow()
			.values()
			.filter(|listener| listener.node == node && listener.event == event)
			.map(|listener| EventHandler::clone(&listener.handler))
			.collect();
		// Handlers run without any borrow held so they may touch the document
		for handler in &handlers {
			handler();
		}
		handlers.len()
	}

	/// Returns the number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	/// Returns the number of nodes ever created.
	pub fn created_count(&self) -> usize {
		self.nodes.borrow().len()
	}

	/// Serializes the children of `node` back to HTML.
	pub fn inner_html(&self, node: NodeId) -> String {
		let nodes = self.nodes.borrow();
		let mut output = String::new();
		for child in &nodes[node.0].children {
			Self::write_html(&nodes, *child, &mut output);
		}
		output
	}

	fn write_html(nodes: &[NodeData], id: NodeId, output: &mut String) {
		match &nodes[id.0].kind {
			NodeKind::Element { tag, attrs } => {
				output.push('<');
				output.push_str(tag);
				for (name, value) in attrs {
					output.push_str(&format!(
						" {}=\"{}\"",
						name,
						crate::component::html_escape(value)
					));
				}
				output.push('>');
				for child in &nodes[id.0].children {
					Self::write_html(nodes, *child, output);
				}
				output.push_str(&format!("</{tag}>"));
			}
			NodeKind::Text(text) => output.push_str(&crate::component::html_escape(text)),
		}
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;

	fn element_by_id(&self, id: &str) -> Option<NodeId> {
		self.find_by_attribute("id", id)
	}

	fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
		self.nodes.borrow()[node.0].children.clone()
	}

	fn tag_name(&self, node: &NodeId) -> Option<String> {
		match &self.nodes.borrow()[node.0].kind {
			NodeKind::Element { tag, .. } => Some(tag.clone()),
			NodeKind::Text(_) => None,
		}
	}

	fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		match &self.nodes.borrow()[node.0].kind {
			NodeKind::Element { attrs, .. } => attrs
				.iter()
				.find(|(attr, _)| attr == name)
				.map(|(_, value)| value.clone()),
			NodeKind::Text(_) => None,
		}
	}

	fn text_content(&self, node: &NodeId) -> String {
		let nodes = self.nodes.borrow();
		let mut text = String::new();
		let mut stack = vec![*node];
		while let Some(id) = stack.pop() {
			match &nodes[id.0].kind {
				NodeKind::Text(content) => text.push_str(content),
				NodeKind::Element { .. } => {
					stack.extend(nodes[id.0].children.iter().rev().copied())
				}
			}
		}
		text
	}

	fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
		if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
			return Err(DomError::Operation {
				operation: "create_element",
				message: format!("invalid tag name '{tag}'"),
			});
		}
		Ok(self.push_node(NodeKind::Element {
			tag: tag.to_ascii_lowercase(),
			attrs: Vec::new(),
		}))
	}

	fn create_text(&self, text: &str) -> NodeId {
		self.push_node(NodeKind::Text(text.to_string()))
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
		match &mut self.nodes.borrow_mut()[node.0].kind {
			NodeKind::Element { attrs, .. } => {
				match attrs.iter_mut().find(|(attr, _)| attr == name) {
					Some((_, existing)) => *existing = value.to_string(),
					None => attrs.push((name.to_string(), value.to_string())),
				}
				Ok(())
			}
			NodeKind::Text(_) => Err(DomError::NotAnElement),
		}
	}

	fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
		if self.tag_name(parent).is_none() {
			return Err(DomError::NotAnElement);
		}
		self.link(*parent, *child);
		Ok(())
	}

	fn clear_children(&self, node: &NodeId) {
		let mut nodes = self.nodes.borrow_mut();
		let children = std::mem::take(&mut nodes[node.0].children);
		for child in children {
			nodes[child.0].parent = None;
		}
	}

	fn add_listener(
		&self,
		node: &NodeId,
		event: &str,
		handler: EventHandler,
	) -> Result<ListenerId, DomError> {
		let id = ListenerId(self.next_listener.get());
		self.next_listener.set(id.0 + 1);
		self.listeners.borrow_mut().insert(
			id,
			Listener {
				node: *node,
				event: event.to_string(),
				handler,
			},
		);
		Ok(id)
	}

	fn remove_listener(&self, id: ListenerId) {
		self.listeners.borrow_mut().remove(&id);
	}

	fn offset_top(&self, node: &NodeId) -> f64 {
		self.document_order()
			.iter()
			.position(|id| id == node)
			.map(|index| index as f64 * Self::LINE_HEIGHT)
			.unwrap_or(0.0)
	}
}
