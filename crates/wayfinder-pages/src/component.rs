//! View model and page components.
//!
//! Pages render to a [`View`] tree: elements, text, fragments. The same tree
//! is serialized to HTML on the server, walked against server markup during
//! hydration, and built into fresh DOM nodes on later navigations.
//!
//! ## Usage
//!
//! ```ignore
//! use wayfinder_pages::component::{ElementView, View};
//! use wayfinder_pages::preload::Props;
//!
//! fn about(_props: &Props) -> View {
//!     ElementView::new("div")
//!         .child(ElementView::new("h1").child("About"))
//!         .child(ElementView::new("p").child("This is the 'about' page."))
//!         .into()
//! }
//!
//! let html = about(&Props::new()).render_to_string();
//! ```

use std::fmt;
use std::rc::Rc;

use crate::preload::{PageError, Props};

/// Handler attached to an element event.
pub type EventHandler = Rc<dyn Fn()>;

/// A unified representation of renderable content.
#[derive(Debug, Clone)]
pub enum View {
	/// A DOM element.
	Element(ElementView),
	/// A text node.
	Text(String),
	/// Multiple views without a wrapper element.
	Fragment(Vec<View>),
	/// Renders nothing.
	Empty,
}

/// Represents a DOM element in the view tree.
#[derive(Clone)]
pub struct ElementView {
	tag: String,
	attrs: Vec<(String, String)>,
	children: Vec<View>,
	handlers: Vec<(String, EventHandler)>,
}

impl fmt::Debug for ElementView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ElementView")
			.field("tag", &self.tag)
			.field("attrs", &self.attrs)
			.field("children", &self.children)
			.field("handlers_count", &self.handlers.len())
			.finish()
	}
}

impl ElementView {
	/// Creates a new element view.
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into().to_ascii_lowercase(),
			attrs: Vec::new(),
			children: Vec::new(),
			handlers: Vec::new(),
		}
	}

	/// Adds an attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Adds a child view.
	pub fn child(mut self, child: impl IntoView) -> Self {
		self.children.push(child.into_view());
		self
	}

	/// Adds multiple child views.
	pub fn children(mut self, children: impl IntoIterator<Item = impl IntoView>) -> Self {
		self.children
			.extend(children.into_iter().map(IntoView::into_view));
		self
	}

	/// Attaches an event handler.
	pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.handlers.push((event.into(), Rc::new(handler)));
		self
	}

	/// Returns the lowercase tag name.
	pub fn tag_name(&self) -> &str {
		&self.tag
	}

	/// Returns the attributes in declaration order.
	pub fn attrs(&self) -> &[(String, String)] {
		&self.attrs
	}

	/// Returns the value of an attribute.
	pub fn get_attr(&self, name: &str) -> Option<&str> {
		self.attrs
			.iter()
			.find(|(attr, _)| attr == name)
			.map(|(_, value)| value.as_str())
	}

	/// Returns the child views.
	pub fn child_views(&self) -> &[View] {
		&self.children
	}

	/// Returns the event handlers.
	pub fn event_handlers(&self) -> &[(String, EventHandler)] {
		&self.handlers
	}

	/// Whether this is a void element (no closing tag).
	pub fn is_void(&self) -> bool {
		matches!(
			self.tag.as_str(),
			"area"
				| "base" | "br"
				| "col" | "embed"
				| "hr" | "img"
				| "input" | "link"
				| "meta" | "source"
				| "track" | "wbr"
		)
	}
}

impl View {
	/// Creates a new element view.
	pub fn element(tag: impl Into<String>) -> ElementView {
		ElementView::new(tag)
	}

	/// Creates a text view.
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text(content.into())
	}

	/// Creates a fragment view.
	pub fn fragment(children: impl IntoIterator<Item = impl IntoView>) -> Self {
		Self::Fragment(children.into_iter().map(IntoView::into_view).collect())
	}

	/// Creates an empty view.
	pub fn empty() -> Self {
		Self::Empty
	}

	/// Renders the view to an HTML string.
	pub fn render_to_string(&self) -> String {
		let mut output = String::new();
		self.render_to_string_inner(&mut output);
		output
	}

	fn render_to_string_inner(&self, output: &mut String) {
		match self {
			View::Element(el) => {
				output.push('<');
				output.push_str(el.tag_name());
				for (name, value) in el.attrs() {
					output.push(' ');
					output.push_str(name);
					output.push_str("=\"");
					output.push_str(&html_escape(value));
					output.push('"');
				}

				if el.is_void() {
					output.push_str(" />");
				} else {
					output.push('>');
					for child in el.child_views() {
						child.render_to_string_inner(output);
					}
					output.push_str("</");
					output.push_str(el.tag_name());
					output.push('>');
				}
			}
			View::Text(text) => output.push_str(&html_escape(text)),
			View::Fragment(children) => {
				for child in children {
					child.render_to_string_inner(output);
				}
			}
			View::Empty => {}
		}
	}

	/// Returns the concatenated text of this view and its descendants.
	pub fn text_content(&self) -> String {
		match self {
			View::Element(el) => el.child_views().iter().map(View::text_content).collect(),
			View::Text(text) => text.clone(),
			View::Fragment(children) => children.iter().map(View::text_content).collect(),
			View::Empty => String::new(),
		}
	}
}

/// Escapes HTML special characters.
pub(crate) fn html_escape(input: &str) -> String {
	input
		.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}

/// A node as it appears in the DOM once the view is rendered.
///
/// Fragments are inlined, empty views disappear, and adjacent text merges
/// into one text node, matching what an HTML parser produces from
/// [`View::render_to_string`].
#[derive(Debug)]
pub(crate) enum FlatNode<'a> {
	Element(&'a ElementView),
	Text(String),
}

/// Flattens sibling views into their DOM-level node sequence.
pub(crate) fn flatten_views(views: &[View]) -> Vec<FlatNode<'_>> {
	fn walk<'a>(view: &'a View, out: &mut Vec<FlatNode<'a>>) {
		match view {
			View::Element(el) => out.push(FlatNode::Element(el)),
			View::Text(text) if text.is_empty() => {}
			View::Text(text) => match out.last_mut() {
				Some(FlatNode::Text(previous)) => previous.push_str(text),
				_ => out.push(FlatNode::Text(text.clone())),
			},
			View::Fragment(children) => {
				for child in children {
					walk(child, out);
				}
			}
			View::Empty => {}
		}
	}

	let mut out = Vec::new();
	for view in views {
		walk(view, &mut out);
	}
	out
}

/// Trait for types that can be converted into a View.
pub trait IntoView {
	/// Converts self into a View.
	fn into_view(self) -> View;
}

impl IntoView for View {
	fn into_view(self) -> View {
		self
	}
}

impl IntoView for ElementView {
	fn into_view(self) -> View {
		View::Element(self)
	}
}

impl IntoView for String {
	fn into_view(self) -> View {
		View::Text(self)
	}
}

impl IntoView for &String {
	fn into_view(self) -> View {
		View::Text(self.clone())
	}
}

impl IntoView for &str {
	fn into_view(self) -> View {
		View::Text(self.to_string())
	}
}

impl<T: IntoView> IntoView for Option<T> {
	fn into_view(self) -> View {
		match self {
			Some(view) => view.into_view(),
			None => View::Empty,
		}
	}
}

impl<T: IntoView> IntoView for Vec<T> {
	fn into_view(self) -> View {
		View::fragment(self)
	}
}

impl IntoView for () {
	fn into_view(self) -> View {
		View::Empty
	}
}

impl From<ElementView> for View {
	fn from(element: ElementView) -> Self {
		View::Element(element)
	}
}

/// A page rendered from preloaded props.
///
/// Implemented for any `Fn(&Props) -> View`.
pub trait PageComponent {
	/// Renders the page.
	fn render(&self, props: &Props) -> View;
}

impl<F> PageComponent for F
where
	F: Fn(&Props) -> View,
{
	fn render(&self, props: &Props) -> View {
		self(props)
	}
}

/// The page shown when preload fails.
///
/// Implemented for any `Fn(&PageError) -> View`.
pub trait ErrorComponent {
	/// Renders the error page.
	fn render(&self, error: &PageError) -> View;
}

impl<F> ErrorComponent for F
where
	F: Fn(&PageError) -> View,
{
	fn render(&self, error: &PageError) -> View {
		self(error)
	}
}

/// Error page used when the application registers none.
///
/// Client errors get a "Not found" heading, everything else
/// "Internal server error"; the message follows in a paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorPage;

impl ErrorComponent for DefaultErrorPage {
	fn render(&self, error: &PageError) -> View {
		let heading = if error.is_client_error() {
			"Not found"
		} else {
			"Internal server error"
		};
		View::fragment([
			ElementView::new("h1").child(heading),
			ElementView::new("p").child(error.message.as_str()),
		])
	}
}
