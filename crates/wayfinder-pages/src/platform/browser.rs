//! Browser implementations of the platform seams.
//!
//! [`start`] is the usual entry point of a `wasm32` client: it launches the
//! client over the live document and installs the document-level click,
//! hover and `popstate` listeners.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::error;
use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;

use super::{Platform, ScrollPosition};
use crate::component::EventHandler;
use crate::dom::{Dom, DomError, ListenerId};
use crate::error::{NavigationError, NavigationResult};
use crate::fetch::HttpFetch;
use crate::hydration::HydrationError;
use crate::launcher::{Client, ClientLauncher};
use crate::link::{Anchor, LinkDecision};
use crate::navigation::{NavigationRequest, Navigator};
use crate::router::RouteTable;
use crate::settings::NavigatorSettings;

/// Navigator over the live browser document.
pub type BrowserNavigator = Navigator<BrowserDom, BrowserPlatform>;

type Listener = (web_sys::Node, String, Closure<dyn FnMut(web_sys::Event)>);

fn js_error(operation: &'static str) -> impl Fn(JsValue) -> DomError {
	move |value| DomError::Operation {
		operation,
		message: format!("{value:?}"),
	}
}

fn window() -> Result<web_sys::Window, DomError> {
	web_sys::window().ok_or(DomError::Operation {
		operation: "window",
		message: "no global window".to_string(),
	})
}

/// The live document.
pub struct BrowserDom {
	document: web_sys::Document,
	listeners: RefCell<HashMap<ListenerId, Listener>>,
	next_listener: Cell<u64>,
}

impl fmt::Debug for BrowserDom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BrowserDom")
			.field("listeners", &self.listeners.borrow().len())
			.finish()
	}
}

impl BrowserDom {
	/// Wraps the document of the global window.
	pub fn new() -> Result<Self, DomError> {
		let document = window()?.document().ok_or(DomError::Operation {
			operation: "document",
			message: "window has no document".to_string(),
		})?;
		Ok(Self {
			document,
			listeners: RefCell::new(HashMap::new()),
			next_listener: Cell::new(1),
		})
	}

	/// Returns the wrapped document.
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}
}

impl Dom for BrowserDom {
	type Node = web_sys::Node;

	fn element_by_id(&self, id: &str) -> Option<web_sys::Node> {
		self.document.get_element_by_id(id).map(web_sys::Node::from)
	}

	fn child_nodes(&self, node: &web_sys::Node) -> Vec<web_sys::Node> {
		let list = node.child_nodes();
		(0..list.length()).filter_map(|index| list.item(index)).collect()
	}

	fn tag_name(&self, node: &web_sys::Node) -> Option<String> {
		node.dyn_ref::<web_sys::Element>()
			.map(|element| element.tag_name().to_ascii_lowercase())
	}

	fn attribute(&self, node: &web_sys::Node, name: &str) -> Option<String> {
		node.dyn_ref::<web_sys::Element>()
			.and_then(|element| element.get_attribute(name))
	}

	fn text_content(&self, node: &web_sys::Node) -> String {
		node.text_content().unwrap_or_default()
	}

	fn create_element(&self, tag: &str) -> Result<web_sys::Node, DomError> {
		self.document
			.create_element(tag)
			.map(web_sys::Node::from)
			.map_err(js_error("create_element"))
	}

	fn create_text(&self, text: &str) -> web_sys::Node {
		self.document.create_text_node(text).into()
	}

	fn set_attribute(&self, node: &web_sys::Node, name: &str, value: &str) -> Result<(), DomError> {
		node.dyn_ref::<web_sys::Element>()
			.ok_or(DomError::NotAnElement)?
			.set_attribute(name, value)
			.map_err(js_error("set_attribute"))
	}

	fn append_child(&self, parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), DomError> {
		parent
			.append_child(child)
			.map(|_| ())
			.map_err(js_error("append_child"))
	}

	fn clear_children(&self, node: &web_sys::Node) {
		while let Some(child) = node.first_child() {
			if node.remove_child(&child).is_err() {
				break;
			}
		}
	}

	fn add_listener(
		&self,
		node: &web_sys::Node,
		event: &str,
		handler: EventHandler,
	) -> Result<ListenerId, DomError> {
		let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
			handler();
		});
		node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
			.map_err(js_error("add_event_listener"))?;

		let id = ListenerId(self.next_listener.get());
		self.next_listener.set(id.0 + 1);
		self.listeners
			.borrow_mut()
			.insert(id, (node.clone(), event.to_string(), closure));
		Ok(id)
	}

	fn remove_listener(&self, id: ListenerId) {
		let Some((node, event, closure)) = self.listeners.borrow_mut().remove(&id) else {
			return;
		};
		let _ = node.remove_event_listener_with_callback(&event, closure.as_ref().unchecked_ref());
	}

	fn offset_top(&self, node: &web_sys::Node) -> f64 {
		let Some(element) = node.dyn_ref::<web_sys::Element>() else {
			return 0.0;
		};
		let scroll_y = window()
			.ok()
			.and_then(|window| window.scroll_y().ok())
			.unwrap_or(0.0);
		element.get_bounding_client_rect().top() + scroll_y
	}
}

/// The global window: location, session history and scrolling.
#[derive(Debug, Clone)]
pub struct BrowserPlatform {
	window: web_sys::Window,
}

impl BrowserPlatform {
	/// Wraps the global window.
	pub fn new() -> Result<Self, DomError> {
		Ok(Self { window: window()? })
	}

	fn history(&self) -> Option<web_sys::History> {
		match self.window.history() {
			Ok(history) => Some(history),
			Err(value) => {
				error!(error = ?value, "history is unavailable");
				None
			}
		}
	}
}

impl Platform for BrowserPlatform {
	fn location(&self) -> Result<Url, url::ParseError> {
		let href = self.window.location().href().unwrap_or_default();
		Url::parse(&href)
	}

	fn push_state(&self, state_id: u64, url: &Url) {
		let Some(history) = self.history() else {
			return;
		};
		let state = JsValue::from_f64(state_id as f64);
		if let Err(value) = history.push_state_with_url(&state, "", Some(url.as_str())) {
			error!(error = ?value, url = %url, "pushState failed");
		}
	}

	fn replace_state(&self, state_id: u64, url: &Url) {
		let Some(history) = self.history() else {
			return;
		};
		let state = JsValue::from_f64(state_id as f64);
		if let Err(value) = history.replace_state_with_url(&state, "", Some(url.as_str())) {
			error!(error = ?value, url = %url, "replaceState failed");
		}
	}

	fn assign(&self, url: &Url) {
		if let Err(value) = self.window.location().set_href(url.as_str()) {
			error!(error = ?value, url = %url, "full page load failed");
		}
	}

	fn scroll_position(&self) -> ScrollPosition {
		ScrollPosition::new(
			self.window.scroll_x().unwrap_or(0.0),
			self.window.scroll_y().unwrap_or(0.0),
		)
	}

	fn scroll_to(&self, position: ScrollPosition) {
		self.window.scroll_to_with_x_and_y(position.x, position.y);
	}
}

/// Launches the client over the live document and installs its listeners.
pub async fn start(
	table: RouteTable,
	settings: NavigatorSettings,
) -> NavigationResult<Client<BrowserDom, BrowserPlatform>> {
	let dom = Rc::new(BrowserDom::new().map_err(dom_error)?);
	let platform = Rc::new(BrowserPlatform::new().map_err(dom_error)?);
	let fetch = Rc::new(HttpFetch::new());

	let client = ClientLauncher::new(table, dom, platform, fetch)
		.settings(settings)
		.launch()
		.await?;
	install_listeners(Rc::clone(client.navigator())).map_err(dom_error)?;
	Ok(client)
}

fn dom_error(error: DomError) -> NavigationError {
	HydrationError::from(error).into()
}

/// Routes document clicks, hovers and history traversals to `navigator`.
///
/// The listeners live for the rest of the page's lifetime.
pub fn install_listeners(navigator: Rc<BrowserNavigator>) -> Result<(), DomError> {
	let window = window()?;
	let document = navigator.reconciler().dom().document().clone();

	if navigator.settings().scroll_restoration {
		if let Ok(history) = window.history() {
			let _ = history.set_scroll_restoration(web_sys::ScrollRestoration::Manual);
		}
	}

	let on_click = {
		let navigator = Rc::clone(&navigator);
		Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |event: web_sys::MouseEvent| {
			if event.default_prevented()
				|| event.button() != 0
				|| event.meta_key()
				|| event.ctrl_key()
				|| event.shift_key()
				|| event.alt_key()
			{
				return;
			}
			let Some(anchor) = anchor_of(event.target()) else {
				return;
			};
			match navigator.intercept(&anchor) {
				LinkDecision::Native => {}
				LinkDecision::SameDocument(url) => {
					event.prevent_default();
					navigator.scroll_to_fragment(url);
				}
				LinkDecision::Intercept(url) => {
					event.prevent_default();
					let navigator = Rc::clone(&navigator);
					spawn_local(async move {
						let request =
							NavigationRequest::link_click(url).with_referrer(navigator.current_url());
						if let Err(error) = navigator.navigate(request).await {
							error!(error = %error, "navigation failed");
						}
					});
				}
			}
		})
	};
	document
		.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
		.map_err(js_error("add_event_listener"))?;
	on_click.forget();

	if navigator.settings().prefetch_on_hover {
		let on_hover = {
			let navigator = Rc::clone(&navigator);
			Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |event: web_sys::MouseEvent| {
				let Some(anchor) = anchor_of(event.target()) else {
					return;
				};
				if let Some(preload) = navigator.hover(&anchor) {
					spawn_local(async move {
						preload.await;
					});
				}
			})
		};
		document
			.add_event_listener_with_callback("mouseover", on_hover.as_ref().unchecked_ref())
			.map_err(js_error("add_event_listener"))?;
		on_hover.forget();
	}

	let on_popstate = {
		let navigator = Rc::clone(&navigator);
		Closure::<dyn FnMut(web_sys::PopStateEvent)>::new(move |event: web_sys::PopStateEvent| {
			let state_id = event.state().as_f64().map(|id| id as u64);
			let url = match navigator.platform().location() {
				Ok(url) => url,
				Err(parse_error) => {
					error!(error = %parse_error, "unreadable location after popstate");
					return;
				}
			};
			let navigator = Rc::clone(&navigator);
			spawn_local(async move {
				if let Err(error) = navigator.handle_popstate(state_id, url).await {
					error!(error = %error, "history navigation failed");
				}
			});
		})
	};
	window
		.add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref())
		.map_err(js_error("add_event_listener"))?;
	on_popstate.forget();

	Ok(())
}

fn anchor_of(target: Option<web_sys::EventTarget>) -> Option<Anchor> {
	let element = target?.dyn_into::<web_sys::Element>().ok()?;
	let anchor = element.closest("a").ok()??;
	Some(Anchor {
		href: anchor.get_attribute("href"),
		target: anchor.get_attribute("target"),
		download: anchor.has_attribute("download"),
		rel: anchor.get_attribute("rel"),
	})
}
