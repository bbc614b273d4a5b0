//! Server rendering of the initial document.
//!
//! [`render_document`] runs the same preload pipeline as client navigation
//! and produces the status, headers and body of the first response. The
//! resolved props (or error) are embedded as JSON so the client can hydrate
//! without running the preload again.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::component::{View, html_escape};
use crate::dom::{Dom, DomError, append_markup};
use crate::fetch::Fetch;
use crate::navigation::FailureKind;
use crate::preload::{PageError, PreloadExecutor, PreloadOutcome, PreloadRequest, Props, Redirect};
use crate::router::RouteTable;
use crate::settings::NavigatorSettings;

/// Id of the `<script>` element carrying the initial state.
pub const STATE_SCRIPT_ID: &str = "__wayfinder_state__";

/// Preload result handed from the server to the client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialState {
	/// Props of the rendered page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub props: Option<Props>,
	/// Error shown instead of the page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<PageError>,
}

impl InitialState {
	/// State of a successfully rendered page.
	pub fn from_props(props: Props) -> Self {
		Self {
			props: Some(props),
			error: None,
		}
	}

	/// State of a rendered error page.
	pub fn from_error(error: PageError) -> Self {
		Self {
			props: None,
			error: Some(error),
		}
	}

	/// Returns the preload outcome this state stands for.
	///
	/// An error wins over props.
	pub fn outcome(&self) -> Option<PreloadOutcome> {
		if let Some(error) = &self.error {
			return Some(PreloadOutcome::Error(error.clone()));
		}
		self.props.clone().map(PreloadOutcome::Props)
	}

	/// Serializes the state to JSON.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}

	/// Parses state serialized by [`to_json`](Self::to_json).
	pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(input)
	}

	/// Renders the `<script>` element embedding the state.
	///
	/// `<` only occurs inside JSON strings, so escaping it as `\u003c`
	/// keeps the JSON intact while preventing `</script>` breakouts.
	pub fn to_script_tag(&self) -> String {
		let json = self.to_json().unwrap_or_else(|_| "{}".to_string());
		format!(
			r#"<script type="application/json" id="{}">{}</script>"#,
			STATE_SCRIPT_ID,
			json.replace('<', "\\u003c")
		)
	}

	/// Reads the state embedded in the document, if any.
	pub fn read<D: Dom>(dom: &D) -> Option<Self> {
		let script = dom.element_by_id(STATE_SCRIPT_ID)?;
		let json = dom.text_content(&script);
		match Self::from_json(&json) {
			Ok(state) => Some(state),
			Err(error) => {
				warn!(error = %error, "ignoring malformed initial state");
				None
			}
		}
	}
}

/// An incoming document request.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
	/// Absolute request URL.
	pub url: Url,
	/// HTTP method.
	pub method: String,
	/// Host-provided values forwarded to preload.
	pub extras: Props,
}

impl DocumentRequest {
	/// Creates a `GET` request.
	pub fn new(url: Url) -> Self {
		Self {
			url,
			method: "GET".to_string(),
			extras: Props::new(),
		}
	}

	/// Sets the HTTP method.
	pub fn with_method(mut self, method: impl Into<String>) -> Self {
		self.method = method.into();
		self
	}

	/// Sets the values forwarded to preload.
	pub fn with_extras(mut self, extras: Props) -> Self {
		self.extras = extras;
		self
	}
}

/// The response to a document request.
#[derive(Debug, Clone)]
pub struct SsrResponse {
	/// HTTP status.
	pub status: u16,
	/// Response headers in emission order.
	pub headers: Vec<(String, String)>,
	/// Response body.
	pub body: String,
	page: Option<View>,
	state: Option<InitialState>,
	failure: Option<FailureKind>,
	root_id: String,
}

impl SsrResponse {
	fn redirect(redirect: Redirect) -> Self {
		Self {
			status: redirect.status,
			headers: vec![("Location".to_string(), redirect.location)],
			body: String::new(),
			page: None,
			state: None,
			failure: None,
			root_id: String::new(),
		}
	}

	/// Returns the first header named `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Returns whether this is a redirect response.
	pub fn is_redirect(&self) -> bool {
		(300..400).contains(&self.status)
	}

	/// Returns the rendered page view.
	pub fn page(&self) -> Option<&View> {
		self.page.as_ref()
	}

	/// Returns the embedded initial state.
	pub fn state(&self) -> Option<&InitialState> {
		self.state.as_ref()
	}

	/// Returns why an error page was rendered, if one was.
	///
	/// Unmatched paths report [`FailureKind::RouteNotFound`] even though
	/// their status is the same 404 a failing preload may produce.
	pub fn failure(&self) -> Option<FailureKind> {
		self.failure
	}

	/// Builds the nodes a browser would parse from the body under `parent`.
	///
	/// Used by native hosts to load a server response into a DOM before
	/// launching the client. Redirect responses add nothing.
	pub fn materialize<D: Dom>(&self, dom: &D, parent: &D::Node) -> Result<(), DomError> {
		let (Some(page), Some(state)) = (&self.page, &self.state) else {
			return Ok(());
		};

		let root = dom.create_element("div")?;
		dom.set_attribute(&root, "id", &self.root_id)?;
		append_markup(dom, &root, page)?;
		dom.append_child(parent, &root)?;

		let script = dom.create_element("script")?;
		dom.set_attribute(&script, "type", "application/json")?;
		dom.set_attribute(&script, "id", STATE_SCRIPT_ID)?;
		let json = state.to_json().map_err(|error| DomError::Operation {
			operation: "materialize",
			message: error.to_string(),
		})?;
		let text = dom.create_text(&json);
		dom.append_child(&script, &text)?;
		dom.append_child(parent, &script)?;
		Ok(())
	}
}

/// Renders the initial document for `request`.
///
/// Redirects become a response with the descriptor's status and a
/// `Location` header. Preload errors render the error page with their
/// status, and paths matching no page route render a 404 error page.
pub async fn render_document(
	table: &RouteTable,
	settings: &NavigatorSettings,
	request: &DocumentRequest,
	fetch: Rc<dyn Fetch>,
) -> SsrResponse {
	let mut base = request.url.clone();
	base.set_path("/");
	base.set_query(None);
	base.set_fragment(None);
	let executor = PreloadExecutor::new(base, fetch);

	let path = request.url.path();
	let route_match = if path.ends_with(settings.data_suffix.as_str()) {
		None
	} else {
		table.first_match(path)
	};

	let (status, page, state, route_chunks, failure) = match route_match {
		None => {
			let error = PageError::not_found(path);
			let page = table.render_error(&error);
			let state = InitialState::from_error(error);
			(404, page, state, Vec::new(), Some(FailureKind::RouteNotFound))
		}
		Some(route_match) => {
			let preload_request = PreloadRequest::new(&request.url, route_match.params.clone())
				.with_method(request.method.as_str())
				.with_extras(request.extras.clone());
			let chunks = route_match.route.chunks().to_vec();
			match executor.run(&route_match, preload_request).await {
				PreloadOutcome::Props(props) => {
					let page = route_match.route.render(&props);
					(200, page, InitialState::from_props(props), chunks, None)
				}
				PreloadOutcome::Redirect(redirect) => {
					debug!(
						path = %path,
						location = %redirect.location,
						status = redirect.status,
						"document redirect"
					);
					return SsrResponse::redirect(redirect);
				}
				PreloadOutcome::Error(error) => {
					let failure = FailureKind::of(&error);
					let page = table.render_error(&error);
					let status = error.status;
					(status, page, InitialState::from_error(error), chunks, Some(failure))
				}
			}
		}
	};

	let mut headers = vec![("Content-Type".to_string(), "text/html".to_string())];
	let preloads: Vec<String> = settings
		.script_chunks
		.iter()
		.chain(route_chunks.iter())
		.map(|chunk| format!(r#"<{chunk}>;rel="preload";as="script""#))
		.collect();
	if !preloads.is_empty() {
		headers.push(("Link".to_string(), preloads.join(", ")));
	}

	let mut body = format!(
		r#"<div id="{}">{}</div>{}"#,
		html_escape(&settings.root_id),
		page.render_to_string(),
		state.to_script_tag()
	);
	for chunk in &settings.script_chunks {
		body.push_str(&format!(
			r#"<script type="module" src="{}"></script>"#,
			html_escape(chunk)
		));
	}

	debug!(path = %path, status, "rendered document");
	SsrResponse {
		status,
		headers,
		body,
		page: Some(page),
		state: Some(state),
		failure,
		root_id: settings.root_id.clone(),
	}
}
