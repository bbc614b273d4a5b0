//! In-app link interception.
//!
//! Activated anchors are classified here. Only same-origin links to page
//! routes are handled client-side; everything else (external hosts, new
//! windows, downloads, data endpoints, server routes) keeps the browser's
//! native behaviour.

use url::Url;

use crate::router::RouteTable;
use crate::settings::NavigatorSettings;

/// The attributes of an activated `<a>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
	/// `href` attribute as written.
	pub href: Option<String>,
	/// `target` attribute.
	pub target: Option<String>,
	/// Whether a `download` attribute is present.
	pub download: bool,
	/// `rel` attribute.
	pub rel: Option<String>,
}

impl Anchor {
	/// Creates an anchor with the given `href`.
	pub fn new(href: impl Into<String>) -> Self {
		Self {
			href: Some(href.into()),
			..Self::default()
		}
	}

	/// Sets the `target` attribute.
	pub fn with_target(mut self, target: impl Into<String>) -> Self {
		self.target = Some(target.into());
		self
	}

	/// Marks the anchor as a download link.
	pub fn with_download(mut self) -> Self {
		self.download = true;
		self
	}

	/// Sets the `rel` attribute.
	pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
		self.rel = Some(rel.into());
		self
	}

	fn opens_elsewhere(&self) -> bool {
		self.target
			.as_deref()
			.is_some_and(|target| !target.is_empty() && target != "_self")
	}

	fn is_external(&self) -> bool {
		self.rel
			.as_deref()
			.is_some_and(|rel| rel.split_whitespace().any(|token| token == "external"))
	}
}

/// What to do with an activated link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
	/// Navigate client-side to this page URL.
	Intercept(Url),
	/// Same document, different fragment: scroll without preloading.
	SameDocument(Url),
	/// Let the browser handle it.
	Native,
}

/// Classifies an activated anchor relative to the current URL.
pub fn classify(
	anchor: &Anchor,
	current: &Url,
	table: &RouteTable,
	settings: &NavigatorSettings,
) -> LinkDecision {
	let Some(href) = anchor.href.as_deref() else {
		return LinkDecision::Native;
	};
	if anchor.download || anchor.opens_elsewhere() || anchor.is_external() {
		return LinkDecision::Native;
	}

	let Ok(url) = current.join(href) else {
		return LinkDecision::Native;
	};
	if url.origin() != current.origin() {
		return LinkDecision::Native;
	}
	if url.path().ends_with(settings.data_suffix.as_str()) {
		return LinkDecision::Native;
	}
	if url.fragment().is_some() && same_document(&url, current) {
		return LinkDecision::SameDocument(url);
	}
	if table.first_match(url.path()).is_none() {
		return LinkDecision::Native;
	}
	LinkDecision::Intercept(url)
}

/// Whether two URLs differ at most in their fragment.
pub(crate) fn same_document(a: &Url, b: &Url) -> bool {
	a.path() == b.path() && a.query().unwrap_or("") == b.query().unwrap_or("")
}
