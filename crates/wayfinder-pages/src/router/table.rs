//! Route definitions and the route table.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;

use super::Params;
use super::error::{PatternError, RouterError};
use super::pattern::PathPattern;
use crate::component::{DefaultErrorPage, ErrorComponent, PageComponent, View};
use crate::preload::{
	PageError, PreloadContext, PreloadError, PreloadFn, PreloadFuture, PreloadRequest,
	PreloadResult, Props,
};
use crate::settings::NavigatorSettings;

/// A matched route with extracted parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
	/// The matched route.
	pub route: Rc<Route>,
	/// Decoded path parameters.
	pub params: Params,
}

/// A single route definition.
///
/// Routes are immutable once registered and shared by reference.
pub struct Route {
	/// The path pattern.
	pattern: PathPattern,
	/// Optional route name for reverse lookups.
	name: Option<String>,
	/// The page rendered with the preloaded props.
	component: Rc<dyn PageComponent>,
	/// Optional data-loading step run before render.
	preload: Option<PreloadFn>,
	/// Script chunks announced in the `Link` header for this route.
	chunks: Vec<String>,
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("pattern", &self.pattern)
			.field("name", &self.name)
			.field("has_preload", &self.preload.is_some())
			.field("chunks", &self.chunks)
			.finish()
	}
}

impl Route {
	/// Creates a new route.
	///
	/// # Panics
	///
	/// Panics if the pattern is invalid (exceeds length/segment limits or invalid regex).
	/// Use [`Route::try_new`] for fallible construction.
	pub fn new<C>(pattern: &str, component: C) -> Self
	where
		C: PageComponent + 'static,
	{
		Self::try_new(pattern, component)
			.unwrap_or_else(|e| panic!("Invalid route pattern '{}': {}", pattern, e))
	}

	/// Creates a new route, returning an error for invalid patterns.
	pub fn try_new<C>(pattern: &str, component: C) -> Result<Self, PatternError>
	where
		C: PageComponent + 'static,
	{
		Ok(Self {
			pattern: PathPattern::new(pattern)?,
			name: None,
			component: Rc::new(component),
			preload: None,
			chunks: Vec::new(),
		})
	}

	/// Creates a named route.
	///
	/// # Panics
	///
	/// Panics if the pattern is invalid.
	pub fn named<C>(name: impl Into<String>, pattern: &str, component: C) -> Self
	where
		C: PageComponent + 'static,
	{
		let mut route = Self::new(pattern, component);
		route.name = Some(name.into());
		route
	}

	/// Attaches a preload function.
	///
	/// The function receives the normalized request and a context offering
	/// data fetching, and resolves to props or a redirect.
	pub fn with_preload<F, Fut>(mut self, preload: F) -> Self
	where
		F: Fn(PreloadRequest, PreloadContext) -> Fut + 'static,
		Fut: Future<Output = Result<PreloadResult, PreloadError>> + 'static,
	{
		let preload: PreloadFn = Rc::new(
			move |request: PreloadRequest, context: PreloadContext| -> PreloadFuture {
				preload(request, context).boxed_local()
			},
		);
		self.preload = Some(preload);
		self
	}

	/// Sets the script chunks this route's page depends on.
	pub fn with_chunks<I, S>(mut self, chunks: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.chunks = chunks.into_iter().map(Into::into).collect();
		self
	}

	/// Returns the route name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Returns the pattern.
	pub fn pattern(&self) -> &PathPattern {
		&self.pattern
	}

	/// Returns the preload function, if any.
	pub fn preload(&self) -> Option<&PreloadFn> {
		self.preload.as_ref()
	}

	/// Returns the script chunks for this route.
	pub fn chunks(&self) -> &[String] {
		&self.chunks
	}

	/// Renders the page component with preloaded props.
	pub fn render(&self, props: &Props) -> View {
		self.component.render(props)
	}
}

/// The table of page routes, matched by specificity.
pub struct RouteTable {
	/// Registered routes in registration order.
	routes: Vec<Rc<Route>>,
	/// Named routes for reverse lookups.
	named_routes: HashMap<String, usize>,
	/// Component used for client and server error pages.
	error_page: Rc<dyn ErrorComponent>,
}

impl fmt::Debug for RouteTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteTable")
			.field("routes_count", &self.routes.len())
			.field(
				"named_routes",
				&self.named_routes.keys().collect::<Vec<_>>(),
			)
			.finish()
	}
}

impl Default for RouteTable {
	fn default() -> Self {
		Self::new()
	}
}

impl RouteTable {
	/// Creates an empty route table with the default error page.
	pub fn new() -> Self {
		Self {
			routes: Vec::new(),
			named_routes: HashMap::new(),
			error_page: Rc::new(DefaultErrorPage),
		}
	}

	/// Adds a fully configured route.
	pub fn add(mut self, route: Route) -> Self {
		if let Some(name) = route.name() {
			self.named_routes.insert(name.to_string(), self.routes.len());
		}
		self.routes.push(Rc::new(route));
		self
	}

	/// Adds a route without a preload.
	///
	/// # Panics
	///
	/// Panics if the pattern is invalid.
	pub fn route<C>(self, pattern: &str, component: C) -> Self
	where
		C: PageComponent + 'static,
	{
		self.add(Route::new(pattern, component))
	}

	/// Adds a named route without a preload.
	///
	/// # Panics
	///
	/// Panics if the pattern is invalid.
	pub fn named_route<C>(self, name: &str, pattern: &str, component: C) -> Self
	where
		C: PageComponent + 'static,
	{
		self.add(Route::named(name, pattern, component))
	}

	/// Sets the error page component.
	pub fn error_page<E>(mut self, component: E) -> Self
	where
		E: ErrorComponent + 'static,
	{
		self.error_page = Rc::new(component);
		self
	}

	/// Returns the error page component.
	pub fn error_component(&self) -> &Rc<dyn ErrorComponent> {
		&self.error_page
	}

	/// Renders the error page for `error`.
	pub fn render_error(&self, error: &PageError) -> View {
		self.error_page.render(error)
	}

	/// Returns every route matching `path`, most specific first.
	///
	/// Ties in specificity keep registration order. Unmatched paths yield an
	/// empty list.
	pub fn match_path(&self, path: &str) -> Vec<RouteMatch> {
		let mut matches: Vec<RouteMatch> = self
			.routes
			.iter()
			.filter_map(|route| {
				route.pattern.matches(path).map(|params| RouteMatch {
					route: Rc::clone(route),
					params,
				})
			})
			.collect();
		// Stable sort keeps registration order among equals
		matches.sort_by(|a, b| a.route.pattern.specificity_cmp(&b.route.pattern));
		matches
	}

	/// Returns the most specific match for `path`.
	pub fn first_match(&self, path: &str) -> Option<RouteMatch> {
		self.match_path(path).into_iter().next()
	}

	/// Returns whether a URL path is a page route (and not a data endpoint).
	pub fn is_page_path(&self, path: &str, settings: &NavigatorSettings) -> bool {
		!path.ends_with(settings.data_suffix.as_str()) && self.first_match(path).is_some()
	}

	/// Generates a URL by route name with parameters.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
		let index = self
			.named_routes
			.get(name)
			.ok_or_else(|| RouterError::InvalidRouteName(name.to_string()))?;

		let params: Params = params
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		self.routes[*index].pattern.reverse(&params)
	}

	/// Returns the registered routes in registration order.
	pub fn routes(&self) -> impl Iterator<Item = &Rc<Route>> {
		self.routes.iter()
	}

	/// Returns the number of registered routes.
	pub fn route_count(&self) -> usize {
		self.routes.len()
	}

	/// Checks if a route name exists.
	pub fn has_route(&self, name: &str) -> bool {
		self.named_routes.contains_key(name)
	}
}
