//! The navigation controller.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, info, warn};
use url::Url;

use super::{
	FailureKind, NavigationOutcome, NavigationRequest, NavigationState, NavigationToken,
	TokenSource,
};
use crate::component::View;
use crate::dom::Dom;
use crate::error::{NavigationError, NavigationResult};
use crate::fetch::Fetch;
use crate::hydration::Reconciler;
use crate::link::{self, Anchor, LinkDecision};
use crate::platform::{Platform, ScrollPosition};
use crate::prefetch::{PrefetchCache, SharedPreload};
use crate::preload::{PageError, PreloadExecutor, PreloadOutcome, PreloadRequest, Props};
use crate::router::{RouteMatch, RouteTable};
use crate::scroll::{ScrollManager, anchor_position};
use crate::settings::NavigatorSettings;

enum Resolution {
	Page {
		route_match: RouteMatch,
		props: Props,
		url: Url,
	},
	Error {
		error: PageError,
		kind: FailureKind,
	},
}

/// Drives navigations for one mounted application.
///
/// The navigator owns the current token, the mounted page and the history
/// entry counter. All state lives in cells; no borrow is held across an
/// await, so navigations may be started while others are in flight.
pub struct Navigator<D: Dom, P: Platform> {
	table: Rc<RouteTable>,
	settings: NavigatorSettings,
	executor: PreloadExecutor,
	cache: Rc<PrefetchCache>,
	platform: Rc<P>,
	reconciler: Reconciler<D>,
	scroll: RefCell<ScrollManager>,
	tokens: TokenSource,
	state: Cell<NavigationState>,
	current_url: RefCell<Url>,
	current_entry: Cell<Option<u64>>,
	next_entry: Cell<u64>,
}

impl<D: Dom, P: Platform> fmt::Debug for Navigator<D, P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Navigator")
			.field("current_url", &self.current_url.borrow().as_str())
			.field("state", &self.state.get())
			.field("current_entry", &self.current_entry.get())
			.field("routes", &self.table.route_count())
			.finish_non_exhaustive()
	}
}

impl<D: Dom, P: Platform> Navigator<D, P> {
	/// Creates a navigator for the page currently shown by `platform`.
	///
	/// Preload contexts resolve data URLs against the application root.
	pub fn new(
		table: Rc<RouteTable>,
		settings: NavigatorSettings,
		reconciler: Reconciler<D>,
		platform: Rc<P>,
		fetch: Rc<dyn Fetch>,
	) -> NavigationResult<Self> {
		let location = platform
			.location()
			.map_err(|source| NavigationError::InvalidUrl {
				url: "location".to_string(),
				source,
			})?;
		let base = location
			.join("/")
			.map_err(|source| NavigationError::InvalidUrl {
				url: location.to_string(),
				source,
			})?;

		Ok(Self {
			table,
			executor: PreloadExecutor::new(base, fetch),
			cache: Rc::new(PrefetchCache::new()),
			platform,
			reconciler,
			scroll: RefCell::new(ScrollManager::new(settings.scroll_restoration)),
			settings,
			tokens: TokenSource::new(),
			state: Cell::new(NavigationState::Idle),
			current_url: RefCell::new(location),
			current_entry: Cell::new(None),
			next_entry: Cell::new(1),
		})
	}

	/// Returns the observable navigation state.
	pub fn state(&self) -> NavigationState {
		self.state.get()
	}

	/// Returns the address of the mounted page.
	pub fn current_url(&self) -> Url {
		self.current_url.borrow().clone()
	}

	/// Returns the state id of the current history entry.
	pub fn current_entry(&self) -> Option<u64> {
		self.current_entry.get()
	}

	/// Returns the most recently issued token.
	pub fn current_token(&self) -> Option<NavigationToken> {
		self.tokens.current()
	}

	/// Returns the prefetch cache.
	pub fn cache(&self) -> &Rc<PrefetchCache> {
		&self.cache
	}

	/// Returns the route table.
	pub fn table(&self) -> &Rc<RouteTable> {
		&self.table
	}

	/// Returns the settings.
	pub fn settings(&self) -> &NavigatorSettings {
		&self.settings
	}

	/// Returns the platform.
	pub fn platform(&self) -> &Rc<P> {
		&self.platform
	}

	/// Returns the reconciler of the root container.
	pub fn reconciler(&self) -> &Reconciler<D> {
		&self.reconciler
	}

	/// Returns the preload executor.
	pub fn executor(&self) -> &PreloadExecutor {
		&self.executor
	}

	/// Tags the current history entry with a fresh state id.
	pub fn stamp_current(&self) -> u64 {
		let entry = self.allocate_entry();
		let url = self.current_url();
		self.platform.replace_state(entry, &url);
		self.current_entry.set(Some(entry));
		entry
	}

	/// Navigates to `href`, resolved against the current address.
	pub async fn goto(&self, href: &str) -> NavigationResult<NavigationOutcome> {
		let url = self.resolve(href)?;
		let current = self.current_url();
		if url.fragment().is_some() && link::same_document(&url, &current) {
			return Ok(self.scroll_to_fragment(url));
		}
		let request = NavigationRequest::programmatic(url).with_referrer(current);
		self.navigate(request).await
	}

	/// Classifies an activated anchor against the current address.
	pub fn intercept(&self, anchor: &Anchor) -> LinkDecision {
		link::classify(
			anchor,
			&self.current_url.borrow(),
			&self.table,
			&self.settings,
		)
	}

	/// Handles an activated anchor.
	pub async fn click(&self, anchor: &Anchor) -> NavigationResult<NavigationOutcome> {
		match self.intercept(anchor) {
			LinkDecision::Intercept(url) => {
				let request = NavigationRequest::link_click(url).with_referrer(self.current_url());
				self.navigate(request).await
			}
			LinkDecision::SameDocument(url) => Ok(self.scroll_to_fragment(url)),
			LinkDecision::Native => Ok(NavigationOutcome::Native),
		}
	}

	/// Starts preloading the target of a hovered anchor.
	///
	/// The navigation state is not touched.
	pub fn hover(&self, anchor: &Anchor) -> Option<SharedPreload> {
		if !self.settings.prefetch_on_hover {
			return None;
		}
		match self.intercept(anchor) {
			LinkDecision::Intercept(url) => self.prefetch_url(&url),
			_ => None,
		}
	}

	/// Starts preloading `href` without navigating.
	///
	/// Returns `None` when `href` is not a page of this application.
	pub fn prefetch(&self, href: &str) -> NavigationResult<Option<SharedPreload>> {
		let url = self.resolve(href)?;
		Ok(self.prefetch_url(&url))
	}

	/// Preloads a page URL through the cache.
	pub fn prefetch_url(&self, url: &Url) -> Option<SharedPreload> {
		let route_match = self.page_match(url)?;
		Some(self.preload(url, &route_match))
	}

	/// Reacts to a history traversal.
	///
	/// Entries without a state id were created by the browser (for example
	/// by following a typed fragment); they are stamped and left alone.
	pub async fn handle_popstate(
		&self,
		state_id: Option<u64>,
		url: Url,
	) -> NavigationResult<NavigationOutcome> {
		let Some(state_id) = state_id else {
			self.remember_scroll();
			*self.current_url.borrow_mut() = url;
			self.stamp_current();
			return Ok(NavigationOutcome::Unchanged);
		};

		let current = self.current_url();
		if link::same_document(&url, &current) {
			self.supersede();
			self.remember_scroll();
			self.current_entry.set(Some(state_id));
			let position = self.scroll.borrow().target(
				self.reconciler.dom().as_ref(),
				&url,
				Some(state_id),
			);
			self.platform.scroll_to(position);
			*self.current_url.borrow_mut() = url.clone();
			return Ok(NavigationOutcome::Scrolled { url });
		}

		let request = NavigationRequest::history_pop(url, state_id).with_referrer(current);
		self.navigate(request).await
	}

	/// Scrolls to the fragment of a same-document URL and records a history
	/// entry for it. Pending navigations are superseded.
	pub fn scroll_to_fragment(&self, url: Url) -> NavigationOutcome {
		self.supersede();
		self.remember_scroll();

		let entry = self.allocate_entry();
		self.platform.push_state(entry, &url);
		self.current_entry.set(Some(entry));

		let position = anchor_position(self.reconciler.dom().as_ref(), &url)
			.unwrap_or(ScrollPosition::TOP);
		self.platform.scroll_to(position);
		*self.current_url.borrow_mut() = url.clone();
		NavigationOutcome::Scrolled { url }
	}

	/// Runs a navigation.
	///
	/// Targets that are not pages of this application never enter the state
	/// machine: they are handed to the browser. Otherwise the preload
	/// resolves through the prefetch cache, redirects are followed up to
	/// `max_redirects` hops, and the page or error page is committed if the
	/// navigation's token is still current.
	pub async fn navigate(
		&self,
		request: NavigationRequest,
	) -> NavigationResult<NavigationOutcome> {
		let mut target = request.url().clone();
		let Some(mut route_match) = self.page_match(&target) else {
			return Ok(self.hand_off(target));
		};

		let token = self.tokens.issue();
		debug!(token = %token, path = %target.path(), "navigation started");
		self.state.set(NavigationState::Preloading(token));

		let mut hops = 0;
		let resolution = loop {
			let outcome = self.preload(&target, &route_match).await;
			if !self.tokens.is_current(token) {
				debug!(token = %token, path = %target.path(), "navigation superseded");
				return Ok(NavigationOutcome::Superseded { token });
			}

			let redirect = match outcome {
				PreloadOutcome::Props(props) => {
					break Resolution::Page {
						route_match,
						props,
						url: target,
					};
				}
				PreloadOutcome::Error(error) => {
					let kind = FailureKind::of(&error);
					break Resolution::Error { error, kind };
				}
				PreloadOutcome::Redirect(redirect) => redirect,
			};

			hops += 1;
			if hops > self.settings.max_redirects {
				warn!(
					token = %token,
					path = %request.url().path(),
					hops,
					"redirect limit exceeded"
				);
				break Resolution::Error {
					error: PageError::internal(format!(
						"Too many redirects: {}",
						request.url().path()
					)),
					kind: FailureKind::RedirectLoop,
				};
			}

			let location = match target.join(&redirect.location) {
				Ok(location) => location,
				Err(source) => {
					break Resolution::Error {
						error: PageError::internal(format!(
							"Invalid redirect location '{}': {source}",
							redirect.location
						)),
						kind: FailureKind::ServerError,
					};
				}
			};
			debug!(
				token = %token,
				from = %target.path(),
				to = %location.path(),
				status = redirect.status,
				"following redirect"
			);

			match self.page_match(&location) {
				Some(next) => {
					route_match = next;
					target = location;
				}
				None => {
					self.state.set(NavigationState::Idle);
					return Ok(self.hand_off(location));
				}
			}
		};

		match resolution {
			Resolution::Page {
				route_match,
				props,
				url,
			} => {
				self.state.set(NavigationState::Committing(token));
				let view = route_match.route.render(&props);
				self.commit(token, &request, &url, &view)?;
				info!(token = %token, path = %url.path(), "navigation committed");
				Ok(NavigationOutcome::Committed { token, url })
			}
			Resolution::Error { error, kind } => {
				self.state.set(NavigationState::Failed(token));
				let url = request.url().clone();
				let view = self.table.render_error(&error);
				self.commit(token, &request, &url, &view)?;
				info!(
					token = %token,
					path = %url.path(),
					status = error.status,
					"error page committed"
				);
				Ok(NavigationOutcome::Failed {
					token,
					url,
					error,
					kind,
				})
			}
		}
	}

	fn commit(
		&self,
		token: NavigationToken,
		request: &NavigationRequest,
		url: &Url,
		view: &View,
	) -> NavigationResult<()> {
		// The page being left is still mounted and scrolled by the user
		self.remember_scroll();
		let trigger = request.trigger();
		if let Err(mount_error) = self.reconciler.mount(view) {
			error!(token = %token, path = %url.path(), error = %mount_error, "failed to mount page");
			self.state.set(NavigationState::Idle);
			return Err(mount_error.into());
		}

		let entry = match trigger.restore_id() {
			// The browser already moved; only a redirect changes the address
			Some(entry) => {
				if url != request.url() {
					self.platform.replace_state(entry, url);
				}
				entry
			}
			None => {
				let entry = self.allocate_entry();
				self.platform.push_state(entry, url);
				entry
			}
		};
		self.current_entry.set(Some(entry));
		*self.current_url.borrow_mut() = url.clone();

		// Mount complete: anchors of the new page are in place
		let position = self.scroll.borrow().target(
			self.reconciler.dom().as_ref(),
			url,
			trigger.restore_id(),
		);
		self.platform.scroll_to(position);
		self.state.set(NavigationState::Idle);
		Ok(())
	}

	fn preload(&self, url: &Url, route_match: &RouteMatch) -> SharedPreload {
		self.cache.get_or_create(url, || {
			let request = PreloadRequest::new(url, route_match.params.clone());
			self.executor.run(route_match, request)
		})
	}

	fn page_match(&self, url: &Url) -> Option<RouteMatch> {
		if url.origin() != self.current_url.borrow().origin() {
			return None;
		}
		if url.path().ends_with(self.settings.data_suffix.as_str()) {
			return None;
		}
		self.table.first_match(url.path())
	}

	fn hand_off(&self, url: Url) -> NavigationOutcome {
		debug!(url = %url, "handing navigation to the browser");
		self.platform.assign(&url);
		NavigationOutcome::External { url }
	}

	fn supersede(&self) {
		let token = self.tokens.issue();
		debug!(token = %token, "pending navigations superseded");
		self.state.set(NavigationState::Idle);
	}

	fn remember_scroll(&self) {
		if let Some(entry) = self.current_entry.get() {
			self.scroll
				.borrow_mut()
				.record(entry, self.platform.scroll_position());
		}
	}

	fn allocate_entry(&self) -> u64 {
		let entry = self.next_entry.get();
		self.next_entry.set(entry + 1);
		entry
	}

	fn resolve(&self, href: &str) -> NavigationResult<Url> {
		self.current_url
			.borrow()
			.join(href)
			.map_err(|source| NavigationError::InvalidUrl {
				url: href.to_string(),
				source,
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::ElementView;
	use crate::dom::MemoryDom;
	use crate::fetch::MemoryFetch;
	use crate::platform::{HistoryOp, MemoryPlatform};
	use crate::preload::{PreloadContext, PreloadError, PreloadResult};
	use crate::router::Route;
	use futures::channel::oneshot;
	use rstest::rstest;
	use serde_json::json;

	fn heading(text: &'static str) -> impl Fn(&Props) -> View {
		move |_props: &Props| ElementView::new("h1").child(text).into()
	}

	struct Harness {
		dom: Rc<MemoryDom>,
		platform: Rc<MemoryPlatform>,
		fetch: Rc<MemoryFetch>,
		navigator: Navigator<MemoryDom, MemoryPlatform>,
	}

	fn harness(table: RouteTable, settings: NavigatorSettings) -> Harness {
		let dom = Rc::new(MemoryDom::with_root("app"));
		let platform = Rc::new(MemoryPlatform::new(
			Url::parse("http://localhost:3000/").unwrap(),
		));
		let fetch = Rc::new(
			MemoryFetch::new().with_json("/blog/hello.json", json!({"title": "Hello"})),
		);
		let reconciler = Reconciler::locate(dom.clone(), "app").unwrap();
		let navigator = Navigator::new(
			Rc::new(table),
			settings,
			reconciler,
			platform.clone(),
			fetch.clone(),
		)
		.unwrap();
		navigator.stamp_current();
		Harness {
			dom,
			platform,
			fetch,
			navigator,
		}
	}

	fn blog_table() -> RouteTable {
		RouteTable::new()
			.route("/", heading("Great success!"))
			.route("/about", heading("About"))
			.add(Route::new("/blog/{slug}", |props: &Props| -> View {
				let title = props["title"].as_str().unwrap_or_default().to_string();
				ElementView::new("h1").child(title).into()
			})
			.with_preload(
				|request: PreloadRequest, context: PreloadContext| async move {
					let slug = request.param("slug").unwrap_or_default().to_string();
					let post = context.fetch(&format!("/blog/{slug}.json")).await?;
					PreloadResult::from_serialize(&post)
				},
			))
	}

	#[rstest]
	#[tokio::test]
	async fn test_goto_commits_and_pushes_once() {
		let h = harness(blog_table(), NavigatorSettings::default());

		let outcome = h.navigator.goto("/blog/hello").await.unwrap();

		assert!(matches!(outcome, NavigationOutcome::Committed { .. }));
		assert_eq!(h.dom.text_of("h1").as_deref(), Some("Hello"));
		assert_eq!(h.platform.push_count(), 1);
		assert_eq!(h.navigator.current_url().path(), "/blog/hello");
		assert_eq!(h.navigator.state(), NavigationState::Idle);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unmatched_target_is_full_load() {
		let h = harness(blog_table(), NavigatorSettings::default());

		let outcome = h.navigator.goto("/admin").await.unwrap();

		assert!(matches!(outcome, NavigationOutcome::External { .. }));
		assert_eq!(h.platform.full_loads().len(), 1);
		assert_eq!(h.platform.push_count(), 0);
		assert_eq!(h.navigator.current_token(), None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_superseded_navigation_is_dropped() {
		let (sender, receiver) = oneshot::channel::<()>();
		let gate = Rc::new(RefCell::new(Some(receiver)));
		let table = blog_table().add(Route::new("/slow", heading("Slow")).with_preload(
			move |_request: PreloadRequest, _context: PreloadContext| {
				let gate = gate.borrow_mut().take();
				async move {
					if let Some(gate) = gate {
						let _ = gate.await;
					}
					Ok::<_, PreloadError>(PreloadResult::Props(Props::new()))
				}
			},
		));
		let h = harness(table, NavigatorSettings::default());

		let release = async move {
			let _ = sender.send(());
		};
		let (slow, fast, ()) = futures::join!(
			h.navigator.goto("/slow"),
			h.navigator.goto("/about"),
			release
		);

		assert!(matches!(slow.unwrap(), NavigationOutcome::Superseded { .. }));
		assert!(matches!(fast.unwrap(), NavigationOutcome::Committed { .. }));
		assert_eq!(h.dom.text_of("h1").as_deref(), Some("About"));
		assert_eq!(h.platform.push_count(), 1);
		assert_eq!(h.navigator.current_url().path(), "/about");
	}

	#[rstest]
	#[tokio::test]
	async fn test_redirect_loop_is_server_error() {
		let table = RouteTable::new().add(Route::new("/loop", heading("Loop")).with_preload(
			|_request: PreloadRequest, context: PreloadContext| async move {
				Err::<PreloadResult, _>(context.redirect(302, "/loop"))
			},
		));
		let settings = NavigatorSettings {
			max_redirects: 3,
			..NavigatorSettings::default()
		};
		let h = harness(table, settings);

		let outcome = h.navigator.goto("/loop").await.unwrap();

		let NavigationOutcome::Failed { error, kind, url, .. } = &outcome else {
			panic!("expected failure, got {outcome:?}");
		};
		assert_eq!(*kind, FailureKind::RedirectLoop);
		assert_eq!(error.status, 500);
		assert_eq!(url.path(), "/loop");
		assert_eq!(h.dom.text_of("h1").as_deref(), Some("Internal server error"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_hover_then_click_fetches_once() {
		let h = harness(blog_table(), NavigatorSettings::default());
		let anchor = Anchor::new("/blog/hello");

		let prefetched = h.navigator.hover(&anchor).unwrap();
		assert_eq!(h.navigator.state(), NavigationState::Idle);
		prefetched.await;
		h.navigator.click(&anchor).await.unwrap();

		assert_eq!(h.fetch.request_count("/blog/hello.json"), 1);
		assert_eq!(h.dom.text_of("h1").as_deref(), Some("Hello"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_hover_disabled() {
		let settings = NavigatorSettings {
			prefetch_on_hover: false,
			..NavigatorSettings::default()
		};
		let h = harness(blog_table(), settings);

		assert!(h.navigator.hover(&Anchor::new("/blog/hello")).is_none());
		assert!(h.navigator.cache().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_popstate_without_state_is_stamped() {
		let h = harness(blog_table(), NavigatorSettings::default());
		let url = Url::parse("http://localhost:3000/#top").unwrap();

		let outcome = h.navigator.handle_popstate(None, url.clone()).await.unwrap();

		assert_eq!(outcome, NavigationOutcome::Unchanged);
		assert_eq!(
			h.platform.operations().last(),
			Some(&HistoryOp::Replace { state_id: 2, url })
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_native_link_is_left_alone() {
		let h = harness(blog_table(), NavigatorSettings::default());

		let outcome = h
			.navigator
			.click(&Anchor::new("/blog/hello.json"))
			.await
			.unwrap();

		assert_eq!(outcome, NavigationOutcome::Native);
		assert!(h.platform.full_loads().is_empty());
	}
}
