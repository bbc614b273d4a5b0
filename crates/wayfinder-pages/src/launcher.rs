//! Client start-up.
//!
//! [`ClientLauncher::launch`] hydrates the server-rendered page and returns
//! a [`Client`]. Operations that need a running client (such as warming the
//! prefetch cache for every route) only exist on [`Client`], so they cannot
//! run before start-up.

use std::fmt;
use std::rc::Rc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::dom::Dom;
use crate::error::{NavigationError, NavigationResult};
use crate::fetch::Fetch;
use crate::hydration::{HydrationError, HydrationRecord, Reconciler};
use crate::navigation::{FailureKind, Navigator};
use crate::platform::Platform;
use crate::preload::{PageError, PreloadOutcome};
use crate::router::{Params, RouteTable};
use crate::scroll::anchor_position;
use crate::settings::NavigatorSettings;
use crate::ssr::InitialState;

/// Configures and starts the client.
pub struct ClientLauncher<D: Dom, P: Platform> {
	table: Rc<RouteTable>,
	dom: Rc<D>,
	platform: Rc<P>,
	fetch: Rc<dyn Fetch>,
	settings: NavigatorSettings,
	initial_state: Option<InitialState>,
}

impl<D: Dom, P: Platform> fmt::Debug for ClientLauncher<D, P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientLauncher")
			.field("routes", &self.table.route_count())
			.field("settings", &self.settings)
			.field("initial_state", &self.initial_state.is_some())
			.finish()
	}
}

impl<D: Dom, P: Platform> ClientLauncher<D, P> {
	/// Creates a launcher with default settings.
	pub fn new(table: RouteTable, dom: Rc<D>, platform: Rc<P>, fetch: Rc<dyn Fetch>) -> Self {
		Self {
			table: Rc::new(table),
			dom,
			platform,
			fetch,
			settings: NavigatorSettings::default(),
			initial_state: None,
		}
	}

	/// Sets the settings.
	pub fn settings(mut self, settings: NavigatorSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Supplies the server's preload result instead of reading it from the
	/// document.
	pub fn initial_state(mut self, state: InitialState) -> Self {
		self.initial_state = Some(state);
		self
	}

	/// Starts the client.
	///
	/// The page at the current address is resolved from the embedded
	/// initial state when present (seeding the prefetch cache with it) or by
	/// running its preload. The server markup is then hydrated; if it does
	/// not match, the page is mounted fresh instead. The current history
	/// entry is stamped with a state id and a fragment in the address
	/// scrolls to its element.
	pub async fn launch(self) -> NavigationResult<Client<D, P>> {
		let root_id = self.settings.root_id.clone();
		let reconciler = Reconciler::locate(Rc::clone(&self.dom), &root_id).map_err(|error| {
			match error {
				HydrationError::RootNotFound(id) => NavigationError::RootNotFound(id),
				other => other.into(),
			}
		})?;

		let initial_state = self
			.initial_state
			.or_else(|| InitialState::read(self.dom.as_ref()));
		let navigator = Navigator::new(
			self.table,
			self.settings,
			reconciler,
			Rc::clone(&self.platform),
			self.fetch,
		)?;
		let url = navigator.current_url();
		let route_match = navigator.table().first_match(url.path());

		let outcome = match (initial_state.and_then(|state| state.outcome()), &route_match) {
			(Some(outcome), _) => {
				debug!(path = %url.path(), "using server preload result");
				if route_match.is_some() {
					navigator.cache().seed(&url, outcome.clone());
				}
				outcome
			}
			(None, Some(_)) => match navigator.prefetch_url(&url) {
				Some(preload) => preload.await,
				None => PreloadOutcome::Error(PageError::not_found(url.path())),
			},
			(None, None) => PreloadOutcome::Error(PageError::not_found(url.path())),
		};

		let view = match (&outcome, &route_match) {
			(PreloadOutcome::Props(props), Some(route_match)) => route_match.route.render(props),
			(PreloadOutcome::Redirect(redirect), _) => {
				info!(location = %redirect.location, "initial page redirected");
				navigator.stamp_current();
				let navigator = Rc::new(navigator);
				navigator.goto(&redirect.location).await?;
				return Ok(Client {
					navigator,
					hydration: None,
					failure: None,
				});
			}
			(PreloadOutcome::Error(error), _) => navigator.table().render_error(error),
			(PreloadOutcome::Props(_), None) => {
				navigator.table().render_error(&PageError::not_found(url.path()))
			}
		};

		let failure = match (&outcome, &route_match) {
			(_, None) => Some(FailureKind::RouteNotFound),
			(PreloadOutcome::Error(error), Some(_)) => Some(FailureKind::of(error)),
			_ => None,
		};

		navigator.stamp_current();
		let hydration = match navigator.reconciler().hydrate(&view) {
			Ok(record) => {
				debug!(nodes = record.len(), "initial page hydrated");
				Some(record)
			}
			Err(error) => {
				warn!(error = %error, "hydration failed, mounting fresh");
				navigator.reconciler().mount(&view)?;
				None
			}
		};

		if let Some(position) = anchor_position(self.dom.as_ref(), &url) {
			self.platform.scroll_to(position);
		}

		info!(path = %url.path(), failure = ?failure, "client launched");
		Ok(Client {
			navigator: Rc::new(navigator),
			hydration,
			failure,
		})
	}
}

/// A started client.
pub struct Client<D: Dom, P: Platform> {
	navigator: Rc<Navigator<D, P>>,
	hydration: Option<HydrationRecord<D::Node>>,
	failure: Option<FailureKind>,
}

impl<D: Dom, P: Platform> fmt::Debug for Client<D, P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Client")
			.field("navigator", &self.navigator)
			.field("hydrated", &self.hydration.is_some())
			.field("failure", &self.failure)
			.finish()
	}
}

impl<D: Dom, P: Platform> Client<D, P> {
	/// Returns the navigator.
	pub fn navigator(&self) -> &Rc<Navigator<D, P>> {
		&self.navigator
	}

	/// Returns the nodes adopted by hydration, if the initial page hydrated.
	pub fn hydration(&self) -> Option<&HydrationRecord<D::Node>> {
		self.hydration.as_ref()
	}

	/// Returns why the initial page is an error page, if it is.
	pub fn initial_failure(&self) -> Option<FailureKind> {
		self.failure
	}

	/// Warms the prefetch cache for every route with a fully literal
	/// pattern. Dynamic routes have no concrete URL to warm.
	///
	/// Returns the number of routes prefetched.
	pub async fn prefetch_routes(&self) -> usize {
		let base = self.navigator.current_url();
		let preloads: Vec<_> = self
			.navigator
			.table()
			.routes()
			.filter(|route| route.pattern().is_exact())
			.filter_map(|route| route.pattern().reverse(&Params::new()).ok())
			.filter_map(|path| base.join(&path).ok())
			.filter_map(|url| self.navigator.prefetch_url(&url))
			.collect();

		let count = preloads.len();
		join_all(preloads).await;
		debug!(count, "prefetched routes");
		count
	}
}
