//! # Wayfinder
//!
//! Client-side navigation for server-rendered, route-based web applications.
//!
//! The server renders the first page; afterwards Wayfinder intercepts in-app
//! links, runs each route's preload before rendering, hydrates or replaces
//! the page, and restores scroll position. Links that are not pages of the
//! application fall back to a normal server load.
//!
//! ## Feature Flags
//!
//! - `pages` (default) - the navigation engine from `wayfinder-pages`
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use wayfinder::prelude::*;
//!
//! let table = RouteTable::new()
//!     .route("/", |_props: &Props| -> View {
//!         ElementView::new("h1").child("Great success!").into()
//!     })
//!     .route("/about", |_props: &Props| -> View {
//!         ElementView::new("h1").child("About this site").into()
//!     });
//!
//! let client = wayfinder::pages::platform::browser::start(table, NavigatorSettings::default()).await?;
//! client.prefetch_routes().await;
//! ```

#[cfg(feature = "pages")]
pub mod pages;

/// Commonly used types.
#[cfg(feature = "pages")]
pub mod prelude {
	pub use wayfinder_pages::prelude::*;
}
